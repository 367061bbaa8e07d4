//! Test utilities
//!
//! Manual in-memory implementations of the port traits and fixtures for
//! service-level unit tests.
//!
//! The mocks keep insertion order so that tests observe the same ordering
//! guarantees as the PostgreSQL adapters (expenses oldest first, members in
//! join order).

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
