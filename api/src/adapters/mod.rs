//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod local;
pub mod postgres;

pub use local::LocalImageStore;
pub use postgres::{PostgresExpenseRepository, PostgresGroupRepository, PostgresUserRepository};
