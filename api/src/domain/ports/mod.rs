//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod repositories;
pub mod storage;

pub use repositories::{ExpenseRepository, GroupRepository, UserRepository};
pub use storage::{ImageStore, UPLOADS_PREFIX};
