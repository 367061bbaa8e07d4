//! SeaORM entity definitions
//!
//! Table models mirrored from `migrations/001_initial.sql`.

pub mod expenses;
pub mod group_members;
pub mod groups;
pub mod users;
