//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod expense_repo;
pub mod group_repo;
pub mod user_repo;


pub use expense_repo::PostgresExpenseRepository;
pub use group_repo::PostgresGroupRepository;
pub use user_repo::PostgresUserRepository;
