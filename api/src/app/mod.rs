//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and the settlement engine.

pub mod auth_service;
pub mod expense_service;
pub mod group_service;
pub mod settlement_engine;
pub mod upload_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use expense_service::ExpenseService;
pub use group_service::GroupService;
pub use upload_service::UploadService;
pub use user_service::{ProfileUpdate, UserService, UserStats};
