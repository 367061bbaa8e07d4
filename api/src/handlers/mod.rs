//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

use serde::Serialize;

pub mod auth;
pub mod expenses;
pub mod groups;
pub mod upload;
pub mod users;

pub use auth::{login, register};
pub use expenses::{
    add_expense, delete_expense, get_expense, group_balances, list_group_expenses,
    update_expense,
};
pub use groups::{
    create_group, delete_group, export_group, get_group, join_group, my_groups, update_group,
};
pub use upload::upload_image;
pub use users::{disable_me, me, my_stats, update_me};

/// Plain confirmation body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
