//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::domain::entities::{
    Expense, ExpenseChanges, ExpenseId, Group, GroupChanges, GroupId, NewExpense, NewGroup,
    NewUser, User, UserChanges, UserId,
};
use crate::error::DomainError;

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Find several users, in the order of `ids`, skipping unknown ones
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Apply profile changes and return the updated user
    async fn update(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError>;

    /// Mark the account as inactive
    async fn deactivate(&self, id: &UserId) -> Result<(), DomainError>;
}

/// Repository for Group entities and their membership
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Find a group by ID, members included
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError>;

    /// Find a group by invite code
    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Group>, DomainError>;

    /// Groups the user belongs to
    async fn find_by_member(&self, user_id: &UserId, limit: u64)
        -> Result<Vec<Group>, DomainError>;

    /// Create a group with its creator as the first member
    async fn create(&self, group: &NewGroup) -> Result<Group, DomainError>;

    /// Add a member (no-op when already a member)
    async fn add_member(&self, id: &GroupId, user_id: &UserId) -> Result<(), DomainError>;

    /// Apply changes and return the updated group
    async fn update(&self, id: &GroupId, changes: &GroupChanges) -> Result<Group, DomainError>;

    /// Delete a group with its memberships and expenses in one transaction,
    /// returning how many expenses were removed
    async fn delete(&self, id: &GroupId) -> Result<u64, DomainError>;
}

/// Repository for Expense entities
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Find an expense by ID
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, DomainError>;

    /// Expenses of a group, oldest first (created_at, then id)
    async fn find_by_group(&self, group_id: &GroupId, limit: u64)
        -> Result<Vec<Expense>, DomainError>;

    /// Expenses the user paid for or takes part in, most recent `date` first
    async fn find_involving_user(
        &self,
        user_id: &UserId,
        limit: u64,
    ) -> Result<Vec<Expense>, DomainError>;

    /// Record a new expense
    async fn create(&self, expense: &NewExpense) -> Result<Expense, DomainError>;

    /// Apply changes and return the updated expense
    async fn update(&self, id: &ExpenseId, changes: &ExpenseChanges)
        -> Result<Expense, DomainError>;

    /// Delete one expense
    async fn delete(&self, id: &ExpenseId) -> Result<(), DomainError>;
}
