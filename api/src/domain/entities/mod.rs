//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod expense;
pub mod group;
pub mod settlement;
pub mod user;

pub use expense::{
    Expense, ExpenseChanges, ExpenseId, NewExpense, SplitMap, SplitMapError, SplitShare,
    DEFAULT_CATEGORY, SPLIT_TOLERANCE,
};
pub use group::{Group, GroupChanges, GroupId, GroupWithMembers, NewGroup};
pub use settlement::{Balance, BalanceSheet, SettlementTransfer};
pub use user::{NewUser, User, UserChanges, UserId, UserKey, UserSummary};
