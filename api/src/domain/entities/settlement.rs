//! Settlement records
//!
//! Derived, never persisted: net balances per user and the transfers that
//! settle them. Both exist only for the duration of one computation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::user::UserKey;

/// Net position of one user within a group.
///
/// Positive means the user is owed money (creditor), negative means they owe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub user: UserKey,
    pub net: f64,
}

/// Net balances keyed by user, remembering the order users were first seen
#[derive(Debug, Clone, Default)]
pub struct BalanceSheet {
    entries: Vec<Balance>,
    index: HashMap<UserKey, usize>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the user's running balance, starting from 0.0
    pub fn adjust(&mut self, user: &UserKey, delta: f64) {
        match self.index.get(user) {
            Some(&pos) => self.entries[pos].net += delta,
            None => {
                self.index.insert(user.clone(), self.entries.len());
                self.entries.push(Balance {
                    user: user.clone(),
                    net: delta,
                });
            }
        }
    }

    pub fn credit(&mut self, user: &UserKey, amount: f64) {
        self.adjust(user, amount);
    }

    pub fn debit(&mut self, user: &UserKey, amount: f64) {
        self.adjust(user, -amount);
    }

    /// The user's balance, 0.0 when they never appeared
    pub fn get(&self, user: &UserKey) -> f64 {
        self.index
            .get(user)
            .map(|&pos| self.entries[pos].net)
            .unwrap_or(0.0)
    }

    /// Balances in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Balance> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A suggested payment from a debtor to a creditor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTransfer {
    pub from: UserKey,
    pub to: UserKey,
    pub amount: f64,
}
