//! Expense domain entity
//!
//! An expense is paid by one member and split across members of a group.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use super::group::GroupId;
use super::user::{UserId, UserKey};

/// Allowed gap between an expense amount and the sum of its split shares
pub const SPLIT_TOLERANCE: f64 = 0.01;

/// Category assigned when none is given
pub const DEFAULT_CATEGORY: &str = "General";

/// Unique identifier for an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpenseId(pub Uuid);

impl ExpenseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExpenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ExpenseId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a split map was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitMapError {
    #[error("share for {0} is not a finite number")]
    NonFiniteShare(String),

    #[error("share for {user} is negative: {share}")]
    NegativeShare { user: String, share: f64 },

    #[error("user {0} appears more than once in the split")]
    DuplicateUser(String),
}

/// One participant's share of an expense
#[derive(Debug, Clone, PartialEq)]
pub struct SplitShare {
    pub user: UserKey,
    pub share: f64,
}

/// Per-expense allocation of the amount across users.
///
/// Keys are canonical [`UserKey`]s and unique after normalization, shares are
/// finite and non-negative, and submission order is preserved. On the wire it
/// is a JSON object `{ "<user id>": <share>, ... }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitMap {
    shares: Vec<SplitShare>,
}

impl SplitMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_from_entries<I, K>(entries: I) -> Result<Self, SplitMapError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut map = Self::new();
        for (raw, share) in entries {
            map.insert(UserKey::normalize(raw.as_ref()), share)?;
        }
        Ok(map)
    }

    pub fn insert(&mut self, user: UserKey, share: f64) -> Result<(), SplitMapError> {
        if !share.is_finite() {
            return Err(SplitMapError::NonFiniteShare(user.to_string()));
        }
        if share < 0.0 {
            return Err(SplitMapError::NegativeShare {
                user: user.to_string(),
                share,
            });
        }
        if self.contains(&user) {
            return Err(SplitMapError::DuplicateUser(user.to_string()));
        }
        self.shares.push(SplitShare { user, share });
        Ok(())
    }

    pub fn get(&self, user: &UserKey) -> Option<f64> {
        self.shares
            .iter()
            .find(|s| &s.user == user)
            .map(|s| s.share)
    }

    pub fn contains(&self, user: &UserKey) -> bool {
        self.shares.iter().any(|s| &s.user == user)
    }

    /// Shares in submission order
    pub fn iter(&self) -> impl Iterator<Item = &SplitShare> {
        self.shares.iter()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.shares.iter().map(|s| s.share).sum()
    }

    /// Whether the shares add up to `amount` within [`SPLIT_TOLERANCE`]
    pub fn matches_amount(&self, amount: f64) -> bool {
        (self.total() - amount).abs() <= SPLIT_TOLERANCE
    }
}

impl Serialize for SplitMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.shares.len()))?;
        for share in &self.shares {
            map.serialize_entry(share.user.as_str(), &share.share)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SplitMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SplitMapVisitor;

        impl<'de> Visitor<'de> for SplitMapVisitor {
            type Value = SplitMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of user id to share")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SplitMap, A::Error> {
                let mut map = SplitMap::new();
                while let Some((user, share)) = access.next_entry::<String, f64>()? {
                    map.insert(UserKey::normalize(&user), share)
                        .map_err(de::Error::custom)?;
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(SplitMapVisitor)
    }
}

/// A shared expense
#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub group_id: GroupId,
    pub payer_id: UserId,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
    pub split_details: SplitMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// The user's owed share, 0.0 when they are not part of the split
    pub fn share_of(&self, user: &UserKey) -> f64 {
        self.split_details.get(user).unwrap_or(0.0)
    }
}

/// Data needed to record a new expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub group_id: GroupId,
    pub payer_id: UserId,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
    pub split_details: SplitMap,
}

/// Expense changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ExpenseChanges {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub payer_id: Option<UserId>,
    pub split_details: Option<SplitMap>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.payer_id.is_none()
            && self.split_details.is_none()
    }

    /// The expense as it would look after applying these changes
    pub fn apply_to(&self, expense: &Expense) -> Expense {
        let mut merged = expense.clone();
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(amount) = self.amount {
            merged.amount = amount;
        }
        if let Some(category) = &self.category {
            merged.category = category.clone();
        }
        if let Some(tags) = &self.tags {
            merged.tags = tags.clone();
        }
        if let Some(payer_id) = self.payer_id {
            merged.payer_id = payer_id;
        }
        if let Some(split_details) = &self.split_details {
            merged.split_details = split_details.clone();
        }
        merged
    }
}
