//! Group domain entity
//!
//! A group is a set of users who share expenses and settle up with each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{UserId, UserSummary};

/// Unique identifier for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for GroupId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A group of users sharing expenses
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub icon: Option<String>,
    /// Members in the order they joined
    pub members: Vec<UserId>,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }
}

/// Group together with the public profile of each member
#[derive(Debug, Clone, Serialize)]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: Group,
    pub members_details: Vec<UserSummary>,
}

/// Data needed to create a new group
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub icon: Option<String>,
    pub invite_code: String,
    pub created_by: UserId,
}

/// Group changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub icon: Option<String>,
}

impl GroupChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.icon.is_none()
    }
}
