//! User domain entity
//!
//! Represents a person who shares expenses with the groups they belong to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical comparable form of a user identifier.
///
/// Identifiers that parse as a UUID are rendered lowercase and hyphenated, so
/// `"6F9619FF-8B86-D011-B42D-00C04FC964FF"` and `"6f9619ff8b86d011b42d00c04fc964ff"`
/// collide into the same key. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UserKey(String);

impl UserKey {
    pub fn normalize(raw: &str) -> Self {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => Self(id.to_string()),
            Err(_) => Self(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserKey {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<&str> for UserKey {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl From<UserId> for UserKey {
    fn from(id: UserId) -> Self {
        Self(id.0.to_string())
    }
}

impl From<&UserId> for UserKey {
    fn from(id: &UserId) -> Self {
        Self(id.0.to_string())
    }
}

impl From<UserKey> for String {
    fn from(key: UserKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn key(&self) -> UserKey {
        UserKey::from(self.id)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Public view of a group member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// Data needed to create a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
            && self.password_hash.is_none()
    }
}
