//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{
    Expense, ExpenseId, Group, GroupId, SplitMap, User, UserId, UserKey, DEFAULT_CATEGORY,
};

/// Create a test user with default values
pub fn test_user() -> User {
    test_user_named("Test User")
}

/// Create a test user with a specific name; the email is derived from it
pub fn test_user_named(name: &str) -> User {
    User {
        id: UserId(Uuid::new_v4()),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
        avatar: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Create a test group with the given members, in join order
pub fn test_group(members: &[UserId]) -> Group {
    let id = GroupId(Uuid::new_v4());
    Group {
        id,
        name: "Test Group".to_string(),
        icon: None,
        members: members.to_vec(),
        invite_code: id.0.simple().to_string()[..8].to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Build a split map from (user, share) pairs
pub fn split_of(shares: &[(UserId, f64)]) -> SplitMap {
    let mut map = SplitMap::new();
    for (user, share) in shares {
        map.insert(UserKey::from(user), *share)
            .expect("fixture split must be valid");
    }
    map
}

/// Create a test expense paid by `payer` and split as given
pub fn test_expense(
    group_id: &GroupId,
    payer: &UserId,
    amount: f64,
    shares: &[(UserId, f64)],
) -> Expense {
    Expense {
        id: ExpenseId(Uuid::new_v4()),
        group_id: *group_id,
        payer_id: *payer,
        description: "Test expense".to_string(),
        amount,
        category: DEFAULT_CATEGORY.to_string(),
        tags: vec![],
        date: Utc::now(),
        split_details: split_of(shares),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
