//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and keep insertion order, like the store does.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::entities::{
    Expense, ExpenseChanges, ExpenseId, Group, GroupChanges, GroupId, NewExpense, NewGroup,
    NewUser, User, UserChanges, UserId, UserKey,
};
use crate::domain::ports::{
    ExpenseRepository, GroupRepository, ImageStore, UserRepository, UPLOADS_PREFIX,
};
use crate::error::{DomainError, StorageError};

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().push(user);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| users.iter().find(|u| u.id == *id).cloned())
            .collect())
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(DomainError::AlreadyExists(new_user.email.clone()));
        }

        let user = User {
            id: UserId::new(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            avatar: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: &UserId, changes: &UserChanges) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))?;

        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(avatar) = &changes.avatar {
            user.avatar = Some(avatar.clone());
        }
        if let Some(hash) = &changes.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn deactivate(&self, id: &UserId) -> Result<(), DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("User {}", id)))?;
        user.is_active = false;
        Ok(())
    }
}

// ============================================================================
// In-Memory Group Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: Arc<RwLock<Vec<Group>>>,
    expenses: Arc<RwLock<Vec<Expense>>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a group for testing
    pub fn with_group(self, group: Group) -> Self {
        self.groups.write().unwrap().push(group);
        self
    }

    /// Share the expense store so deleting a group removes its expenses
    pub fn sharing_expenses(mut self, expenses: &InMemoryExpenseRepository) -> Self {
        self.expenses = expenses.expenses.clone();
        self
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError> {
        let groups = self.groups.read().unwrap();
        Ok(groups.iter().find(|g| g.id == *id).cloned())
    }

    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Group>, DomainError> {
        let groups = self.groups.read().unwrap();
        Ok(groups.iter().find(|g| g.invite_code == code).cloned())
    }

    async fn find_by_member(
        &self,
        user_id: &UserId,
        limit: u64,
    ) -> Result<Vec<Group>, DomainError> {
        let groups = self.groups.read().unwrap();
        Ok(groups
            .iter()
            .filter(|g| g.is_member(user_id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn create(&self, new_group: &NewGroup) -> Result<Group, DomainError> {
        let mut groups = self.groups.write().unwrap();
        if groups.iter().any(|g| g.invite_code == new_group.invite_code) {
            return Err(DomainError::AlreadyExists(new_group.invite_code.clone()));
        }

        let group = Group {
            id: GroupId::new(),
            name: new_group.name.clone(),
            icon: new_group.icon.clone(),
            members: vec![new_group.created_by],
            invite_code: new_group.invite_code.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        groups.push(group.clone());
        Ok(group)
    }

    async fn add_member(&self, id: &GroupId, user_id: &UserId) -> Result<(), DomainError> {
        let mut groups = self.groups.write().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Group {}", id)))?;
        if !group.is_member(user_id) {
            group.members.push(*user_id);
        }
        Ok(())
    }

    async fn update(&self, id: &GroupId, changes: &GroupChanges) -> Result<Group, DomainError> {
        let mut groups = self.groups.write().unwrap();
        let group = groups
            .iter_mut()
            .find(|g| g.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Group {}", id)))?;

        if let Some(name) = &changes.name {
            group.name = name.clone();
        }
        if let Some(icon) = &changes.icon {
            group.icon = Some(icon.clone());
        }
        group.updated_at = Utc::now();
        Ok(group.clone())
    }

    async fn delete(&self, id: &GroupId) -> Result<u64, DomainError> {
        let mut groups = self.groups.write().unwrap();
        let before = groups.len();
        groups.retain(|g| g.id != *id);
        if groups.len() == before {
            return Err(DomainError::NotFound(format!("Group {}", id)));
        }

        let mut expenses = self.expenses.write().unwrap();
        let before = expenses.len();
        expenses.retain(|e| e.group_id != *id);
        Ok((before - expenses.len()) as u64)
    }
}

// ============================================================================
// In-Memory Expense Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryExpenseRepository {
    expenses: Arc<RwLock<Vec<Expense>>>,
}

impl InMemoryExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with an expense; insertion order is store order
    pub fn with_expense(self, expense: Expense) -> Self {
        self.expenses.write().unwrap().push(expense);
        self
    }
}

#[async_trait]
impl ExpenseRepository for InMemoryExpenseRepository {
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, DomainError> {
        let expenses = self.expenses.read().unwrap();
        Ok(expenses.iter().find(|e| e.id == *id).cloned())
    }

    async fn find_by_group(
        &self,
        group_id: &GroupId,
        limit: u64,
    ) -> Result<Vec<Expense>, DomainError> {
        let expenses = self.expenses.read().unwrap();
        Ok(expenses
            .iter()
            .filter(|e| e.group_id == *group_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_involving_user(
        &self,
        user_id: &UserId,
        limit: u64,
    ) -> Result<Vec<Expense>, DomainError> {
        let expenses = self.expenses.read().unwrap();
        let mut involved: Vec<Expense> = expenses
            .iter()
            .filter(|e| {
                e.payer_id == *user_id || e.split_details.contains(&UserKey::from(user_id))
            })
            .cloned()
            .collect();
        involved.sort_by(|a, b| b.date.cmp(&a.date));
        involved.truncate(limit as usize);
        Ok(involved)
    }

    async fn create(&self, new_expense: &NewExpense) -> Result<Expense, DomainError> {
        let now = Utc::now();
        let expense = Expense {
            id: ExpenseId::new(),
            group_id: new_expense.group_id,
            payer_id: new_expense.payer_id,
            description: new_expense.description.clone(),
            amount: new_expense.amount,
            category: new_expense.category.clone(),
            tags: new_expense.tags.clone(),
            date: new_expense.date,
            split_details: new_expense.split_details.clone(),
            created_at: now,
            updated_at: now,
        };
        self.expenses.write().unwrap().push(expense.clone());
        Ok(expense)
    }

    async fn update(
        &self,
        id: &ExpenseId,
        changes: &ExpenseChanges,
    ) -> Result<Expense, DomainError> {
        let mut expenses = self.expenses.write().unwrap();
        let expense = expenses
            .iter_mut()
            .find(|e| e.id == *id)
            .ok_or_else(|| DomainError::NotFound(format!("Expense {}", id)))?;

        *expense = changes.apply_to(expense);
        expense.updated_at = Utc::now();
        Ok(expense.clone())
    }

    async fn delete(&self, id: &ExpenseId) -> Result<(), DomainError> {
        let mut expenses = self.expenses.write().unwrap();
        let before = expenses.len();
        expenses.retain(|e| e.id != *id);
        if expenses.len() == before {
            return Err(DomainError::NotFound(format!("Expense {}", id)));
        }
        Ok(())
    }
}

// ============================================================================
// In-Memory Image Store
// ============================================================================

/// Clones share the same files, so a test can keep a handle for assertions
#[derive(Default, Clone)]
pub struct InMemoryImageStore {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with an (empty) stored file
    pub fn with_file(self, file_name: &str) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(file_name.to_string(), Vec::new());
        self
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.read().unwrap().contains_key(file_name)
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        self.files
            .write()
            .unwrap()
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(format!("{}{}", UPLOADS_PREFIX, file_name))
    }

    async fn remove(&self, file_name: &str) -> Result<bool, StorageError> {
        Ok(self.files.write().unwrap().remove(file_name).is_some())
    }
}
