//! Group service
//!
//! Group lifecycle, membership via invite codes, and CSV export of a group's
//! expenses.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;

use crate::app::upload_service::delete_image_file;
use crate::domain::entities::{
    Expense, Group, GroupChanges, GroupId, GroupWithMembers, NewGroup, User, UserId,
};
use crate::domain::ports::{ExpenseRepository, GroupRepository, ImageStore, UserRepository};
use crate::error::{AppError, DomainError};

/// Maximum number of groups returned for one user
const MY_GROUPS_LIMIT: u64 = 100;

/// Attempts at drawing an unused invite code
const INVITE_CODE_ATTEMPTS: usize = 5;

/// Load a group and make sure the user belongs to it
pub async fn require_member<GR: GroupRepository>(
    groups: &GR,
    group_id: &GroupId,
    user_id: &UserId,
) -> Result<Group, AppError> {
    let group = groups
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

    if !group.is_member(user_id) {
        tracing::warn!(group_id = %group_id, user_id = %user_id, "Access by non-member");
        return Err(AppError::Domain(DomainError::Forbidden(
            "User not in group".to_string(),
        )));
    }

    Ok(group)
}

/// Service for managing groups
pub struct GroupService<GR, UR, ER, IS>
where
    GR: GroupRepository,
    UR: UserRepository,
    ER: ExpenseRepository,
    IS: ImageStore,
{
    groups: Arc<GR>,
    users: Arc<UR>,
    expenses: Arc<ER>,
    images: Arc<IS>,
    expense_fetch_limit: u64,
}

impl<GR, UR, ER, IS> GroupService<GR, UR, ER, IS>
where
    GR: GroupRepository,
    UR: UserRepository,
    ER: ExpenseRepository,
    IS: ImageStore,
{
    pub fn new(
        groups: Arc<GR>,
        users: Arc<UR>,
        expenses: Arc<ER>,
        images: Arc<IS>,
        expense_fetch_limit: u64,
    ) -> Self {
        Self {
            groups,
            users,
            expenses,
            images,
            expense_fetch_limit,
        }
    }

    /// Create a group with the user as its first member
    pub async fn create(
        &self,
        user: &User,
        name: &str,
        icon: Option<String>,
    ) -> Result<Group, AppError> {
        let name = validate_group_name(name)?;
        let invite_code = self.unused_invite_code().await?;

        let group = self
            .groups
            .create(&NewGroup {
                name,
                icon,
                invite_code,
                created_by: user.id,
            })
            .await?;

        tracing::info!(group_id = %group.id, user_id = %user.id, "Created group");
        Ok(group)
    }

    /// Join the group behind an invite code
    ///
    /// Joining a group the user already belongs to returns it unchanged.
    pub async fn join(&self, user: &User, invite_code: &str) -> Result<Group, AppError> {
        let group = self
            .groups
            .find_by_invite_code(invite_code.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

        if group.is_member(&user.id) {
            return Ok(group);
        }

        self.groups.add_member(&group.id, &user.id).await?;
        tracing::info!(group_id = %group.id, user_id = %user.id, "User joined group");

        self.groups
            .find_by_id(&group.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }

    /// Groups the user belongs to
    pub async fn my_groups(&self, user: &User) -> Result<Vec<Group>, AppError> {
        Ok(self.groups.find_by_member(&user.id, MY_GROUPS_LIMIT).await?)
    }

    /// Group details with the public profile of each member
    pub async fn details(
        &self,
        user: &User,
        group_id: &GroupId,
    ) -> Result<GroupWithMembers, AppError> {
        let group = require_member(self.groups.as_ref(), group_id, &user.id).await?;
        let members = self.users.find_many(&group.members).await?;

        Ok(GroupWithMembers {
            members_details: members.iter().map(User::summary).collect(),
            group,
        })
    }

    /// Rename a group or change its icon
    pub async fn update(
        &self,
        user: &User,
        group_id: &GroupId,
        mut changes: GroupChanges,
    ) -> Result<Group, AppError> {
        let group = require_member(self.groups.as_ref(), group_id, &user.id).await?;

        if changes.is_empty() {
            return Ok(group);
        }
        if let Some(name) = &changes.name {
            changes.name = Some(validate_group_name(name)?);
        }

        let updated = self.groups.update(group_id, &changes).await?;

        if changes.icon.is_some() && changes.icon != group.icon {
            delete_image_file(self.images.as_ref(), group.icon.as_deref()).await;
        }

        tracing::info!(group_id = %group_id, user_id = %user.id, "Updated group");
        Ok(updated)
    }

    /// Delete a group together with all of its expenses
    pub async fn delete(&self, user: &User, group_id: &GroupId) -> Result<(), AppError> {
        require_member(self.groups.as_ref(), group_id, &user.id).await?;

        let removed = self.groups.delete(group_id).await?;

        tracing::info!(
            group_id = %group_id,
            user_id = %user.id,
            expenses_removed = removed,
            "Deleted group"
        );
        Ok(())
    }

    /// Render the group's expenses as CSV
    pub async fn export_csv(&self, user: &User, group_id: &GroupId) -> Result<String, AppError> {
        require_member(self.groups.as_ref(), group_id, &user.id).await?;

        let expenses = self
            .expenses
            .find_by_group(group_id, self.expense_fetch_limit)
            .await?;

        let mut payer_ids: Vec<UserId> = Vec::new();
        for expense in &expenses {
            if !payer_ids.contains(&expense.payer_id) {
                payer_ids.push(expense.payer_id);
            }
        }
        let payer_names: HashMap<UserId, String> = self
            .users
            .find_many(&payer_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        render_csv(&expenses, &payer_names)
    }

    async fn unused_invite_code(&self) -> Result<String, AppError> {
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let code = generate_invite_code();
            if self.groups.find_by_invite_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(AppError::Internal(
            "Could not allocate an unused invite code".to_string(),
        ))
    }
}

/// Eight lowercase hex characters
pub fn generate_invite_code() -> String {
    let bytes: [u8; 4] = rand::thread_rng().gen();
    hex::encode(bytes)
}

fn validate_group_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(AppError::BadRequest(
            "Group name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// CSV with one row per expense; unknown payers are shown as "Unknown"
pub fn render_csv(
    expenses: &[Expense],
    payer_names: &HashMap<UserId, String>,
) -> Result<String, AppError> {
    let csv_error = |e: csv::Error| AppError::Internal(format!("CSV export failed: {}", e));

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(["Date", "Description", "Category", "Amount", "Payer", "Splits"])
        .map_err(csv_error)?;

    for expense in expenses {
        let payer = payer_names
            .get(&expense.payer_id)
            .map(String::as_str)
            .unwrap_or("Unknown");
        let splits = expense
            .split_details
            .iter()
            .map(|s| format!("{}:{}", s.user, s.share))
            .collect::<Vec<_>>()
            .join(", ");

        writer
            .write_record([
                expense.date.to_rfc3339().as_str(),
                expense.description.as_str(),
                expense.category.as_str(),
                format!("{:.2}", expense.amount).as_str(),
                payer,
                splits.as_str(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))
}
