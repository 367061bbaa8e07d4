//! PostgreSQL adapter for GroupRepository
//!
//! Membership lives in `group_members`; a group's member list is ordered by
//! `joined_at`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{Group, GroupChanges, GroupId, NewGroup, UserId};
use crate::domain::ports::GroupRepository;
use crate::entity::{expenses, group_members, groups};
use crate::error::DomainError;

/// PostgreSQL implementation of GroupRepository
pub struct PostgresGroupRepository {
    db: DatabaseConnection,
}

impl PostgresGroupRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Member lists of several groups, each in join order
    async fn members_of(&self, group_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<UserId>>, DomainError> {
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.is_in(group_ids.iter().copied()))
            .order_by_asc(group_members::Column::JoinedAt)
            .order_by_asc(group_members::Column::UserId)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut members: HashMap<Uuid, Vec<UserId>> = HashMap::new();
        for row in rows {
            members
                .entry(row.group_id)
                .or_default()
                .push(UserId(row.user_id));
        }
        Ok(members)
    }

    async fn with_members(&self, model: groups::Model) -> Result<Group, DomainError> {
        let mut members = self.members_of(&[model.id]).await?;
        let list = members.remove(&model.id).unwrap_or_default();
        Ok(to_group(model, list))
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError> {
        let result = groups::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        match result {
            Some(model) => Ok(Some(self.with_members(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Group>, DomainError> {
        let result = groups::Entity::find()
            .filter(groups::Column::InviteCode.eq(code))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        match result {
            Some(model) => Ok(Some(self.with_members(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_member(
        &self,
        user_id: &UserId,
        limit: u64,
    ) -> Result<Vec<Group>, DomainError> {
        let results = groups::Entity::find()
            .join(JoinType::InnerJoin, groups::Relation::GroupMembers.def())
            .filter(group_members::Column::UserId.eq(user_id.0))
            .order_by_desc(groups::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let ids: Vec<Uuid> = results.iter().map(|m| m.id).collect();
        let mut members = self.members_of(&ids).await?;

        Ok(results
            .into_iter()
            .map(|m| {
                let list = members.remove(&m.id).unwrap_or_default();
                to_group(m, list)
            })
            .collect())
    }

    async fn create(&self, group: &NewGroup) -> Result<Group, DomainError> {
        let id = Uuid::new_v4();
        let now = Utc::now().fixed_offset();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let model = groups::ActiveModel {
            id: Set(id),
            name: Set(group.name.clone()),
            icon: Set(group.icon.clone()),
            invite_code: Set(group.invite_code.clone()),
            created_by: Set(Some(group.created_by.0)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("duplicate key") {
                DomainError::AlreadyExists(format!("Invite code {}", group.invite_code))
            } else {
                DomainError::Database(msg)
            }
        })?;

        group_members::ActiveModel {
            group_id: Set(id),
            user_id: Set(group.created_by.0),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(to_group(model, vec![group.created_by]))
    }

    async fn add_member(&self, id: &GroupId, user_id: &UserId) -> Result<(), DomainError> {
        let existing = group_members::Entity::find_by_id((id.0, user_id.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }

        let inserted = group_members::ActiveModel {
            group_id: Set(id.0),
            user_id: Set(user_id.0),
            joined_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            // A concurrent join got there first
            Err(e) if e.to_string().contains("duplicate key") => Ok(()),
            Err(e) => Err(DomainError::Database(e.to_string())),
        }
    }

    async fn update(&self, id: &GroupId, changes: &GroupChanges) -> Result<Group, DomainError> {
        let mut model = groups::ActiveModel {
            id: Set(id.0),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(name) = &changes.name {
            model.name = Set(name.clone());
        }
        if let Some(icon) = &changes.icon {
            model.icon = Set(Some(icon.clone()));
        }

        let result = model.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => DomainError::NotFound(format!("Group {}", id)),
            e => DomainError::Database(e.to_string()),
        })?;

        self.with_members(result).await
    }

    async fn delete(&self, id: &GroupId) -> Result<u64, DomainError> {
        // Dropping the transaction without commit rolls everything back
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let removed = expenses::Entity::delete_many()
            .filter(expenses::Column::GroupId.eq(id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        group_members::Entity::delete_many()
            .filter(group_members::Column::GroupId.eq(id.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let result = groups::Entity::delete_by_id(id.0)
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Group {}", id)));
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(removed.rows_affected)
    }
}

/// Convert SeaORM model plus member list to domain entity
fn to_group(model: groups::Model, members: Vec<UserId>) -> Group {
    Group {
        id: GroupId(model.id),
        name: model.name,
        icon: model.icon,
        members,
        invite_code: model.invite_code,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
