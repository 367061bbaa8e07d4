//! PostgreSQL adapter for ExpenseRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Expense, ExpenseChanges, ExpenseId, GroupId, NewExpense, SplitMap, UserId, UserKey,
};
use crate::domain::ports::ExpenseRepository;
use crate::entity::expenses;
use crate::error::DomainError;

/// PostgreSQL implementation of ExpenseRepository
pub struct PostgresExpenseRepository {
    db: DatabaseConnection,
}

impl PostgresExpenseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn split_to_json(split: &SplitMap) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(split)
        .map_err(|e| DomainError::Internal(format!("Failed to encode split: {}", e)))
}

fn to_domain_all(models: Vec<expenses::Model>) -> Result<Vec<Expense>, DomainError> {
    models.into_iter().map(Expense::try_from).collect()
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn find_by_id(&self, id: &ExpenseId) -> Result<Option<Expense>, DomainError> {
        let result = expenses::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(Expense::try_from).transpose()
    }

    async fn find_by_group(
        &self,
        group_id: &GroupId,
        limit: u64,
    ) -> Result<Vec<Expense>, DomainError> {
        let results = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id.0))
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        to_domain_all(results)
    }

    async fn find_involving_user(
        &self,
        user_id: &UserId,
        limit: u64,
    ) -> Result<Vec<Expense>, DomainError> {
        let key = UserKey::from(user_id).to_string();

        let results = expenses::Entity::find()
            .filter(
                Condition::any()
                    .add(expenses::Column::PayerId.eq(user_id.0))
                    .add(Expr::cust_with_values(
                        "jsonb_exists(split_details::jsonb, $1)",
                        [key],
                    )),
            )
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        to_domain_all(results)
    }

    async fn create(&self, expense: &NewExpense) -> Result<Expense, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_id: Set(expense.group_id.0),
            payer_id: Set(expense.payer_id.0),
            description: Set(expense.description.clone()),
            amount: Set(expense.amount),
            category: Set(expense.category.clone()),
            tags: Set(expense.tags.clone()),
            date: Set(expense.date.fixed_offset()),
            split_details: Set(split_to_json(&expense.split_details)?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Expense::try_from(result)
    }

    async fn update(
        &self,
        id: &ExpenseId,
        changes: &ExpenseChanges,
    ) -> Result<Expense, DomainError> {
        let mut model = expenses::ActiveModel {
            id: Set(id.0),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        if let Some(description) = &changes.description {
            model.description = Set(description.clone());
        }
        if let Some(amount) = changes.amount {
            model.amount = Set(amount);
        }
        if let Some(category) = &changes.category {
            model.category = Set(category.clone());
        }
        if let Some(tags) = &changes.tags {
            model.tags = Set(tags.clone());
        }
        if let Some(payer_id) = changes.payer_id {
            model.payer_id = Set(payer_id.0);
        }
        if let Some(split) = &changes.split_details {
            model.split_details = Set(split_to_json(split)?);
        }

        let result = model.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => DomainError::NotFound(format!("Expense {}", id)),
            e => DomainError::Database(e.to_string()),
        })?;

        Expense::try_from(result)
    }

    async fn delete(&self, id: &ExpenseId) -> Result<(), DomainError> {
        let result = expenses::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            Err(DomainError::NotFound(format!("Expense {}", id)))
        } else {
            Ok(())
        }
    }
}

/// Convert SeaORM model to domain entity; the stored split is re-validated
impl TryFrom<expenses::Model> for Expense {
    type Error = DomainError;

    fn try_from(model: expenses::Model) -> Result<Self, Self::Error> {
        let split_details: SplitMap = serde_json::from_value(model.split_details).map_err(|e| {
            DomainError::Internal(format!("Stored split of expense {} is invalid: {}", model.id, e))
        })?;

        Ok(Expense {
            id: ExpenseId(model.id),
            group_id: GroupId(model.group_id),
            payer_id: UserId(model.payer_id),
            description: model.description,
            amount: model.amount,
            category: model.category,
            tags: model.tags,
            date: model.date.with_timezone(&Utc),
            split_details,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
