//! Expense handlers
//!
//! Endpoints for recording expenses and settling up a group.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{
    Expense, ExpenseChanges, ExpenseId, GroupId, NewExpense, SettlementTransfer, SplitMap, User,
    UserId, DEFAULT_CATEGORY,
};
use crate::error::AppError;
use crate::handlers::MessageResponse;
use crate::AppState;

/// Request to add an expense
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub group_id: Uuid,
    pub payer_id: Uuid,
    pub description: String,
    pub amount: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults to now
    pub date: Option<DateTime<Utc>>,
    /// `{ "<user id>": <share>, ... }`
    pub split_details: SplitMap,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl CreateExpenseRequest {
    fn into_new_expense(self) -> NewExpense {
        NewExpense {
            group_id: GroupId(self.group_id),
            payer_id: UserId(self.payer_id),
            description: self.description,
            amount: self.amount,
            category: self.category,
            tags: self.tags,
            date: self.date.unwrap_or_else(Utc::now),
            split_details: self.split_details,
        }
    }
}

/// Request to update an expense; omitted fields stay as they are
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub payer_id: Option<Uuid>,
    pub split_details: Option<SplitMap>,
}

impl From<UpdateExpenseRequest> for ExpenseChanges {
    fn from(request: UpdateExpenseRequest) -> Self {
        ExpenseChanges {
            description: request.description,
            amount: request.amount,
            category: request.category,
            tags: request.tags,
            payer_id: request.payer_id.map(UserId),
            split_details: request.split_details,
        }
    }
}

/// POST /expenses/add
pub async fn add_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    let expense = state
        .expense_service
        .add(&user, request.into_new_expense())
        .await?;

    Ok(Json(expense))
}

/// GET /expenses/:id
pub async fn get_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(state.expense_service.get(&user, &ExpenseId(id)).await?))
}

/// PUT /expenses/:id
pub async fn update_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    let expense = state
        .expense_service
        .update(&user, &ExpenseId(id), request.into())
        .await?;

    Ok(Json(expense))
}

/// DELETE /expenses/:id
pub async fn delete_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.expense_service.delete(&user, &ExpenseId(id)).await?;
    Ok(Json(MessageResponse::new("Expense deleted successfully")))
}

/// GET /expenses/group/:group_id
pub async fn list_group_expenses(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = state
        .expense_service
        .list_for_group(&user, &GroupId(group_id))
        .await?;

    Ok(Json(expenses))
}

/// GET /expenses/group/:group_id/balances
///
/// Transfers that settle the group, as `[{from, to, amount}]`.
pub async fn group_balances(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<SettlementTransfer>>, AppError> {
    let transfers = state
        .expense_service
        .group_balances(&user, &GroupId(group_id))
        .await?;

    Ok(Json(transfers))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP: &str = "11111111-1111-1111-1111-111111111111";
    const ALICE: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

    #[test]
    fn parse_create_expense_defaults() {
        let json = format!(
            r#"{{
                "group_id": "{GROUP}",
                "payer_id": "{ALICE}",
                "description": "Dinner",
                "amount": 30.0,
                "split_details": {{"{ALICE}": 30.0}}
            }}"#
        );
        let request: CreateExpenseRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.category, "General");
        assert!(request.tags.is_empty());
        assert!(request.date.is_none());

        let expense = request.into_new_expense();
        assert_eq!(expense.split_details.len(), 1);
        assert_eq!(expense.payer_id.to_string(), ALICE);
    }

    #[test]
    fn parse_create_expense_rejects_negative_share() {
        let json = format!(
            r#"{{
                "group_id": "{GROUP}",
                "payer_id": "{ALICE}",
                "description": "Dinner",
                "amount": 30.0,
                "split_details": {{"{ALICE}": -30.0}}
            }}"#
        );
        let result: Result<CreateExpenseRequest, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }

    #[test]
    fn parse_update_expense_partial() {
        let request: UpdateExpenseRequest =
            serde_json::from_str(r#"{"amount": 12.5, "tags": ["food"]}"#).unwrap();
        let changes = ExpenseChanges::from(request);
        assert_eq!(changes.amount, Some(12.5));
        assert_eq!(changes.tags, Some(vec!["food".to_string()]));
        assert!(changes.split_details.is_none());
        assert!(changes.payer_id.is_none());
    }
}
