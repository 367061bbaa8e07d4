//! Expense service
//!
//! Records shared expenses and answers the "who owes whom" question for a
//! group by running the settlement engine over its expenses.

use std::sync::Arc;

use crate::app::group_service::require_member;
use crate::app::settlement_engine::calculate_settlements;
use crate::domain::entities::{
    Expense, ExpenseChanges, ExpenseId, Group, GroupId, NewExpense, SettlementTransfer, SplitMap,
    User, UserId,
};
use crate::domain::ports::{ExpenseRepository, GroupRepository};
use crate::error::AppError;

/// Maximum number of expenses returned by a group listing
const GROUP_LIST_LIMIT: u64 = 100;

/// Service for managing expenses
pub struct ExpenseService<ER, GR>
where
    ER: ExpenseRepository,
    GR: GroupRepository,
{
    expenses: Arc<ER>,
    groups: Arc<GR>,
    expense_fetch_limit: u64,
}

impl<ER, GR> ExpenseService<ER, GR>
where
    ER: ExpenseRepository,
    GR: GroupRepository,
{
    pub fn new(expenses: Arc<ER>, groups: Arc<GR>, expense_fetch_limit: u64) -> Self {
        Self {
            expenses,
            groups,
            expense_fetch_limit,
        }
    }

    /// Record a new expense in one of the user's groups
    pub async fn add(&self, user: &User, expense: NewExpense) -> Result<Expense, AppError> {
        let group = require_member(self.groups.as_ref(), &expense.group_id, &user.id).await?;
        validate_expense(
            &group,
            expense.amount,
            &expense.payer_id,
            &expense.split_details,
        )?;

        let created = self.expenses.create(&expense).await?;
        tracing::info!(
            expense_id = %created.id,
            group_id = %created.group_id,
            user_id = %user.id,
            amount = created.amount,
            "Added expense"
        );
        Ok(created)
    }

    /// Fetch an expense from one of the user's groups
    pub async fn get(&self, user: &User, expense_id: &ExpenseId) -> Result<Expense, AppError> {
        let (expense, _) = self.load_for_member(user, expense_id).await?;
        Ok(expense)
    }

    /// Apply changes; the merged expense must still be consistent
    pub async fn update(
        &self,
        user: &User,
        expense_id: &ExpenseId,
        changes: ExpenseChanges,
    ) -> Result<Expense, AppError> {
        let (expense, group) = self.load_for_member(user, expense_id).await?;

        if changes.is_empty() {
            return Ok(expense);
        }

        let merged = changes.apply_to(&expense);
        validate_expense(&group, merged.amount, &merged.payer_id, &merged.split_details)?;

        let updated = self.expenses.update(expense_id, &changes).await?;
        tracing::info!(expense_id = %expense_id, user_id = %user.id, "Updated expense");
        Ok(updated)
    }

    pub async fn delete(&self, user: &User, expense_id: &ExpenseId) -> Result<(), AppError> {
        self.load_for_member(user, expense_id).await?;
        self.expenses.delete(expense_id).await?;
        tracing::info!(expense_id = %expense_id, user_id = %user.id, "Deleted expense");
        Ok(())
    }

    /// Expenses of a group in store order
    pub async fn list_for_group(
        &self,
        user: &User,
        group_id: &GroupId,
    ) -> Result<Vec<Expense>, AppError> {
        require_member(self.groups.as_ref(), group_id, &user.id).await?;
        Ok(self.expenses.find_by_group(group_id, GROUP_LIST_LIMIT).await?)
    }

    /// Transfers that settle every debt in the group
    pub async fn group_balances(
        &self,
        user: &User,
        group_id: &GroupId,
    ) -> Result<Vec<SettlementTransfer>, AppError> {
        require_member(self.groups.as_ref(), group_id, &user.id).await?;

        let expenses = self
            .expenses
            .find_by_group(group_id, self.expense_fetch_limit)
            .await?;

        calculate_settlements(&expenses).map_err(|e| {
            tracing::error!(group_id = %group_id, error = %e, "Rejected group balances");
            AppError::from(e)
        })
    }

    async fn load_for_member(
        &self,
        user: &User,
        expense_id: &ExpenseId,
    ) -> Result<(Expense, Group), AppError> {
        let expense = self
            .expenses
            .find_by_id(expense_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))?;
        let group = require_member(self.groups.as_ref(), &expense.group_id, &user.id).await?;
        Ok((expense, group))
    }
}

fn validate_expense(
    group: &Group,
    amount: f64,
    payer_id: &UserId,
    split_details: &SplitMap,
) -> Result<(), AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::BadRequest(
            "Amount must be a positive number".to_string(),
        ));
    }
    if !split_details.matches_amount(amount) {
        return Err(AppError::BadRequest(
            "Split amounts do not match total amount".to_string(),
        ));
    }
    if !group.is_member(payer_id) {
        return Err(AppError::BadRequest(
            "Payer is not a member of the group".to_string(),
        ));
    }
    Ok(())
}
