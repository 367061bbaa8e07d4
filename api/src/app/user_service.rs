//! User service
//!
//! Profile management and personal spending statistics.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::app::auth_service::{hash_password, validate_email, validate_name, validate_password};
use crate::app::settlement_engine::round_amount;
use crate::app::upload_service::delete_image_file;
use crate::domain::entities::{Expense, User, UserChanges};
use crate::domain::ports::{ExpenseRepository, ImageStore, UserRepository};
use crate::error::AppError;

/// Expenses shown in the "recent" list of the stats
const RECENT_EXPENSES: usize = 5;

/// Months covered by the activity chart
const ACTIVITY_MONTHS: i64 = 6;

/// Requested profile changes, password in clear text
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
}

/// An expense together with the current user's share of it
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseWithShare {
    #[serde(flatten)]
    pub expense: Expense,
    pub my_share: f64,
}

/// One bar of the activity chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyActivity {
    pub name: String,
    pub amount: f64,
}

/// Spending summary of a user across all groups
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_spent: f64,
    pub total_paid: f64,
    pub net_balance: f64,
    pub recent_expenses: Vec<ExpenseWithShare>,
    pub expense_count: usize,
    pub monthly_activity: Vec<MonthlyActivity>,
}

/// Service for user profiles
pub struct UserService<UR, ER, IS>
where
    UR: UserRepository,
    ER: ExpenseRepository,
    IS: ImageStore,
{
    users: Arc<UR>,
    expenses: Arc<ER>,
    images: Arc<IS>,
    expense_fetch_limit: u64,
}

impl<UR, ER, IS> UserService<UR, ER, IS>
where
    UR: UserRepository,
    ER: ExpenseRepository,
    IS: ImageStore,
{
    pub fn new(users: Arc<UR>, expenses: Arc<ER>, images: Arc<IS>, expense_fetch_limit: u64) -> Self {
        Self {
            users,
            expenses,
            images,
            expense_fetch_limit,
        }
    }

    /// Update the profile; an empty update returns the user unchanged
    pub async fn update(&self, user: &User, update: ProfileUpdate) -> Result<User, AppError> {
        let mut changes = UserChanges::default();

        if let Some(name) = update.name.as_deref() {
            changes.name = Some(validate_name(name)?);
        }
        if let Some(email) = update.email.as_deref() {
            let email = validate_email(email)?;
            if email != user.email {
                if let Some(existing) = self.users.find_by_email(&email).await? {
                    if existing.id != user.id {
                        return Err(AppError::BadRequest("Email already registered".to_string()));
                    }
                }
            }
            changes.email = Some(email);
        }
        if let Some(password) = update.password.as_deref() {
            validate_password(password)?;
            changes.password_hash = Some(hash_password(password).await?);
        }
        changes.avatar = update.avatar;

        if changes.is_empty() {
            return Ok(user.clone());
        }

        let avatar_replaced = changes.avatar.is_some() && changes.avatar != user.avatar;
        let updated = self.users.update(&user.id, &changes).await?;

        if avatar_replaced {
            delete_image_file(self.images.as_ref(), user.avatar.as_deref()).await;
        }

        tracing::info!(user_id = %user.id, "Updated profile");
        Ok(updated)
    }

    /// Deactivate the account; its tokens stop working immediately
    pub async fn disable(&self, user: &User) -> Result<(), AppError> {
        self.users.deactivate(&user.id).await?;
        tracing::info!(user_id = %user.id, "Disabled account");
        Ok(())
    }

    pub async fn stats(&self, user: &User) -> Result<UserStats, AppError> {
        let expenses = self
            .expenses
            .find_involving_user(&user.id, self.expense_fetch_limit)
            .await?;

        Ok(compute_stats(user, expenses, Utc::now()))
    }
}

/// Summarize the user's expenses, which arrive most recent first
pub fn compute_stats(user: &User, expenses: Vec<Expense>, now: DateTime<Utc>) -> UserStats {
    let key = user.key();
    let mut total_paid = 0.0;
    let mut total_spent = 0.0;

    let with_shares: Vec<ExpenseWithShare> = expenses
        .into_iter()
        .map(|expense| {
            let my_share = expense.share_of(&key);
            if expense.payer_id == user.id {
                total_paid += expense.amount;
            }
            total_spent += my_share;
            ExpenseWithShare { expense, my_share }
        })
        .collect();

    let monthly_activity = monthly_activity(&with_shares, now);

    UserStats {
        total_spent: round_amount(total_spent),
        total_paid: round_amount(total_paid),
        net_balance: round_amount(total_paid - total_spent),
        expense_count: with_shares.len(),
        recent_expenses: with_shares.into_iter().take(RECENT_EXPENSES).collect(),
        monthly_activity,
    }
}

/// Own share per abbreviated month over roughly the last six months.
///
/// Buckets are labelled from `now - i * 30 days` for i = 5..0; labels that
/// repeat collapse into one bucket.
pub fn monthly_activity(expenses: &[ExpenseWithShare], now: DateTime<Utc>) -> Vec<MonthlyActivity> {
    let mut buckets: Vec<MonthlyActivity> = Vec::new();
    for i in (0..ACTIVITY_MONTHS).rev() {
        let name = month_label(now - Duration::days(i * 30));
        if !buckets.iter().any(|b| b.name == name) {
            buckets.push(MonthlyActivity { name, amount: 0.0 });
        }
    }

    let window_days = ACTIVITY_MONTHS * 30;
    for item in expenses {
        if (now - item.expense.date).num_days() >= window_days {
            continue;
        }
        let name = month_label(item.expense.date);
        if let Some(bucket) = buckets.iter_mut().find(|b| b.name == name) {
            bucket.amount += item.my_share;
        }
    }

    for bucket in &mut buckets {
        bucket.amount = round_amount(bucket.amount);
    }
    buckets
}

fn month_label(date: DateTime<Utc>) -> String {
    date.format("%b").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::entities::GroupId;
    use crate::test_utils::{
        test_expense, test_user, test_user_named, InMemoryExpenseRepository, InMemoryImageStore,
        InMemoryUserRepository,
    };

    type TestService = UserService<InMemoryUserRepository, InMemoryExpenseRepository, InMemoryImageStore>;

    fn create_service(
        users: InMemoryUserRepository,
        expenses: InMemoryExpenseRepository,
        images: InMemoryImageStore,
    ) -> TestService {
        UserService::new(Arc::new(users), Arc::new(expenses), Arc::new(images), 1000)
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn empty_update_returns_user() {
        let user = test_user();
        let service = create_service(
            InMemoryUserRepository::new().with_user(user.clone()),
            InMemoryExpenseRepository::new(),
            InMemoryImageStore::new(),
        );

        let same = service.update(&user, ProfileUpdate::default()).await.unwrap();
        assert_eq!(same.id, user.id);
        assert_eq!(same.name, user.name);
    }

    #[tokio::test]
    async fn update_rejects_taken_email() {
        let user = test_user_named("Ada");
        let other = test_user_named("Grace");
        let service = create_service(
            InMemoryUserRepository::new()
                .with_user(user.clone())
                .with_user(other.clone()),
            InMemoryExpenseRepository::new(),
            InMemoryImageStore::new(),
        );

        let err = service
            .update(
                &user,
                ProfileUpdate {
                    email: Some(other.email.to_uppercase()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Email already registered"));
    }

    #[tokio::test]
    async fn update_rehashes_password_and_replaces_avatar() {
        let mut user = test_user();
        user.avatar = Some("/uploads/old.png".to_string());
        let images = InMemoryImageStore::new().with_file("old.png");
        let service = create_service(
            InMemoryUserRepository::new().with_user(user.clone()),
            InMemoryExpenseRepository::new(),
            images.clone(),
        );

        let updated = service
            .update(
                &user,
                ProfileUpdate {
                    avatar: Some("/uploads/new.png".to_string()),
                    password: Some("new-password".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.avatar.as_deref(), Some("/uploads/new.png"));
        assert!(
            crate::app::auth_service::verify_password("new-password", &updated.password_hash)
                .await
                .unwrap()
        );
        assert!(!images.contains("old.png"));
    }

    #[tokio::test]
    async fn disable_deactivates() {
        let user = test_user();
        let users = InMemoryUserRepository::new().with_user(user.clone());
        let service = create_service(users, InMemoryExpenseRepository::new(), InMemoryImageStore::new());

        service.disable(&user).await.unwrap();

        let stored = service.users.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[test]
    fn stats_totals() {
        let me = test_user_named("Me");
        let friend = test_user_named("Friend");
        let group = GroupId::new();
        let now = at(2024, 6, 15);

        let mut paid = test_expense(&group, &me.id, 30.0, &[(me.id, 10.0), (friend.id, 20.0)]);
        paid.date = at(2024, 6, 10);
        let mut owed = test_expense(&group, &friend.id, 10.0, &[(me.id, 4.25), (friend.id, 5.75)]);
        owed.date = at(2024, 6, 1);

        let stats = compute_stats(&me, vec![paid, owed], now);

        assert_eq!(stats.total_paid, 30.0);
        assert_eq!(stats.total_spent, 14.25);
        assert_eq!(stats.net_balance, 15.75);
        assert_eq!(stats.expense_count, 2);
        assert_eq!(stats.recent_expenses[0].my_share, 10.0);
        assert_eq!(stats.recent_expenses[1].my_share, 4.25);
    }

    #[test]
    fn recent_expenses_are_capped() {
        let me = test_user();
        let group = GroupId::new();
        let expenses: Vec<Expense> = (0..8)
            .map(|_| test_expense(&group, &me.id, 1.0, &[(me.id, 1.0)]))
            .collect();

        let stats = compute_stats(&me, expenses, Utc::now());
        assert_eq!(stats.expense_count, 8);
        assert_eq!(stats.recent_expenses.len(), 5);
    }

    #[test]
    fn monthly_buckets_cover_six_months() {
        let me = test_user();
        let group = GroupId::new();
        let now = at(2024, 6, 15);

        let mut june = test_expense(&group, &me.id, 12.0, &[(me.id, 12.0)]);
        june.date = at(2024, 6, 3);
        let mut march = test_expense(&group, &me.id, 7.5, &[(me.id, 7.5)]);
        march.date = at(2024, 3, 20);
        let mut too_old = test_expense(&group, &me.id, 100.0, &[(me.id, 100.0)]);
        too_old.date = at(2023, 6, 20);

        let stats = compute_stats(&me, vec![june, march, too_old], now);
        let names: Vec<&str> = stats
            .monthly_activity
            .iter()
            .map(|m| m.name.as_str())
            .collect();

        assert_eq!(names, vec!["Jan", "Feb", "Mar", "Apr", "May", "Jun"]);
        assert_eq!(stats.monthly_activity[5].amount, 12.0);
        assert_eq!(stats.monthly_activity[2].amount, 7.5);
        assert_eq!(stats.monthly_activity[0].amount, 0.0);
    }

    #[test]
    fn repeated_month_labels_collapse() {
        // 30-day steps back from 2024-03-31 hit January and March twice, February never
        let now = at(2024, 3, 31);
        let buckets = monthly_activity(&[], now);
        let names: Vec<&str> = buckets.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Nov", "Dec", "Jan", "Mar"]);
    }

    #[test]
    fn expense_with_share_flattens() {
        let me = test_user();
        let expense = test_expense(&GroupId::new(), &me.id, 4.0, &[(me.id, 4.0)]);
        let json = serde_json::to_value(ExpenseWithShare {
            expense,
            my_share: 4.0,
        })
        .unwrap();
        assert_eq!(json["amount"], 4.0);
        assert_eq!(json["my_share"], 4.0);
    }
}
