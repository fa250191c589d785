//! Goal service domain logic.
//!
//! Progress is never persisted. Every read fetches the ledger once for the
//! combined window of all goals and aggregates in memory, so adding goals
//! does not add queries.
//!
//! Classification rules:
//! - income goal: `completed` once `current >= limit`; `failed` only when
//!   the end date has passed without reaching the limit.
//! - expense goal: `failed` as soon as `current > limit`; `completed` when
//!   the window closes within the limit.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::DbConnection;
use crate::domain::commands::goals::{CreateGoalCommand, GoalResult, UpdateGoalCommand};
use crate::domain::models::goal::{Goal, GoalValidationError, GoalWithProgress};
use crate::domain::models::LedgerTransaction;
use crate::storage::{GoalRepository, LedgerRepository};
use shared::{AccountContext, CashFlowKind, GoalStatus, TransactionKind};

#[derive(Clone)]
pub struct GoalService {
    goal_repository: GoalRepository,
    ledger_repository: LedgerRepository,
}

impl GoalService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            goal_repository: GoalRepository::new(db.clone()),
            ledger_repository: LedgerRepository::new(db),
        }
    }

    pub async fn create_goal(&self, command: CreateGoalCommand) -> Result<GoalResult> {
        info!("Creating goal: {:?}", command);

        validate_description(&command.description)?;
        if command.limit_amount <= 0.0 {
            return Err(GoalValidationError::NonPositiveLimit.into());
        }
        let start_date = parse_goal_date(&command.start_date)?;
        let end_date = parse_goal_date(&command.end_date)?;
        if start_date > end_date {
            return Err(GoalValidationError::StartAfterEnd.into());
        }

        let now_millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        let now_rfc3339 = chrono::Utc::now().to_rfc3339();

        let goal = Goal {
            id: shared::Goal::generate_id(now_millis),
            description: command.description.trim().to_string(),
            kind: command.kind,
            category_id: command.category_id,
            limit_amount: command.limit_amount,
            start_date,
            end_date,
            context: command.context,
            created_at: now_rfc3339.clone(),
            updated_at: now_rfc3339,
        };

        self.goal_repository.store_goal(&goal).await?;

        info!("Successfully created goal: {}", goal.id);

        Ok(GoalResult {
            goal,
            success_message: "Goal created successfully".to_string(),
        })
    }

    pub async fn update_goal(&self, command: UpdateGoalCommand) -> Result<GoalResult> {
        info!("Updating goal: {:?}", command);

        let mut goal = self
            .goal_repository
            .get_goal(&command.goal_id)
            .await?
            .ok_or_else(|| anyhow!("Goal not found: {}", command.goal_id))?;

        if let Some(description) = command.description {
            validate_description(&description)?;
            goal.description = description.trim().to_string();
        }
        if let Some(limit) = command.limit_amount {
            if limit <= 0.0 {
                return Err(GoalValidationError::NonPositiveLimit.into());
            }
            goal.limit_amount = limit;
        }
        if let Some(start) = command.start_date {
            goal.start_date = parse_goal_date(&start)?;
        }
        if let Some(end) = command.end_date {
            goal.end_date = parse_goal_date(&end)?;
        }
        if goal.start_date > goal.end_date {
            return Err(GoalValidationError::StartAfterEnd.into());
        }
        goal.updated_at = chrono::Utc::now().to_rfc3339();

        self.goal_repository.update_goal(&goal).await?;

        Ok(GoalResult {
            goal,
            success_message: "Goal updated successfully".to_string(),
        })
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<bool> {
        self.goal_repository.delete_goal(goal_id).await
    }

    pub async fn list_goals(&self, context: Option<AccountContext>) -> Result<Vec<Goal>> {
        self.goal_repository.list_goals(context).await
    }

    /// Compute progress for every goal of one context view. The ledger is
    /// fetched once for the combined date window of all goals.
    pub async fn goal_progress(
        &self,
        context: AccountContext,
        today: NaiveDate,
    ) -> Result<Vec<GoalWithProgress>> {
        let goals = self.goal_repository.list_goals(Some(context)).await?;
        if goals.is_empty() {
            return Ok(Vec::new());
        }

        let window_start = goals.iter().map(|g| g.start_date).min().unwrap();
        let window_end = goals.iter().map(|g| g.end_date).max().unwrap();

        let transactions = self
            .ledger_repository
            .list_in_range(context, &window_start.to_string(), &window_end.to_string())
            .await?;

        let progress = goals
            .into_iter()
            .map(|goal| {
                let current = accumulate(&goal, &transactions);
                let status = classify_goal(goal.kind, goal.limit_amount, current, goal.end_date, today);
                GoalWithProgress { goal, current, status }
            })
            .collect();

        Ok(progress)
    }
}

/// Sum the transactions matching one goal within its window. Returns a
/// magnitude, not a signed amount.
fn accumulate(goal: &Goal, transactions: &[LedgerTransaction]) -> f64 {
    transactions
        .iter()
        .filter(|t| t.date >= goal.start_date && t.date <= goal.end_date)
        .filter(|t| match &goal.category_id {
            Some(category_id) => t.category_id.as_deref() == Some(category_id.as_str()),
            None => match goal.kind {
                CashFlowKind::Income => t.kind == TransactionKind::Income,
                // Invoice payments are realized spending too
                CashFlowKind::Expense => {
                    t.kind == TransactionKind::Expense || t.kind == TransactionKind::InvoicePayment
                }
            },
        })
        .map(|t| t.amount.abs())
        .sum()
}

/// Classify a goal from its accumulated amount and the current date.
pub fn classify_goal(
    kind: CashFlowKind,
    limit: f64,
    current: f64,
    end_date: NaiveDate,
    today: NaiveDate,
) -> GoalStatus {
    match kind {
        CashFlowKind::Income => {
            if current >= limit {
                GoalStatus::Completed
            } else if today > end_date {
                GoalStatus::Failed
            } else {
                GoalStatus::Active
            }
        }
        CashFlowKind::Expense => {
            if current > limit {
                GoalStatus::Failed
            } else if today > end_date {
                GoalStatus::Completed
            } else {
                GoalStatus::Active
            }
        }
    }
}

fn validate_description(description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(GoalValidationError::EmptyDescription.into());
    }
    if description.len() > 256 {
        return Err(GoalValidationError::DescriptionTooLong.into());
    }
    Ok(())
}

fn parse_goal_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| anyhow!("Invalid goal date: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account_service::AccountService;
    use crate::domain::commands::accounts::CreateAccountCommand;
    use crate::domain::commands::transactions::CreateTransactionCommand;
    use crate::domain::transaction_service::TransactionService;
    use crate::events::EventBus;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_expense_goal_over_limit_is_failed_even_after_end_date() {
        let status = classify_goal(
            CashFlowKind::Expense,
            1000.0,
            1200.0,
            date("2025-01-31"),
            date("2025-03-01"),
        );
        assert_eq!(status, GoalStatus::Failed);
    }

    #[test]
    fn test_expense_goal_within_limit_completes_after_end_date() {
        let status = classify_goal(
            CashFlowKind::Expense,
            1000.0,
            800.0,
            date("2025-01-31"),
            date("2025-02-01"),
        );
        assert_eq!(status, GoalStatus::Completed);
    }

    #[test]
    fn test_income_goal_over_limit_completes_regardless_of_date() {
        for today in ["2025-01-15", "2025-06-01"] {
            let status = classify_goal(
                CashFlowKind::Income,
                1000.0,
                1200.0,
                date("2025-01-31"),
                date(today),
            );
            assert_eq!(status, GoalStatus::Completed);
        }
    }

    #[test]
    fn test_income_goal_under_limit_fails_only_after_end_date() {
        let active = classify_goal(
            CashFlowKind::Income,
            1000.0,
            500.0,
            date("2025-01-31"),
            date("2025-01-20"),
        );
        assert_eq!(active, GoalStatus::Active);

        let failed = classify_goal(
            CashFlowKind::Income,
            1000.0,
            500.0,
            date("2025-01-31"),
            date("2025-02-01"),
        );
        assert_eq!(failed, GoalStatus::Failed);
    }

    async fn create_test_services() -> (GoalService, TransactionService, String) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let events = EventBus::new();
        let goals = GoalService::new(db.clone());
        let transactions = TransactionService::new(db.clone(), events.clone());
        let accounts = AccountService::new(db, events);

        let account = accounts
            .create_account(CreateAccountCommand {
                name: "Checking".to_string(),
                bank_name: None,
                context: AccountContext::Personal,
                opening_balance: 10_000.0,
            })
            .await
            .unwrap()
            .account;

        (goals, transactions, account.id)
    }

    fn goal_command(kind: CashFlowKind, limit: f64) -> CreateGoalCommand {
        CreateGoalCommand {
            description: "Monthly budget".to_string(),
            kind,
            category_id: None,
            limit_amount: limit,
            start_date: "2025-01-01".to_string(),
            end_date: "2025-01-31".to_string(),
            context: AccountContext::Personal,
        }
    }

    async fn spend(transactions: &TransactionService, account_id: &str, amount: f64, date: &str) {
        transactions
            .create_transaction(CreateTransactionCommand {
                account_id: account_id.to_string(),
                description: "Spending".to_string(),
                amount,
                category_id: None,
                date: Some(date.to_string()),
                context: AccountContext::Personal,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_goal_progress_sums_only_matching_window() {
        let (goals, transactions, account_id) = create_test_services().await;
        goals.create_goal(goal_command(CashFlowKind::Expense, 1000.0)).await.unwrap();

        spend(&transactions, &account_id, -300.0, "2025-01-10").await;
        spend(&transactions, &account_id, -200.0, "2025-01-20").await;
        // Outside the window
        spend(&transactions, &account_id, -400.0, "2025-02-05").await;
        // Income does not count toward an expense goal
        spend(&transactions, &account_id, 900.0, "2025-01-15").await;

        let progress = goals
            .goal_progress(AccountContext::Personal, date("2025-01-25"))
            .await
            .unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].current, 500.0);
        assert_eq!(progress[0].status, GoalStatus::Active);
    }

    #[tokio::test]
    async fn test_goal_progress_expense_over_limit_fails() {
        let (goals, transactions, account_id) = create_test_services().await;
        goals.create_goal(goal_command(CashFlowKind::Expense, 1000.0)).await.unwrap();

        spend(&transactions, &account_id, -1200.0, "2025-01-10").await;

        let progress = goals
            .goal_progress(AccountContext::Personal, date("2025-03-01"))
            .await
            .unwrap();
        assert_eq!(progress[0].status, GoalStatus::Failed);
        assert_eq!(progress[0].current, 1200.0);
    }

    #[tokio::test]
    async fn test_goal_progress_income_goal_completes() {
        let (goals, transactions, account_id) = create_test_services().await;
        goals.create_goal(goal_command(CashFlowKind::Income, 1000.0)).await.unwrap();

        spend(&transactions, &account_id, 1200.0, "2025-01-10").await;

        let progress = goals
            .goal_progress(AccountContext::Personal, date("2025-01-15"))
            .await
            .unwrap();
        assert_eq!(progress[0].status, GoalStatus::Completed);
    }

    #[tokio::test]
    async fn test_goal_validation() {
        let (goals, _transactions, _account_id) = create_test_services().await;

        let mut empty = goal_command(CashFlowKind::Expense, 100.0);
        empty.description = "  ".to_string();
        assert!(goals.create_goal(empty).await.is_err());

        let mut negative = goal_command(CashFlowKind::Expense, 100.0);
        negative.limit_amount = -1.0;
        assert!(goals.create_goal(negative).await.is_err());

        let mut inverted = goal_command(CashFlowKind::Expense, 100.0);
        inverted.start_date = "2025-02-01".to_string();
        inverted.end_date = "2025-01-01".to_string();
        assert!(goals.create_goal(inverted).await.is_err());
    }
}
