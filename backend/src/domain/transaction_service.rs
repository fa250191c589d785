//! Ledger transaction service domain logic.

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::DbConnection;
use crate::domain::commands::transactions::{
    CreateTransactionCommand, CreateTransactionResult, DeleteTransactionResult, PaginationInfo,
    TransactionListQuery, TransactionListResult,
};
use crate::domain::models::LedgerTransaction;
use crate::events::{EventBus, Topic};
use crate::storage::{AccountRepository, CategoryRepository, LedgerRepository};
use shared::TransactionKind;

#[derive(Clone)]
pub struct TransactionService {
    ledger_repository: LedgerRepository,
    account_repository: AccountRepository,
    category_repository: CategoryRepository,
    events: EventBus,
}

impl TransactionService {
    pub fn new(db: DbConnection, events: EventBus) -> Self {
        Self {
            ledger_repository: LedgerRepository::new(db.clone()),
            account_repository: AccountRepository::new(db.clone()),
            category_repository: CategoryRepository::new(db),
            events,
        }
    }

    /// Record an income or expense. The kind is derived from the amount's
    /// sign; the account balance is adjusted in the same database
    /// transaction as the ledger insert.
    pub async fn create_transaction(
        &self,
        command: CreateTransactionCommand,
    ) -> Result<CreateTransactionResult> {
        info!("Creating transaction: {:?}", command);

        if command.description.is_empty() || command.description.len() > 256 {
            return Err(anyhow!("Description must be between 1 and 256 characters"));
        }
        if command.amount == 0.0 {
            return Err(anyhow!("Transaction amount cannot be zero"));
        }

        let date = match &command.date {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| anyhow!("Invalid transaction date: {}", s))?,
            None => Local::now().date_naive(),
        };

        let account = self
            .account_repository
            .get_account(&command.account_id)
            .await?
            .ok_or_else(|| anyhow!("Account not found: {}", command.account_id))?;
        if !account.is_active {
            return Err(anyhow!("Cannot record transactions on an inactive account"));
        }

        if let Some(category_id) = &command.category_id {
            self.category_repository
                .get_category(category_id)
                .await?
                .ok_or_else(|| anyhow!("Category not found: {}", category_id))?;
        }

        let kind = if command.amount >= 0.0 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        };

        let now_millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        let transaction = LedgerTransaction {
            id: shared::LedgerTransaction::generate_id(kind, now_millis),
            account_id: account.id,
            description: command.description,
            amount: command.amount,
            kind,
            category_id: command.category_id,
            date,
            context: command.context,
            card_id: None,
            statement_month: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let new_balance = self.ledger_repository.record_transaction(&transaction).await?;

        self.events.publish(Topic::Transactions);
        self.events.publish(Topic::Accounts);

        info!("Successfully created transaction: {}", transaction.id);

        Ok(CreateTransactionResult {
            transaction,
            new_balance,
            success_message: "Transaction recorded successfully".to_string(),
        })
    }

    /// List transactions newest first with cursor pagination.
    pub async fn list_transactions(&self, query: TransactionListQuery) -> Result<TransactionListResult> {
        let limit = query.limit.unwrap_or(20).min(100) as usize;

        let mut transactions = self
            .ledger_repository
            .list_transactions(
                query.context,
                query.account_id.as_deref(),
                query.month.as_deref(),
                None,
            )
            .await?;

        // Apply the cursor by position; IDs are unique so the cursor is
        // simply "everything after this row"
        if let Some(after_id) = &query.after {
            if let Some(idx) = transactions.iter().position(|t| &t.id == after_id) {
                transactions = transactions.into_iter().skip(idx + 1).collect();
            }
        }

        let has_more = transactions.len() > limit;
        transactions.truncate(limit);

        let next_cursor = if has_more {
            transactions.last().map(|t| t.id.clone())
        } else {
            None
        };

        Ok(TransactionListResult {
            transactions,
            pagination: PaginationInfo { has_more, next_cursor },
        })
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Option<LedgerTransaction>> {
        self.ledger_repository.get_transaction(transaction_id).await
    }

    /// Delete a transaction and restore the account balance. Invoice
    /// payments are refused; those are undone through the reversal flow.
    pub async fn delete_transaction(&self, transaction_id: &str) -> Result<DeleteTransactionResult> {
        let deleted = self.ledger_repository.delete_transaction(transaction_id).await?;

        match deleted {
            Some(transaction) => {
                self.events.publish(Topic::Transactions);
                self.events.publish(Topic::Accounts);
                info!("Deleted transaction {}", transaction.id);
                Ok(DeleteTransactionResult {
                    deleted: true,
                    success_message: "Transaction deleted successfully".to_string(),
                })
            }
            None => Ok(DeleteTransactionResult {
                deleted: false,
                success_message: "Transaction not found".to_string(),
            }),
        }
    }
}
