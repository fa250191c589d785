//! Invoice payment and reversal.
//!
//! Both flows run as a single database transaction: marking items paid,
//! adjusting the account balance and writing (or removing) the ledger row
//! either all happen or none do. The reversal locates payment rows by
//! `(card_id, statement_month, kind)`, an explicit key written at payment
//! time, and verifies that the paid items still match the recorded
//! payments before undoing anything.

use chrono::NaiveDate;
use log::{info, warn};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::db::DbConnection;
use crate::domain::commands::payments::{
    PayInvoiceCommand, PaymentReceipt, ReversalReceipt, ReversePaymentCommand,
};
use crate::domain::models::{Account, Card, LedgerTransaction, LineItem};
use crate::events::EventBus;
use crate::storage::accounts::row_to_account;
use crate::storage::cards::row_to_card;
use crate::storage::ledger::row_to_transaction;
use crate::storage::line_items::row_to_line_item;
use shared::{format_brl, StatementMonth, TransactionKind};
use sqlx::Row;

/// Business failures of the payment and reversal procedures. These are
/// reported verbatim to the caller; storage failures stay generic.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Account is inactive: {0}")]
    AccountInactive(String),
    #[error("Invalid payment date: {0}")]
    InvalidDate(String),
    #[error("{0}")]
    InvalidMonth(String),
    #[error("No pending items to pay for {month}")]
    NothingToPay { month: String },
    #[error("Line item cannot be paid: {0}")]
    ItemNotPayable(String),
    #[error("Insufficient funds: payment of R$ {needed:.2} exceeds balance of R$ {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },
    #[error("No invoice payment found for {month}")]
    PaymentNotFound { month: String },
    #[error("Paid items total R$ {items_total:.2} does not match recorded payments total R$ {payments_total:.2}")]
    AmountMismatch { items_total: f64, payments_total: f64 },
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    /// Whether this is a business error whose message should be shown
    /// verbatim, as opposed to an unexpected storage failure.
    pub fn is_business_error(&self) -> bool {
        !matches!(self, PaymentError::Storage(_) | PaymentError::Internal(_))
    }
}

#[derive(Clone)]
pub struct PaymentService {
    db: DbConnection,
    events: EventBus,
}

impl PaymentService {
    pub fn new(db: DbConnection, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Pay a card invoice. `item_ids = None` pays every pending item of the
    /// statement month (full payment); otherwise only the listed items
    /// (partial payment). Atomic: items flip to paid, the account is
    /// debited and one invoice-payment ledger row is written, or nothing
    /// happens at all.
    pub async fn pay_invoice(&self, command: PayInvoiceCommand) -> Result<PaymentReceipt, PaymentError> {
        info!(
            "Paying invoice: card={} month={} mode={}",
            command.card_id,
            command.statement_month,
            if command.item_ids.is_some() { "partial" } else { "full" }
        );

        StatementMonth::parse(&command.statement_month).map_err(PaymentError::InvalidMonth)?;
        let payment_date = NaiveDate::parse_from_str(&command.payment_date, "%Y-%m-%d")
            .map_err(|_| PaymentError::InvalidDate(command.payment_date.clone()))?;

        let mut tx = self.db.pool().begin().await?;

        let card = fetch_card(&mut tx, &command.card_id).await?;
        let account = fetch_account(&mut tx, &command.account_id).await?;
        if !account.is_active {
            return Err(PaymentError::AccountInactive(account.id));
        }

        let items = match &command.item_ids {
            None => fetch_pending_items(&mut tx, &card.id, &command.statement_month).await?,
            Some(ids) => {
                fetch_selected_items(&mut tx, &card.id, &command.statement_month, ids).await?
            }
        };
        if items.is_empty() {
            return Err(PaymentError::NothingToPay {
                month: command.statement_month.clone(),
            });
        }

        let total: f64 = items.iter().map(|i| i.amount).sum();
        if account.balance < total {
            return Err(PaymentError::InsufficientFunds {
                needed: total,
                available: account.balance,
            });
        }

        // Flip the selected items to paid
        let item_ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let placeholders = vec!["?"; item_ids.len()].join(", ");
        let sql = format!(
            "UPDATE line_items SET status = 'paid', paid_at = ? WHERE id IN ({})",
            placeholders
        );
        let mut update = sqlx::query(&sql).bind(payment_date.to_string());
        for id in &item_ids {
            update = update.bind(*id);
        }
        update.execute(&mut *tx).await?;

        // Debit the paying account
        let now_rfc3339 = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE accounts SET balance = balance - ?, updated_at = ? WHERE id = ?")
            .bind(total)
            .bind(&now_rfc3339)
            .bind(&account.id)
            .execute(&mut *tx)
            .await?;

        // Record the payment in the ledger, keyed to the card and month so
        // the reversal flow never has to guess
        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PaymentError::Internal(e.into()))?
            .as_millis() as u64;
        let transaction_id =
            shared::LedgerTransaction::generate_id(TransactionKind::InvoicePayment, now_millis);
        sqlx::query(
            "INSERT INTO transactions (id, account_id, description, amount, kind, category_id, date, context, card_id, statement_month, created_at) \
             VALUES (?, ?, ?, ?, 'invoice_payment', NULL, ?, ?, ?, ?, ?)",
        )
        .bind(&transaction_id)
        .bind(&account.id)
        .bind(format!("Invoice payment {} ({})", card.name, command.statement_month))
        .bind(-total)
        .bind(payment_date.to_string())
        .bind(command.context.as_str())
        .bind(&card.id)
        .bind(&command.statement_month)
        .bind(&now_rfc3339)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query("SELECT balance FROM accounts WHERE id = ?")
            .bind(&account.id)
            .fetch_one(&mut *tx)
            .await?;
        let new_balance: f64 = row.get("balance");

        tx.commit().await?;

        // Every open view re-fetches: card usage, account balance, the
        // ledger and the invoice items all changed at once
        self.events.publish_all();

        info!(
            "Paid {} item(s) totalling {} from account {}",
            items.len(),
            format_brl(total),
            account.id
        );

        Ok(PaymentReceipt {
            transaction_id,
            paid_count: items.len(),
            total_paid: total,
            new_balance,
        })
    }

    /// Undo every payment recorded for a card's statement month: paid items
    /// go back to pending, the payment ledger rows are deleted and each
    /// debited account is credited back, all in one database transaction.
    pub async fn reverse_payment(
        &self,
        command: ReversePaymentCommand,
    ) -> Result<ReversalReceipt, PaymentError> {
        info!(
            "Reversing invoice payment: card={} month={}",
            command.card_id, command.statement_month
        );

        StatementMonth::parse(&command.statement_month).map_err(PaymentError::InvalidMonth)?;

        let mut tx = self.db.pool().begin().await?;

        fetch_card(&mut tx, &command.card_id).await?;

        let payment_rows = sqlx::query(
            "SELECT * FROM transactions \
             WHERE kind = 'invoice_payment' AND card_id = ? AND statement_month = ? \
             ORDER BY created_at",
        )
        .bind(&command.card_id)
        .bind(&command.statement_month)
        .fetch_all(&mut *tx)
        .await?;
        if payment_rows.is_empty() {
            return Err(PaymentError::PaymentNotFound {
                month: command.statement_month.clone(),
            });
        }
        let payments: Vec<LedgerTransaction> = payment_rows
            .iter()
            .map(row_to_transaction)
            .collect::<Result<_, _>>()?;

        let paid_rows = sqlx::query(
            "SELECT * FROM line_items \
             WHERE card_id = ? AND statement_month = ? AND status = 'paid'",
        )
        .bind(&command.card_id)
        .bind(&command.statement_month)
        .fetch_all(&mut *tx)
        .await?;
        let paid_items: Vec<LineItem> = paid_rows
            .iter()
            .map(row_to_line_item)
            .collect::<Result<_, _>>()?;

        // The recorded payments must still account for exactly the items
        // marked paid; refuse to undo a month whose state has drifted
        let items_total: f64 = paid_items.iter().map(|i| i.amount).sum();
        let payments_total: f64 = payments.iter().map(|p| -p.amount).sum();
        if (items_total - payments_total).abs() > 0.005 {
            warn!(
                "Reversal aborted: items total {} != payments total {}",
                items_total, payments_total
            );
            return Err(PaymentError::AmountMismatch {
                items_total,
                payments_total,
            });
        }

        sqlx::query(
            "UPDATE line_items SET status = 'pending', paid_at = NULL \
             WHERE card_id = ? AND statement_month = ? AND status = 'paid'",
        )
        .bind(&command.card_id)
        .bind(&command.statement_month)
        .execute(&mut *tx)
        .await?;

        let now_rfc3339 = chrono::Utc::now().to_rfc3339();
        for payment in &payments {
            sqlx::query("DELETE FROM transactions WHERE id = ?")
                .bind(&payment.id)
                .execute(&mut *tx)
                .await?;
            // Payment amounts are negative; subtracting credits the account
            sqlx::query("UPDATE accounts SET balance = balance - ?, updated_at = ? WHERE id = ?")
                .bind(payment.amount)
                .bind(&now_rfc3339)
                .bind(&payment.account_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        // One broadcast per reversal; subscribers re-fetch exactly once
        self.events.publish_all();

        info!(
            "Reversed {} payment(s) totalling {} on card {}",
            payments.len(),
            format_brl(payments_total),
            command.card_id
        );

        Ok(ReversalReceipt {
            restored_count: paid_items.len(),
            total_restored: payments_total,
        })
    }
}

async fn fetch_card(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, card_id: &str) -> Result<Card, PaymentError> {
    let row = sqlx::query("SELECT * FROM cards WHERE id = ?")
        .bind(card_id)
        .fetch_optional(&mut **tx)
        .await?;
    match row {
        Some(r) => Ok(row_to_card(&r)?),
        None => Err(PaymentError::CardNotFound(card_id.to_string())),
    }
}

async fn fetch_account(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    account_id: &str,
) -> Result<Account, PaymentError> {
    let row = sqlx::query("SELECT * FROM accounts WHERE id = ?")
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?;
    match row {
        Some(r) => Ok(row_to_account(&r)?),
        None => Err(PaymentError::AccountNotFound(account_id.to_string())),
    }
}

async fn fetch_pending_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    card_id: &str,
    statement_month: &str,
) -> Result<Vec<LineItem>, PaymentError> {
    let rows = sqlx::query(
        "SELECT * FROM line_items \
         WHERE card_id = ? AND statement_month = ? AND status = 'pending' \
         ORDER BY due_date, id",
    )
    .bind(card_id)
    .bind(statement_month)
    .fetch_all(&mut **tx)
    .await?;

    let items = rows
        .iter()
        .map(row_to_line_item)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Resolve an explicit item-id selection, requiring every item to exist,
/// belong to the card and month, and still be pending.
async fn fetch_selected_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    card_id: &str,
    statement_month: &str,
    item_ids: &[String],
) -> Result<Vec<LineItem>, PaymentError> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::with_capacity(item_ids.len());
    for item_id in item_ids {
        let row = sqlx::query("SELECT * FROM line_items WHERE id = ?")
            .bind(item_id)
            .fetch_optional(&mut **tx)
            .await?;
        let item = match row {
            Some(r) => row_to_line_item(&r)?,
            None => return Err(PaymentError::ItemNotPayable(item_id.clone())),
        };
        if item.card_id != card_id
            || item.statement_month != statement_month
            || item.status != shared::LineItemStatus::Pending
        {
            return Err(PaymentError::ItemNotPayable(item_id.clone()));
        }
        items.push(item);
    }
    Ok(items)
}
