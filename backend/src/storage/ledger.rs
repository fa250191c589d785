use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::parse_date;
use crate::db::DbConnection;
use crate::domain::models::LedgerTransaction;
use shared::{AccountContext, TransactionKind};

#[derive(Clone)]
pub struct LedgerRepository {
    db: DbConnection,
}

impl LedgerRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a ledger transaction and adjust the owning account's
    /// materialized balance in the same database transaction. Returns the
    /// post-write balance.
    pub async fn record_transaction(&self, entry: &LedgerTransaction) -> Result<f64> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            "INSERT INTO transactions (id, account_id, description, amount, kind, category_id, date, context, card_id, statement_month, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.account_id)
        .bind(&entry.description)
        .bind(entry.amount)
        .bind(entry.kind.as_str())
        .bind(&entry.category_id)
        .bind(entry.date.to_string())
        .bind(entry.context.as_str())
        .bind(&entry.card_id)
        .bind(&entry.statement_month)
        .bind(&entry.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE accounts SET balance = balance + ?, updated_at = ? WHERE id = ?")
            .bind(entry.amount)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(&entry.account_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT balance FROM accounts WHERE id = ?")
            .bind(&entry.account_id)
            .fetch_one(&mut *tx)
            .await?;
        let new_balance: f64 = row.get("balance");

        tx.commit().await?;
        Ok(new_balance)
    }

    /// Delete a ledger transaction and restore the account balance in the
    /// same database transaction. Invoice-payment rows are refused here;
    /// they can only be removed through the reversal flow.
    pub async fn delete_transaction(&self, transaction_id: &str) -> Result<Option<LedgerTransaction>> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query("SELECT * FROM transactions WHERE id = ?")
            .bind(transaction_id)
            .fetch_optional(&mut *tx)
            .await?;

        let entry = match row {
            Some(r) => row_to_transaction(&r)?,
            None => return Ok(None),
        };

        if entry.kind == TransactionKind::InvoicePayment {
            return Err(anyhow!(
                "Invoice payments cannot be deleted directly; reverse the invoice payment instead"
            ));
        }

        sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE accounts SET balance = balance - ?, updated_at = ? WHERE id = ?")
            .bind(entry.amount)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(&entry.account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(entry))
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Option<LedgerTransaction>> {
        let row = sqlx::query("SELECT * FROM transactions WHERE id = ?")
            .bind(transaction_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_transaction(&r)?)),
            None => Ok(None),
        }
    }

    /// List transactions newest first, with optional filters. `limit` is
    /// applied after the filters; the caller handles cursor pagination.
    pub async fn list_transactions(
        &self,
        context: Option<AccountContext>,
        account_id: Option<&str>,
        month: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<LedgerTransaction>> {
        let mut sql = String::from("SELECT * FROM transactions WHERE 1 = 1");
        if context.is_some() {
            sql.push_str(" AND context = ?");
        }
        if account_id.is_some() {
            sql.push_str(" AND account_id = ?");
        }
        if month.is_some() {
            sql.push_str(" AND substr(date, 1, 7) = ?");
        }
        sql.push_str(" ORDER BY date DESC, created_at DESC, id DESC");
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(ctx) = context {
            query = query.bind(ctx.as_str());
        }
        if let Some(account) = account_id {
            query = query.bind(account);
        }
        if let Some(m) = month {
            query = query.bind(m);
        }
        if let Some(l) = limit {
            query = query.bind(l);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_transaction).collect()
    }

    /// All transactions within a date range (inclusive), used by the goal
    /// progress calculator to aggregate every goal from one result set.
    pub async fn list_in_range(
        &self,
        context: AccountContext,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE context = ? AND date >= ? AND date <= ? \
             ORDER BY date, created_at",
        )
        .bind(context.as_str())
        .bind(start_date)
        .bind(end_date)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Payment rows of one card's statement month, newest first
    pub async fn find_invoice_payments(
        &self,
        card_id: &str,
        statement_month: &str,
    ) -> Result<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM transactions \
             WHERE kind = 'invoice_payment' AND card_id = ? AND statement_month = ? \
             ORDER BY created_at DESC",
        )
        .bind(card_id)
        .bind(statement_month)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }
}

pub(crate) fn row_to_transaction(row: &SqliteRow) -> Result<LedgerTransaction> {
    let kind: String = row.get("kind");
    let context: String = row.get("context");
    let date: String = row.get("date");

    Ok(LedgerTransaction {
        id: row.get("id"),
        account_id: row.get("account_id"),
        description: row.get("description"),
        amount: row.get("amount"),
        kind: TransactionKind::parse(&kind).map_err(|e| anyhow!(e))?,
        category_id: row.get("category_id"),
        date: parse_date(&date)?,
        context: AccountContext::parse(&context).map_err(|e| anyhow!(e))?,
        card_id: row.get("card_id"),
        statement_month: row.get("statement_month"),
        created_at: row.get("created_at"),
    })
}
