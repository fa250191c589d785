use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::parse_date;
use crate::db::DbConnection;
use crate::domain::models::LineItem;
use shared::LineItemStatus;

#[derive(Clone)]
pub struct LineItemRepository {
    db: DbConnection,
}

impl LineItemRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_line_item(&self, item: &LineItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO line_items (id, card_id, statement_month, description, amount, due_date, status, paid_at, \
             installment_number, installment_total, original_amount, category_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.card_id)
        .bind(&item.statement_month)
        .bind(&item.description)
        .bind(item.amount)
        .bind(item.due_date.to_string())
        .bind(item.status.as_str())
        .bind(item.paid_at.map(|d| d.to_string()))
        .bind(item.installment_number)
        .bind(item.installment_total)
        .bind(item.original_amount)
        .bind(&item.category_id)
        .bind(&item.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Store the rows of one purchase. All-or-nothing: a failure on any
    /// installment leaves none of them behind.
    pub async fn store_line_items(&self, items: &[LineItem]) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        for item in items {
            sqlx::query(
                "INSERT INTO line_items (id, card_id, statement_month, description, amount, due_date, status, paid_at, \
                 installment_number, installment_total, original_amount, category_id, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&item.id)
            .bind(&item.card_id)
            .bind(&item.statement_month)
            .bind(&item.description)
            .bind(item.amount)
            .bind(item.due_date.to_string())
            .bind(item.status.as_str())
            .bind(item.paid_at.map(|d| d.to_string()))
            .bind(item.installment_number)
            .bind(item.installment_total)
            .bind(item.original_amount)
            .bind(&item.category_id)
            .bind(&item.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_line_item(&self, item_id: &str) -> Result<Option<LineItem>> {
        let row = sqlx::query("SELECT * FROM line_items WHERE id = ?")
            .bind(item_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_line_item(&r)?)),
            None => Ok(None),
        }
    }

    /// All line items of one card's statement month, ordered by due date
    pub async fn list_for_statement(
        &self,
        card_id: &str,
        statement_month: &str,
    ) -> Result<Vec<LineItem>> {
        let rows = sqlx::query(
            "SELECT * FROM line_items WHERE card_id = ? AND statement_month = ? \
             ORDER BY due_date, id",
        )
        .bind(card_id)
        .bind(statement_month)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_line_item).collect()
    }

    /// Card-wide pending total, across all statement months
    pub async fn pending_total_for_card(&self, card_id: &str) -> Result<f64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0.0) AS total FROM line_items \
             WHERE card_id = ? AND status = 'pending'",
        )
        .bind(card_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(row.get("total"))
    }

    /// Cancel a pending line item. Returns false when the item does not
    /// exist or is not pending.
    pub async fn cancel_line_item(&self, item_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE line_items SET status = 'canceled' WHERE id = ? AND status = 'pending'",
        )
        .bind(item_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn row_to_line_item(row: &SqliteRow) -> Result<LineItem> {
    let status: String = row.get("status");
    let due_date: String = row.get("due_date");
    let paid_at: Option<String> = row.get("paid_at");
    let installment_number: Option<i64> = row.get("installment_number");
    let installment_total: Option<i64> = row.get("installment_total");

    Ok(LineItem {
        id: row.get("id"),
        card_id: row.get("card_id"),
        statement_month: row.get("statement_month"),
        description: row.get("description"),
        amount: row.get("amount"),
        due_date: parse_date(&due_date)?,
        status: LineItemStatus::parse(&status).map_err(|e| anyhow!(e))?,
        paid_at: paid_at.as_deref().map(parse_date).transpose()?,
        installment_number: installment_number.map(|n| n as u32),
        installment_total: installment_total.map(|n| n as u32),
        original_amount: row.get("original_amount"),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
    })
}
