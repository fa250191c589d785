use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbConnection;
use crate::domain::models::card::{Card, CardWithUsage};
use shared::AccountContext;

#[derive(Clone)]
pub struct CardRepository {
    db: DbConnection,
}

impl CardRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_card(&self, card: &Card) -> Result<()> {
        sqlx::query(
            "INSERT INTO cards (id, name, account_id, credit_limit, closing_day, due_day, color, context, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&card.id)
        .bind(&card.name)
        .bind(&card.account_id)
        .bind(card.credit_limit)
        .bind(card.closing_day)
        .bind(card.due_day)
        .bind(&card.color)
        .bind(card.context.as_str())
        .bind(card.is_active)
        .bind(&card.created_at)
        .bind(&card.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_card(&self, card_id: &str) -> Result<Option<Card>> {
        let row = sqlx::query("SELECT * FROM cards WHERE id = ?")
            .bind(card_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_card(&r)?)),
            None => Ok(None),
        }
    }

    /// List cards with their card-wide pending totals in one aggregate query
    /// instead of one query per card.
    pub async fn list_cards_with_usage(
        &self,
        context: Option<AccountContext>,
    ) -> Result<Vec<CardWithUsage>> {
        let base = "SELECT c.*, \
             COALESCE(SUM(CASE WHEN li.status = 'pending' THEN li.amount END), 0.0) AS limit_used \
             FROM cards c \
             LEFT JOIN line_items li ON li.card_id = c.id";

        let rows = match context {
            Some(ctx) => {
                let sql = format!("{} WHERE c.context = ? GROUP BY c.id ORDER BY c.name", base);
                sqlx::query(&sql)
                    .bind(ctx.as_str())
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                let sql = format!("{} GROUP BY c.id ORDER BY c.name", base);
                sqlx::query(&sql).fetch_all(self.db.pool()).await?
            }
        };

        rows.iter()
            .map(|r| {
                let card = row_to_card(r)?;
                let limit_used: f64 = r.get("limit_used");
                Ok(CardWithUsage { card, limit_used })
            })
            .collect()
    }

    pub async fn update_card(&self, card: &Card) -> Result<()> {
        sqlx::query(
            "UPDATE cards SET name = ?, credit_limit = ?, closing_day = ?, due_day = ?, color = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&card.name)
        .bind(card.credit_limit)
        .bind(card.closing_day)
        .bind(card.due_day)
        .bind(&card.color)
        .bind(&card.updated_at)
        .bind(&card.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Deactivate a card (soft delete)
    pub async fn set_card_active(&self, card_id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE cards SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(card_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_card(&self, card_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(card_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any line item references this card
    pub async fn has_line_items(&self, card_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM line_items WHERE card_id = ?")
            .bind(card_id)
            .fetch_one(self.db.pool())
            .await?;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }
}

pub(crate) fn row_to_card(row: &SqliteRow) -> Result<Card> {
    let context: String = row.get("context");
    Ok(Card {
        id: row.get("id"),
        name: row.get("name"),
        account_id: row.get("account_id"),
        credit_limit: row.get("credit_limit"),
        closing_day: row.get("closing_day"),
        due_day: row.get("due_day"),
        color: row.get("color"),
        context: AccountContext::parse(&context).map_err(|e| anyhow!(e))?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
