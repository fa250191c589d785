use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbConnection;
use crate::domain::models::Category;
use shared::{AccountContext, CashFlowKind};

#[derive(Clone)]
pub struct CategoryRepository {
    db: DbConnection,
}

impl CategoryRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, kind, context, is_active, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.kind.as_str())
        .bind(category.context.as_str())
        .bind(category.is_active)
        .bind(&category.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_category(&self, category_id: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = ?")
            .bind(category_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_category(&r)?)),
            None => Ok(None),
        }
    }

    pub async fn list_categories(&self, context: Option<AccountContext>) -> Result<Vec<Category>> {
        let rows = match context {
            Some(ctx) => {
                sqlx::query("SELECT * FROM categories WHERE context = ? ORDER BY name")
                    .bind(ctx.as_str())
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM categories ORDER BY name")
                    .fetch_all(self.db.pool())
                    .await?
            }
        };

        rows.iter().map(row_to_category).collect()
    }

    /// Whether any ledger transaction or line item references this category
    pub async fn is_referenced(&self, category_id: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM transactions WHERE category_id = ?) + \
                    (SELECT COUNT(*) FROM line_items WHERE category_id = ?) AS n",
        )
        .bind(category_id)
        .bind(category_id)
        .fetch_one(self.db.pool())
        .await?;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }

    pub async fn set_category_active(&self, category_id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE categories SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(category_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_category(&self, category_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(category_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_category(row: &SqliteRow) -> Result<Category> {
    let kind: String = row.get("kind");
    let context: String = row.get("context");

    Ok(Category {
        id: row.get("id"),
        name: row.get("name"),
        kind: CashFlowKind::parse(&kind).map_err(|e| anyhow!(e))?,
        context: AccountContext::parse(&context).map_err(|e| anyhow!(e))?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}
