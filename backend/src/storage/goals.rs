use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::parse_date;
use crate::db::DbConnection;
use crate::domain::models::Goal;
use shared::{AccountContext, CashFlowKind};

#[derive(Clone)]
pub struct GoalRepository {
    db: DbConnection,
}

impl GoalRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_goal(&self, goal: &Goal) -> Result<()> {
        sqlx::query(
            "INSERT INTO goals (id, description, kind, category_id, limit_amount, start_date, end_date, context, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&goal.id)
        .bind(&goal.description)
        .bind(goal.kind.as_str())
        .bind(&goal.category_id)
        .bind(goal.limit_amount)
        .bind(goal.start_date.to_string())
        .bind(goal.end_date.to_string())
        .bind(goal.context.as_str())
        .bind(&goal.created_at)
        .bind(&goal.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_goal(&self, goal_id: &str) -> Result<Option<Goal>> {
        let row = sqlx::query("SELECT * FROM goals WHERE id = ?")
            .bind(goal_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_goal(&r)?)),
            None => Ok(None),
        }
    }

    /// List goals ordered by start date, most recent first
    pub async fn list_goals(&self, context: Option<AccountContext>) -> Result<Vec<Goal>> {
        let rows = match context {
            Some(ctx) => {
                sqlx::query("SELECT * FROM goals WHERE context = ? ORDER BY start_date DESC, id")
                    .bind(ctx.as_str())
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM goals ORDER BY start_date DESC, id")
                    .fetch_all(self.db.pool())
                    .await?
            }
        };

        rows.iter().map(row_to_goal).collect()
    }

    pub async fn update_goal(&self, goal: &Goal) -> Result<()> {
        sqlx::query(
            "UPDATE goals SET description = ?, limit_amount = ?, start_date = ?, end_date = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&goal.description)
        .bind(goal.limit_amount)
        .bind(goal.start_date.to_string())
        .bind(goal.end_date.to_string())
        .bind(&goal.updated_at)
        .bind(&goal.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ?")
            .bind(goal_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_goal(row: &SqliteRow) -> Result<Goal> {
    let kind: String = row.get("kind");
    let context: String = row.get("context");
    let start_date: String = row.get("start_date");
    let end_date: String = row.get("end_date");

    Ok(Goal {
        id: row.get("id"),
        description: row.get("description"),
        kind: CashFlowKind::parse(&kind).map_err(|e| anyhow!(e))?,
        category_id: row.get("category_id"),
        limit_amount: row.get("limit_amount"),
        start_date: parse_date(&start_date)?,
        end_date: parse_date(&end_date)?,
        context: AccountContext::parse(&context).map_err(|e| anyhow!(e))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
