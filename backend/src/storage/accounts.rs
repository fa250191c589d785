use anyhow::{anyhow, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbConnection;
use crate::domain::models::Account;
use shared::AccountContext;

#[derive(Clone)]
pub struct AccountRepository {
    db: DbConnection,
}

impl AccountRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            "INSERT INTO accounts (id, name, bank_name, context, balance, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.bank_name)
        .bind(account.context.as_str())
        .bind(account.balance)
        .bind(account.is_active)
        .bind(&account.created_at)
        .bind(&account.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?")
            .bind(account_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_account(&r)?)),
            None => Ok(None),
        }
    }

    /// List accounts ordered by name, optionally filtered by context
    pub async fn list_accounts(&self, context: Option<AccountContext>) -> Result<Vec<Account>> {
        let rows = match context {
            Some(ctx) => {
                sqlx::query("SELECT * FROM accounts WHERE context = ? ORDER BY name")
                    .bind(ctx.as_str())
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM accounts ORDER BY name")
                    .fetch_all(self.db.pool())
                    .await?
            }
        };

        rows.iter().map(row_to_account).collect()
    }

    pub async fn update_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            "UPDATE accounts SET name = ?, bank_name = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&account.name)
        .bind(&account.bank_name)
        .bind(&account.updated_at)
        .bind(&account.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Deactivate an account (soft delete)
    pub async fn set_account_active(&self, account_id: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(account_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_account(&self, account_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(account_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any ledger transaction references this account
    pub async fn has_ledger_rows(&self, account_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM transactions WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(self.db.pool())
            .await?;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }
}

pub(crate) fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let context: String = row.get("context");
    Ok(Account {
        id: row.get("id"),
        name: row.get("name"),
        bank_name: row.get("bank_name"),
        context: AccountContext::parse(&context).map_err(|e| anyhow!(e))?,
        balance: row.get("balance"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
