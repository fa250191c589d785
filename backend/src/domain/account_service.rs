//! Account service domain logic.
//!
//! Account balances are materialized values: they change only when the
//! ledger repository or the payment flows write them, always inside the
//! same database transaction as the ledger mutation. This service never
//! computes balance deltas on its own.

use anyhow::{anyhow, Result};
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::DbConnection;
use crate::domain::commands::accounts::{
    AccountResult, CreateAccountCommand, DeleteAccountResult, UpdateAccountCommand,
};
use crate::domain::models::Account;
use crate::events::{EventBus, Topic};
use crate::storage::AccountRepository;
use shared::AccountContext;

#[derive(Clone)]
pub struct AccountService {
    account_repository: AccountRepository,
    events: EventBus,
}

impl AccountService {
    pub fn new(db: DbConnection, events: EventBus) -> Self {
        Self {
            account_repository: AccountRepository::new(db),
            events,
        }
    }

    pub async fn create_account(&self, command: CreateAccountCommand) -> Result<AccountResult> {
        info!("Creating account: {:?}", command);

        if command.name.trim().is_empty() {
            return Err(anyhow!("Account name cannot be empty"));
        }
        if command.opening_balance < 0.0 {
            return Err(anyhow!("Opening balance cannot be negative"));
        }

        let now_millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        let now_rfc3339 = chrono::Utc::now().to_rfc3339();

        let account = Account {
            id: shared::Account::generate_id(now_millis),
            name: command.name.trim().to_string(),
            bank_name: command.bank_name,
            context: command.context,
            balance: command.opening_balance,
            is_active: true,
            created_at: now_rfc3339.clone(),
            updated_at: now_rfc3339,
        };

        self.account_repository.store_account(&account).await?;
        self.events.publish(Topic::Accounts);

        info!("Successfully created account: {}", account.id);

        Ok(AccountResult {
            account,
            success_message: "Account created successfully".to_string(),
        })
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Option<Account>> {
        self.account_repository.get_account(account_id).await
    }

    pub async fn list_accounts(&self, context: Option<AccountContext>) -> Result<Vec<Account>> {
        self.account_repository.list_accounts(context).await
    }

    pub async fn update_account(&self, command: UpdateAccountCommand) -> Result<AccountResult> {
        info!("Updating account: {:?}", command);

        let mut account = self
            .account_repository
            .get_account(&command.account_id)
            .await?
            .ok_or_else(|| anyhow!("Account not found: {}", command.account_id))?;

        if let Some(name) = command.name {
            if name.trim().is_empty() {
                return Err(anyhow!("Account name cannot be empty"));
            }
            account.name = name.trim().to_string();
        }
        if let Some(bank_name) = command.bank_name {
            account.bank_name = Some(bank_name);
        }
        account.updated_at = chrono::Utc::now().to_rfc3339();

        self.account_repository.update_account(&account).await?;
        self.events.publish(Topic::Accounts);

        Ok(AccountResult {
            account,
            success_message: "Account updated successfully".to_string(),
        })
    }

    /// Delete an account, or deactivate it when ledger transactions still
    /// reference it.
    pub async fn delete_account(&self, account_id: &str) -> Result<DeleteAccountResult> {
        let account = self
            .account_repository
            .get_account(account_id)
            .await?
            .ok_or_else(|| anyhow!("Account not found: {}", account_id))?;

        let result = if self.account_repository.has_ledger_rows(account_id).await? {
            self.account_repository
                .set_account_active(account_id, false)
                .await?;
            info!("Deactivated account {} (has ledger history)", account.id);
            DeleteAccountResult {
                deleted: false,
                deactivated: true,
                success_message: "Account has transactions and was deactivated instead".to_string(),
            }
        } else {
            self.account_repository.delete_account(account_id).await?;
            info!("Deleted account {}", account.id);
            DeleteAccountResult {
                deleted: true,
                deactivated: false,
                success_message: "Account deleted successfully".to_string(),
            }
        };

        self.events.publish(Topic::Accounts);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::LedgerTransaction;
    use crate::storage::LedgerRepository;
    use chrono::NaiveDate;
    use shared::TransactionKind;

    async fn create_test_service() -> (AccountService, DbConnection) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let service = AccountService::new(db.clone(), EventBus::new());
        (service, db)
    }

    fn create_command(name: &str, opening_balance: f64) -> CreateAccountCommand {
        CreateAccountCommand {
            name: name.to_string(),
            bank_name: Some("Banco Azul".to_string()),
            context: AccountContext::Personal,
            opening_balance,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let (service, _db) = create_test_service().await;

        let result = service
            .create_account(create_command("Checking", 1000.0))
            .await
            .unwrap();
        assert_eq!(result.account.name, "Checking");
        assert_eq!(result.account.balance, 1000.0);
        assert!(result.account.is_active);

        let fetched = service.get_account(&result.account.id).await.unwrap().unwrap();
        assert_eq!(fetched, result.account);
    }

    #[tokio::test]
    async fn test_create_account_rejects_empty_name() {
        let (service, _db) = create_test_service().await;
        let err = service.create_account(create_command("   ", 0.0)).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_list_accounts_filters_by_context() {
        let (service, _db) = create_test_service().await;

        service.create_account(create_command("Personal account", 0.0)).await.unwrap();
        let mut business = create_command("Business account", 0.0);
        business.context = AccountContext::Business;
        service.create_account(business).await.unwrap();

        let personal = service
            .list_accounts(Some(AccountContext::Personal))
            .await
            .unwrap();
        assert_eq!(personal.len(), 1);
        assert_eq!(personal[0].name, "Personal account");

        let all = service.list_accounts(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_account_without_history_is_hard() {
        let (service, _db) = create_test_service().await;
        let created = service.create_account(create_command("Temp", 0.0)).await.unwrap();

        let result = service.delete_account(&created.account.id).await.unwrap();
        assert!(result.deleted);
        assert!(!result.deactivated);
        assert!(service.get_account(&created.account.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_account_with_history_is_soft() {
        let (service, db) = create_test_service().await;
        let created = service.create_account(create_command("Main", 100.0)).await.unwrap();

        // Record a ledger transaction against the account
        let ledger = LedgerRepository::new(db);
        let entry = LedgerTransaction {
            id: shared::LedgerTransaction::generate_id(TransactionKind::Income, 1),
            account_id: created.account.id.clone(),
            description: "Salary".to_string(),
            amount: 50.0,
            kind: TransactionKind::Income,
            category_id: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            context: AccountContext::Personal,
            card_id: None,
            statement_month: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        ledger.record_transaction(&entry).await.unwrap();

        let result = service.delete_account(&created.account.id).await.unwrap();
        assert!(!result.deleted);
        assert!(result.deactivated);

        let fetched = service.get_account(&created.account.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
        // Balance reflects the recorded transaction, maintained by the ledger
        assert_eq!(fetched.balance, 150.0);
    }
}
