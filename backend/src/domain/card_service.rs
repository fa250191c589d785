//! Card service domain logic: card CRUD and the aggregate limit-usage view.

use anyhow::{anyhow, Result};
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::DbConnection;
use crate::domain::commands::cards::{
    CardListResult, CardResult, CreateCardCommand, DeleteCardResult, UpdateCardCommand,
};
use crate::domain::models::Card;
use crate::events::{EventBus, Topic};
use crate::storage::{AccountRepository, CardRepository};
use shared::AccountContext;

const DEFAULT_COLOR: &str = "#6750a4";

#[derive(Clone)]
pub struct CardService {
    card_repository: CardRepository,
    account_repository: AccountRepository,
    events: EventBus,
}

impl CardService {
    pub fn new(db: DbConnection, events: EventBus) -> Self {
        Self {
            card_repository: CardRepository::new(db.clone()),
            account_repository: AccountRepository::new(db),
            events,
        }
    }

    pub async fn create_card(&self, command: CreateCardCommand) -> Result<CardResult> {
        info!("Creating card: {:?}", command);

        if command.name.trim().is_empty() {
            return Err(anyhow!("Card name cannot be empty"));
        }
        if command.credit_limit <= 0.0 {
            return Err(anyhow!("Card limit must be positive"));
        }
        validate_day("closing day", command.closing_day)?;
        validate_day("due day", command.due_day)?;

        // The linked account must exist and be active
        let account = self
            .account_repository
            .get_account(&command.account_id)
            .await?
            .ok_or_else(|| anyhow!("Account not found: {}", command.account_id))?;
        if !account.is_active {
            return Err(anyhow!("Cannot link a card to an inactive account"));
        }

        let now_millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        let now_rfc3339 = chrono::Utc::now().to_rfc3339();

        let card = Card {
            id: shared::Card::generate_id(now_millis),
            name: command.name.trim().to_string(),
            account_id: command.account_id,
            credit_limit: command.credit_limit,
            closing_day: command.closing_day,
            due_day: command.due_day,
            color: command.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            context: command.context,
            is_active: true,
            created_at: now_rfc3339.clone(),
            updated_at: now_rfc3339,
        };

        self.card_repository.store_card(&card).await?;
        self.events.publish(Topic::Cards);

        info!("Successfully created card: {}", card.id);

        Ok(CardResult {
            card,
            success_message: "Card created successfully".to_string(),
        })
    }

    pub async fn get_card(&self, card_id: &str) -> Result<Option<Card>> {
        self.card_repository.get_card(card_id).await
    }

    /// Cards with their card-wide pending totals, for the dashboard list
    pub async fn list_cards(&self, context: Option<AccountContext>) -> Result<CardListResult> {
        let cards = self.card_repository.list_cards_with_usage(context).await?;
        Ok(CardListResult { cards })
    }

    pub async fn update_card(&self, command: UpdateCardCommand) -> Result<CardResult> {
        info!("Updating card: {:?}", command);

        let mut card = self
            .card_repository
            .get_card(&command.card_id)
            .await?
            .ok_or_else(|| anyhow!("Card not found: {}", command.card_id))?;

        if let Some(name) = command.name {
            if name.trim().is_empty() {
                return Err(anyhow!("Card name cannot be empty"));
            }
            card.name = name.trim().to_string();
        }
        if let Some(limit) = command.credit_limit {
            if limit <= 0.0 {
                return Err(anyhow!("Card limit must be positive"));
            }
            card.credit_limit = limit;
        }
        if let Some(day) = command.closing_day {
            validate_day("closing day", day)?;
            card.closing_day = day;
        }
        if let Some(day) = command.due_day {
            validate_day("due day", day)?;
            card.due_day = day;
        }
        if let Some(color) = command.color {
            card.color = color;
        }
        card.updated_at = chrono::Utc::now().to_rfc3339();

        self.card_repository.update_card(&card).await?;
        self.events.publish(Topic::Cards);

        Ok(CardResult {
            card,
            success_message: "Card updated successfully".to_string(),
        })
    }

    /// Delete a card, or deactivate it when line items still reference it.
    pub async fn delete_card(&self, card_id: &str) -> Result<DeleteCardResult> {
        let card = self
            .card_repository
            .get_card(card_id)
            .await?
            .ok_or_else(|| anyhow!("Card not found: {}", card_id))?;

        let result = if self.card_repository.has_line_items(card_id).await? {
            self.card_repository.set_card_active(card_id, false).await?;
            info!("Deactivated card {} (has line items)", card.id);
            DeleteCardResult {
                deleted: false,
                deactivated: true,
                success_message: "Card has invoice items and was deactivated instead".to_string(),
            }
        } else {
            self.card_repository.delete_card(card_id).await?;
            info!("Deleted card {}", card.id);
            DeleteCardResult {
                deleted: true,
                deactivated: false,
                success_message: "Card deleted successfully".to_string(),
            }
        };

        self.events.publish(Topic::Cards);
        Ok(result)
    }
}

fn validate_day(label: &str, day: u32) -> Result<()> {
    // Capped at 28 so every statement month has the configured day
    if !(1..=28).contains(&day) {
        return Err(anyhow!("Card {} must be between 1 and 28", label));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account_service::AccountService;
    use crate::domain::commands::accounts::CreateAccountCommand;
    use crate::domain::commands::invoices::CreatePurchaseCommand;
    use crate::domain::invoice_service::InvoiceService;

    async fn create_test_services() -> (CardService, AccountService, InvoiceService, DbConnection) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let events = EventBus::new();
        let cards = CardService::new(db.clone(), events.clone());
        let accounts = AccountService::new(db.clone(), events.clone());
        let invoices = InvoiceService::new(db.clone(), events);
        (cards, accounts, invoices, db)
    }

    async fn create_test_account(accounts: &AccountService) -> String {
        let result = accounts
            .create_account(CreateAccountCommand {
                name: "Checking".to_string(),
                bank_name: None,
                context: AccountContext::Personal,
                opening_balance: 1000.0,
            })
            .await
            .unwrap();
        result.account.id
    }

    fn card_command(account_id: &str) -> CreateCardCommand {
        CreateCardCommand {
            name: "Platinum".to_string(),
            account_id: account_id.to_string(),
            credit_limit: 5000.0,
            closing_day: 25,
            due_day: 5,
            color: None,
            context: AccountContext::Personal,
        }
    }

    #[tokio::test]
    async fn test_create_card_requires_existing_account() {
        let (cards, _accounts, _invoices, _db) = create_test_services().await;
        let err = cards.create_card(card_command("account::missing::0000")).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_create_card_rejects_invalid_days() {
        let (cards, accounts, _invoices, _db) = create_test_services().await;
        let account_id = create_test_account(&accounts).await;

        let mut command = card_command(&account_id);
        command.closing_day = 31;
        assert!(cards.create_card(command).await.is_err());

        let mut command = card_command(&account_id);
        command.due_day = 0;
        assert!(cards.create_card(command).await.is_err());
    }

    #[tokio::test]
    async fn test_list_cards_reports_limit_usage() {
        let (cards, accounts, invoices, _db) = create_test_services().await;
        let account_id = create_test_account(&accounts).await;
        let card = cards.create_card(card_command(&account_id)).await.unwrap().card;

        invoices
            .create_purchase(CreatePurchaseCommand {
                card_id: card.id.clone(),
                description: "Fridge".to_string(),
                amount: 1200.0,
                first_statement_month: "2025-03".to_string(),
                installments: 3,
                category_id: None,
            })
            .await
            .unwrap();

        let listed = cards.list_cards(Some(AccountContext::Personal)).await.unwrap();
        assert_eq!(listed.cards.len(), 1);
        let entry = &listed.cards[0];
        // All three installments are pending across months
        assert!((entry.limit_used - 1200.0).abs() < 1e-9);
        assert!((entry.limit_available() - 3800.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_delete_card_with_line_items_is_soft() {
        let (cards, accounts, invoices, _db) = create_test_services().await;
        let account_id = create_test_account(&accounts).await;
        let card = cards.create_card(card_command(&account_id)).await.unwrap().card;

        invoices
            .create_purchase(CreatePurchaseCommand {
                card_id: card.id.clone(),
                description: "Dinner".to_string(),
                amount: 90.0,
                first_statement_month: "2025-03".to_string(),
                installments: 1,
                category_id: None,
            })
            .await
            .unwrap();

        let result = cards.delete_card(&card.id).await.unwrap();
        assert!(result.deactivated);
        assert!(!cards.get_card(&card.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_delete_card_without_line_items_is_hard() {
        let (cards, accounts, _invoices, _db) = create_test_services().await;
        let account_id = create_test_account(&accounts).await;
        let card = cards.create_card(card_command(&account_id)).await.unwrap().card;

        let result = cards.delete_card(&card.id).await.unwrap();
        assert!(result.deleted);
        assert!(cards.get_card(&card.id).await.unwrap().is_none());
    }
}
