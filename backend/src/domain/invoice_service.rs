//! Invoice reader and purchase registration.
//!
//! The reader derives a statement month's invoice from stored line items.
//! It is read-only and safe to call repeatedly; every dashboard view
//! re-invokes it after a refresh event.

use anyhow::{anyhow, Result};
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::DbConnection;
use crate::domain::commands::invoices::{
    CreatePurchaseCommand, CreatePurchaseResult, InvoiceSummary,
};
use crate::domain::models::LineItem;
use crate::events::{EventBus, Topic};
use crate::storage::{CardRepository, CategoryRepository, LineItemRepository};
use shared::{LineItemStatus, StatementMonth};

const MAX_INSTALLMENTS: u32 = 48;

#[derive(Clone)]
pub struct InvoiceService {
    line_item_repository: LineItemRepository,
    card_repository: CardRepository,
    category_repository: CategoryRepository,
    events: EventBus,
}

impl InvoiceService {
    pub fn new(db: DbConnection, events: EventBus) -> Self {
        Self {
            line_item_repository: LineItemRepository::new(db.clone()),
            card_repository: CardRepository::new(db.clone()),
            category_repository: CategoryRepository::new(db),
            events,
        }
    }

    /// Derive the invoice for one card and statement month.
    ///
    /// `total` sums every non-canceled item of the month; `limit_used` is
    /// the card-wide pending total (what actually counts against the limit),
    /// so an unpaid installment in a future month still reduces
    /// `limit_available`.
    pub async fn get_invoice(&self, card_id: &str, statement_month: &str) -> Result<InvoiceSummary> {
        StatementMonth::parse(statement_month).map_err(|e| anyhow!(e))?;

        let card = self
            .card_repository
            .get_card(card_id)
            .await?
            .ok_or_else(|| anyhow!("Card not found: {}", card_id))?;

        let items = self
            .line_item_repository
            .list_for_statement(card_id, statement_month)
            .await?;

        let billed: Vec<&LineItem> = items
            .iter()
            .filter(|i| i.status != LineItemStatus::Canceled)
            .collect();

        let total: f64 = billed.iter().map(|i| i.amount).sum();
        let paid: Vec<&&LineItem> = billed
            .iter()
            .filter(|i| i.status == LineItemStatus::Paid)
            .collect();
        let total_paid: f64 = paid.iter().map(|i| i.amount).sum();
        let paid_count = paid.len();
        let is_paid = !billed.is_empty() && paid_count == billed.len();
        let payment_date = paid.iter().filter_map(|i| i.paid_at).max();

        let limit_used = self.line_item_repository.pending_total_for_card(card_id).await?;
        let limit_available = card.credit_limit - limit_used;

        Ok(InvoiceSummary {
            card_id: card_id.to_string(),
            statement_month: statement_month.to_string(),
            items,
            total,
            limit_used,
            limit_available,
            is_paid,
            total_paid,
            paid_count,
            payment_date,
        })
    }

    /// Register a card purchase, splitting it into one pending line item per
    /// installment. Amounts are split in whole cents with the remainder on
    /// the first installment, so the installments always sum to the
    /// original amount.
    pub async fn create_purchase(&self, command: CreatePurchaseCommand) -> Result<CreatePurchaseResult> {
        info!("Creating purchase: {:?}", command);

        if command.description.trim().is_empty() || command.description.len() > 256 {
            return Err(anyhow!("Description must be between 1 and 256 characters"));
        }
        if command.amount <= 0.0 {
            return Err(anyhow!("Purchase amount must be positive"));
        }
        if command.installments == 0 || command.installments > MAX_INSTALLMENTS {
            return Err(anyhow!(
                "Installments must be between 1 and {}",
                MAX_INSTALLMENTS
            ));
        }

        let first_month =
            StatementMonth::parse(&command.first_statement_month).map_err(|e| anyhow!(e))?;

        let card = self
            .card_repository
            .get_card(&command.card_id)
            .await?
            .ok_or_else(|| anyhow!("Card not found: {}", command.card_id))?;
        if !card.is_active {
            return Err(anyhow!("Cannot register purchases on an inactive card"));
        }

        if let Some(category_id) = &command.category_id {
            self.category_repository
                .get_category(category_id)
                .await?
                .ok_or_else(|| anyhow!("Category not found: {}", category_id))?;
        }

        let now_millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        let now_rfc3339 = chrono::Utc::now().to_rfc3339();

        let total_cents = (command.amount * 100.0).round() as i64;
        let installments = command.installments as i64;
        let per_installment = total_cents / installments;
        let remainder = total_cents % installments;

        let mut items = Vec::with_capacity(command.installments as usize);
        let mut month = first_month;
        for number in 1..=command.installments {
            let cents = if number == 1 {
                per_installment + remainder
            } else {
                per_installment
            };

            let due_date = crate::storage::parse_date(&month.due_date(card.due_day))?;
            items.push(LineItem {
                id: shared::LineItem::generate_id(now_millis, number),
                card_id: card.id.clone(),
                statement_month: month.to_string(),
                description: command.description.trim().to_string(),
                amount: cents as f64 / 100.0,
                due_date,
                status: LineItemStatus::Pending,
                paid_at: None,
                installment_number: if command.installments > 1 { Some(number) } else { None },
                installment_total: if command.installments > 1 {
                    Some(command.installments)
                } else {
                    None
                },
                original_amount: if command.installments > 1 { Some(command.amount) } else { None },
                category_id: command.category_id.clone(),
                created_at: now_rfc3339.clone(),
            });
            month = month.next();
        }

        self.line_item_repository.store_line_items(&items).await?;
        self.events.publish(Topic::LineItems);

        info!(
            "Registered purchase of {} in {} installment(s) on card {}",
            shared::format_brl(command.amount),
            command.installments,
            card.id
        );

        Ok(CreatePurchaseResult {
            items,
            success_message: "Purchase registered successfully".to_string(),
        })
    }

    /// Cancel a pending line item
    pub async fn cancel_line_item(&self, item_id: &str) -> Result<()> {
        let canceled = self.line_item_repository.cancel_line_item(item_id).await?;
        if !canceled {
            return Err(anyhow!("Line item not found or not pending: {}", item_id));
        }
        self.events.publish(Topic::LineItems);
        Ok(())
    }
}
