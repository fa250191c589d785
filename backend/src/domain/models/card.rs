//! Domain model for a credit card.
use serde::{Deserialize, Serialize};
use shared::AccountContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    /// Account invoice payments are debited from by default
    pub account_id: String,
    pub credit_limit: f64,
    pub closing_day: u32,
    pub due_day: u32,
    pub color: String,
    pub context: AccountContext,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Card {
    pub fn to_dto(&self) -> shared::Card {
        shared::Card {
            id: self.id.clone(),
            name: self.name.clone(),
            account_id: self.account_id.clone(),
            credit_limit: self.credit_limit,
            closing_day: self.closing_day,
            due_day: self.due_day,
            color: self.color.clone(),
            context: self.context,
            is_active: self.is_active,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// A card together with its aggregate pending total, for the list view
#[derive(Debug, Clone, PartialEq)]
pub struct CardWithUsage {
    pub card: Card,
    pub limit_used: f64,
}

impl CardWithUsage {
    pub fn limit_available(&self) -> f64 {
        self.card.credit_limit - self.limit_used
    }
}
