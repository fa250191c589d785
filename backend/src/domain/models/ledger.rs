//! Domain model for a ledger transaction.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{AccountContext, TransactionKind};

/// A realized movement of money against an account. Invoice-payment rows
/// carry `card_id` and `statement_month` so the reversal flow can locate
/// them by key instead of matching on description text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: String,
    pub account_id: String,
    pub description: String,
    /// Signed: positive income, negative expense/payment
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<String>,
    pub date: NaiveDate,
    pub context: AccountContext,
    pub card_id: Option<String>,
    pub statement_month: Option<String>,
    pub created_at: String,
}

impl LedgerTransaction {
    pub fn to_dto(&self) -> shared::LedgerTransaction {
        shared::LedgerTransaction {
            id: self.id.clone(),
            account_id: self.account_id.clone(),
            description: self.description.clone(),
            amount: self.amount,
            kind: self.kind,
            category_id: self.category_id.clone(),
            date: self.date.to_string(),
            context: self.context,
            card_id: self.card_id.clone(),
            statement_month: self.statement_month.clone(),
        }
    }
}
