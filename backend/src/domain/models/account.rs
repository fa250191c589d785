//! Domain model for a bank account.
use serde::{Deserialize, Serialize};
use shared::AccountContext;

/// A bank account. `balance` is materialized: every ledger insert/delete
/// adjusts it inside the same database transaction, so reads never have to
/// sum the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub bank_name: Option<String>,
    pub context: AccountContext,
    pub balance: f64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    pub fn to_dto(&self) -> shared::Account {
        shared::Account {
            id: self.id.clone(),
            name: self.name.clone(),
            bank_name: self.bank_name.clone(),
            context: self.context,
            balance: self.balance,
            is_active: self.is_active,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}
