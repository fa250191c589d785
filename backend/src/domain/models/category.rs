//! Domain model for a transaction category.
use serde::{Deserialize, Serialize};
use shared::{AccountContext, CashFlowKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub kind: CashFlowKind,
    pub context: AccountContext,
    pub is_active: bool,
    pub created_at: String,
}

impl Category {
    pub fn to_dto(&self) -> shared::Category {
        shared::Category {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            context: self.context,
            is_active: self.is_active,
        }
    }
}
