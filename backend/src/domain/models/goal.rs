//! Domain model for a budgeting goal.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{AccountContext, CashFlowKind, GoalStatus};

/// A budget target over a date range. `category_id = None` targets the
/// general income/expense bucket for `kind`. Progress is never persisted;
/// it is recomputed from the ledger on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub kind: CashFlowKind,
    pub category_id: Option<String>,
    pub limit_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub context: AccountContext,
    pub created_at: String,
    pub updated_at: String,
}

impl Goal {
    pub fn to_dto(&self) -> shared::Goal {
        shared::Goal {
            id: self.id.clone(),
            description: self.description.clone(),
            kind: self.kind,
            category_id: self.category_id.clone(),
            limit_amount: self.limit_amount,
            start_date: self.start_date.to_string(),
            end_date: self.end_date.to_string(),
            context: self.context,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// A goal with its computed progress
#[derive(Debug, Clone, PartialEq)]
pub struct GoalWithProgress {
    pub goal: Goal,
    /// Accumulated magnitude within the goal window
    pub current: f64,
    pub status: GoalStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum GoalValidationError {
    #[error("Goal description cannot be empty")]
    EmptyDescription,
    #[error("Goal description cannot exceed 256 characters")]
    DescriptionTooLong,
    #[error("Goal limit must be positive")]
    NonPositiveLimit,
    #[error("Goal start date must not be after its end date")]
    StartAfterEnd,
}
