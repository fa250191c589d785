//! # Storage layer
//!
//! One repository per entity, all plain SQL over the shared [`DbConnection`]
//! pool. Multi-row mutations that must stay consistent (ledger writes that
//! adjust the account balance, the payment/reversal flows) run inside a
//! single database transaction.

pub mod accounts;
pub mod cards;
pub mod categories;
pub mod goals;
pub mod ledger;
pub mod line_items;

pub use accounts::AccountRepository;
pub use cards::CardRepository;
pub use categories::CategoryRepository;
pub use goals::GoalRepository;
pub use ledger::LedgerRepository;
pub use line_items::LineItemRepository;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

/// Parse an ISO 8601 date column (YYYY-MM-DD)
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| anyhow!("Invalid date '{}': {}", s, e))
}
