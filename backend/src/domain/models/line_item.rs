//! Domain model for an invoice line item (a "future transaction").
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::LineItemStatus;

/// A single scheduled or installment charge against a card. Belongs to
/// exactly one card and one statement month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub card_id: String,
    /// YYYY-MM
    pub statement_month: String,
    pub description: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: LineItemStatus,
    pub paid_at: Option<NaiveDate>,
    pub installment_number: Option<u32>,
    pub installment_total: Option<u32>,
    /// Full purchase amount before installment splitting
    pub original_amount: Option<f64>,
    pub category_id: Option<String>,
    pub created_at: String,
}

impl LineItem {
    /// Label shown for installment rows, e.g. "2/10"
    pub fn installment_label(&self) -> Option<String> {
        match (self.installment_number, self.installment_total) {
            (Some(n), Some(total)) if total > 1 => Some(format!("{}/{}", n, total)),
            _ => None,
        }
    }

    pub fn to_dto(&self) -> shared::LineItem {
        shared::LineItem {
            id: self.id.clone(),
            card_id: self.card_id.clone(),
            statement_month: self.statement_month.clone(),
            description: self.description.clone(),
            amount: self.amount,
            due_date: self.due_date.to_string(),
            status: self.status,
            paid_at: self.paid_at.map(|d| d.to_string()),
            installment_number: self.installment_number,
            installment_total: self.installment_total,
            original_amount: self.original_amount,
            category_id: self.category_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(number: Option<u32>, total: Option<u32>) -> LineItem {
        LineItem {
            id: "item::1::1::ab".to_string(),
            card_id: "card::1::ab".to_string(),
            statement_month: "2025-03".to_string(),
            description: "Groceries".to_string(),
            amount: 120.0,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            status: LineItemStatus::Pending,
            paid_at: None,
            installment_number: number,
            installment_total: total,
            original_amount: None,
            category_id: None,
            created_at: "2025-02-20T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_installment_label() {
        assert_eq!(item(Some(2), Some(10)).installment_label(), Some("2/10".to_string()));
        assert_eq!(item(Some(1), Some(1)).installment_label(), None);
        assert_eq!(item(None, None).installment_label(), None);
    }
}
