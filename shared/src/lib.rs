use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Partition between the "personal" and "business" views of the data.
/// This is a query-level filter, not a tenancy mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountContext {
    Personal,
    Business,
}

impl AccountContext {
    /// Convert to the lowercase form used in storage and query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountContext::Personal => "personal",
            AccountContext::Business => "business",
        }
    }

    /// Parse from the lowercase storage/query form
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(AccountContext::Personal),
            "business" => Ok(AccountContext::Business),
            _ => Err(format!("Invalid account context: {}", s)),
        }
    }
}

/// A bank account as exposed over the API.
///
/// `balance` is a materialized value maintained by the backend whenever a
/// ledger transaction is inserted or deleted; clients never compute deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub bank_name: Option<String>,
    pub context: AccountContext,
    pub balance: f64,
    pub is_active: bool,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub bank_name: Option<String>,
    pub context: AccountContext,
    /// Opening balance recorded at creation time
    pub opening_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountListResponse {
    pub accounts: Vec<Account>,
}

/// Response after deleting an account or card. When linked records exist the
/// record is deactivated (soft delete) instead of removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub deactivated: bool,
    pub success_message: String,
}

/// A credit card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    /// Bank account that invoice payments are debited from by default
    pub account_id: String,
    pub credit_limit: f64,
    /// Day of month the statement closes (1-28)
    pub closing_day: u32,
    /// Day of month the invoice is due (1-28)
    pub due_day: u32,
    /// Display color for the dashboard card widget
    pub color: String,
    pub context: AccountContext,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub name: String,
    pub account_id: String,
    pub credit_limit: f64,
    pub closing_day: u32,
    pub due_day: u32,
    pub color: Option<String>,
    pub context: AccountContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCardRequest {
    pub name: Option<String>,
    pub credit_limit: Option<f64>,
    pub closing_day: Option<u32>,
    pub due_day: Option<u32>,
    pub color: Option<String>,
}

/// Card list entry with aggregate limit usage for the dashboard card view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub card: Card,
    /// Sum of all pending line items across statements
    pub limit_used: f64,
    pub limit_available: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardListResponse {
    pub cards: Vec<CardSummary>,
}

/// Status of a single invoice line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineItemStatus {
    Pending,
    Paid,
    Canceled,
}

impl LineItemStatus {
    /// Convert to the lowercase form used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemStatus::Pending => "pending",
            LineItemStatus::Paid => "paid",
            LineItemStatus::Canceled => "canceled",
        }
    }

    /// Parse from the lowercase storage form
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(LineItemStatus::Pending),
            "paid" => Ok(LineItemStatus::Paid),
            "canceled" => Ok(LineItemStatus::Canceled),
            _ => Err(format!("Invalid line item status: {}", s)),
        }
    }
}

/// A scheduled or installment charge against a card, belonging to one
/// statement month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub card_id: String,
    /// Statement month in YYYY-MM form
    pub statement_month: String,
    pub description: String,
    pub amount: f64,
    pub due_date: String, // ISO 8601 date (YYYY-MM-DD)
    pub status: LineItemStatus,
    /// Date the item was effectively paid, if any
    pub paid_at: Option<String>,
    pub installment_number: Option<u32>,
    pub installment_total: Option<u32>,
    /// Full purchase amount before installment splitting
    pub original_amount: Option<f64>,
    pub category_id: Option<String>,
}

/// The aggregated view of one card's statement month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub card_id: String,
    pub statement_month: String,
    pub items: Vec<LineItem>,
    /// Sum of all non-canceled items in the month
    pub total: f64,
    /// Card-wide pending total (what counts against the limit)
    pub limit_used: f64,
    pub limit_available: f64,
    pub is_paid: bool,
    pub total_paid: f64,
    pub paid_count: usize,
    pub payment_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePurchaseRequest {
    pub description: String,
    /// Full purchase amount; split across installments when `installments > 1`
    pub amount: f64,
    /// First statement month the purchase lands on (YYYY-MM)
    pub first_statement_month: String,
    pub installments: u32,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePurchaseResponse {
    pub items: Vec<LineItem>,
    pub success_message: String,
}

/// Parameters for paying a card invoice. When `item_ids` is absent every
/// pending item in the statement month is paid (full payment); otherwise only
/// the listed items are paid (partial payment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayInvoiceRequest {
    pub account_id: String,
    pub statement_month: String,
    pub payment_date: String, // ISO 8601 date (YYYY-MM-DD)
    pub item_ids: Option<Vec<String>>,
    pub context: AccountContext,
}

/// RPC-style result of the payment and reversal procedures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayInvoiceResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseInvoicePaymentRequest {
    pub statement_month: String,
}

/// Kind of ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
    /// A card invoice payment; carries card_id and statement_month so the
    /// reversal flow can locate it without heuristics
    InvoicePayment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::InvoicePayment => "invoice_payment",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "invoice_payment" => Ok(TransactionKind::InvoicePayment),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

/// A realized, dated money movement recorded against an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: String,
    pub account_id: String,
    pub description: String,
    /// Signed amount: positive for income, negative for expense/payment
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<String>,
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub context: AccountContext,
    pub card_id: Option<String>,
    pub statement_month: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: String,
    /// Description of the transaction (max 256 characters)
    pub description: String,
    /// Positive for income, negative for expense
    pub amount: f64,
    pub category_id: Option<String>,
    /// Optional date override (YYYY-MM-DD) - uses today if not provided
    pub date: Option<String>,
    pub context: AccountContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<LedgerTransaction>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Direction of a budgeting goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashFlowKind {
    Income,
    Expense,
}

impl CashFlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashFlowKind::Income => "income",
            CashFlowKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "income" => Ok(CashFlowKind::Income),
            "expense" => Ok(CashFlowKind::Expense),
            _ => Err(format!("Invalid cash flow kind: {}", s)),
        }
    }
}

/// Computed classification of a goal at read time; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    Active,
    Completed,
    Failed,
}

/// A budget target, either scoped to a category or to the general
/// income/expense bucket, over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub kind: CashFlowKind,
    /// None targets the general bucket for `kind`
    pub category_id: Option<String>,
    pub limit_amount: f64,
    pub start_date: String, // ISO 8601 date (YYYY-MM-DD)
    pub end_date: String,   // ISO 8601 date (YYYY-MM-DD)
    pub context: AccountContext,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGoalRequest {
    pub description: String,
    pub kind: CashFlowKind,
    pub category_id: Option<String>,
    pub limit_amount: f64,
    pub start_date: String,
    pub end_date: String,
    pub context: AccountContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateGoalRequest {
    pub description: Option<String>,
    pub limit_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// One goal together with its computed progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal: Goal,
    /// Accumulated amount within the goal window (magnitude, not signed)
    pub current: f64,
    pub status: GoalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgressResponse {
    pub goals: Vec<GoalProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub kind: CashFlowKind,
    pub context: AccountContext,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub kind: CashFlowKind,
    pub context: AccountContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

/// A statement month (YYYY-MM) with calendar arithmetic for installment
/// scheduling and date-range filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementMonth {
    pub year: i32,
    pub month: u32,
}

impl StatementMonth {
    /// Parse from YYYY-MM form
    pub fn parse(s: &str) -> Result<Self, String> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 2 {
            return Err(format!("Invalid statement month: {}", s));
        }
        let year = parts[0]
            .parse::<i32>()
            .map_err(|_| format!("Invalid year in statement month: {}", s))?;
        let month = parts[1]
            .parse::<u32>()
            .map_err(|_| format!("Invalid month in statement month: {}", s))?;
        if parts[0].len() != 4 || !(1..=12).contains(&month) {
            return Err(format!("Invalid statement month: {}", s));
        }
        Ok(Self { year, month })
    }

    /// The following statement month
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Number of days in this month
    pub fn days_in_month(&self) -> u32 {
        match self.month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 => {
                if self.year % 4 == 0 && (self.year % 100 != 0 || self.year % 400 == 0) {
                    29
                } else {
                    28
                }
            }
            _ => 0,
        }
    }

    /// Due date within this month, clamping the day to the month length
    pub fn due_date(&self, day: u32) -> String {
        let day = day.max(1).min(self.days_in_month());
        format!("{:04}-{:02}-{:02}", self.year, self.month, day)
    }
}

impl Default for StatementMonth {
    /// The current calendar month
    fn default() -> Self {
        use chrono::Datelike;
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

impl fmt::Display for StatementMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Format an amount in Brazilian real, e.g. `R$ 1.234,56`
pub fn format_brl(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, frac)
}

/// Validation errors for the money input forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoneyValidationError {
    EmptyAmount,
    InvalidAmountFormat(String),
    AmountNotPositive,
    AmountTooLarge(f64),
}

/// Result of validating a user-typed amount before any network call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyFormValidation {
    pub is_valid: bool,
    pub errors: Vec<MoneyValidationError>,
    pub cleaned_amount: Option<f64>,
}

pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Validate a user-typed amount, accepting both `1.234,56` (pt-BR) and
/// `1234.56` forms. Runs client-side before any request is issued.
pub fn validate_money_input(input: &str) -> MoneyFormValidation {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return MoneyFormValidation {
            is_valid: false,
            errors: vec![MoneyValidationError::EmptyAmount],
            cleaned_amount: None,
        };
    }

    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    let parsed = match normalized.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            return MoneyFormValidation {
                is_valid: false,
                errors: vec![MoneyValidationError::InvalidAmountFormat(trimmed.to_string())],
                cleaned_amount: None,
            };
        }
    };

    let mut errors = Vec::new();
    if parsed <= 0.0 {
        errors.push(MoneyValidationError::AmountNotPositive);
    }
    if parsed > MAX_AMOUNT {
        errors.push(MoneyValidationError::AmountTooLarge(MAX_AMOUNT));
    }

    MoneyFormValidation {
        is_valid: errors.is_empty(),
        cleaned_amount: if errors.is_empty() { Some(parsed) } else { None },
        errors,
    }
}

/// Generate a short hex suffix so ids minted within the same millisecond
/// stay unique.
pub fn unique_suffix(len: usize) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos();
    format!("{:x}", now % (16_u128.pow(len as u32)))
        .chars()
        .take(len)
        .collect()
}

impl Account {
    /// Generate an account ID based on timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("account::{}::{}", epoch_millis, unique_suffix(4))
    }
}

impl Card {
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("card::{}::{}", epoch_millis, unique_suffix(4))
    }
}

impl LineItem {
    /// Generate a line item ID; `seq` is the installment number so the rows
    /// of one purchase minted in the same millisecond stay distinct.
    pub fn generate_id(epoch_millis: u64, seq: u32) -> String {
        format!("item::{}::{}::{}", epoch_millis, seq, unique_suffix(4))
    }
}

impl Goal {
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("goal::{}::{}", epoch_millis, unique_suffix(4))
    }
}

impl Category {
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("category::{}::{}", epoch_millis, unique_suffix(4))
    }
}

impl LedgerTransaction {
    /// Transaction ID in format: "transaction::<kind>::<epoch_millis>::<suffix>"
    pub fn generate_id(kind: TransactionKind, epoch_millis: u64) -> String {
        format!("transaction::{}::{}::{}", kind.as_str(), epoch_millis, unique_suffix(4))
    }

    /// Parse a transaction ID to extract its kind and timestamp
    pub fn parse_id(id: &str) -> Result<(String, u64), TransactionIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 4 || parts[0] != "transaction" {
            return Err(TransactionIdError::InvalidFormat);
        }

        let kind = parts[1];
        if kind != "income" && kind != "expense" && kind != "invoice_payment" {
            return Err(TransactionIdError::InvalidKind);
        }

        let epoch_millis = parts[2]
            .parse::<u64>()
            .map_err(|_| TransactionIdError::InvalidTimestamp)?;

        Ok((kind.to_string(), epoch_millis))
    }

    /// Extract epoch timestamp from transaction ID for sorting
    pub fn extract_timestamp(&self) -> Result<u64, TransactionIdError> {
        Self::parse_id(&self.id).map(|(_, timestamp)| timestamp)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionIdError {
    InvalidFormat,
    InvalidKind,
    InvalidTimestamp,
}

impl fmt::Display for TransactionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionIdError::InvalidFormat => write!(f, "Invalid transaction ID format"),
            TransactionIdError::InvalidKind => write!(f, "Invalid transaction kind"),
            TransactionIdError::InvalidTimestamp => write!(f, "Invalid timestamp in transaction ID"),
        }
    }
}

impl std::error::Error for TransactionIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_context_round_trip() {
        assert_eq!(AccountContext::parse("personal").unwrap(), AccountContext::Personal);
        assert_eq!(AccountContext::parse("Business").unwrap(), AccountContext::Business);
        assert_eq!(AccountContext::Personal.as_str(), "personal");
        assert!(AccountContext::parse("corporate").is_err());
    }

    #[test]
    fn test_generate_transaction_id() {
        let income_id = LedgerTransaction::generate_id(TransactionKind::Income, 1702516122000);
        assert!(income_id.starts_with("transaction::income::1702516122000::"));

        let payment_id =
            LedgerTransaction::generate_id(TransactionKind::InvoicePayment, 1702516125000);
        assert!(payment_id.starts_with("transaction::invoice_payment::1702516125000::"));
    }

    #[test]
    fn test_parse_transaction_id() {
        let (kind, timestamp) =
            LedgerTransaction::parse_id("transaction::expense::1702516122000::a3f9").unwrap();
        assert_eq!(kind, "expense");
        assert_eq!(timestamp, 1702516122000);

        // Invalid format
        assert!(LedgerTransaction::parse_id("invalid::format").is_err());
        assert!(LedgerTransaction::parse_id("transaction::income::123").is_err());

        // Invalid kind
        assert!(LedgerTransaction::parse_id("transaction::transfer::123::ab").is_err());

        // Invalid timestamp
        assert!(LedgerTransaction::parse_id("transaction::income::nan::ab").is_err());
    }

    #[test]
    fn test_generated_ids_are_unique_within_a_millisecond() {
        let a = LineItem::generate_id(1702516122000, 1);
        let b = LineItem::generate_id(1702516122000, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_statement_month_parse() {
        let month = StatementMonth::parse("2025-03").unwrap();
        assert_eq!(month.year, 2025);
        assert_eq!(month.month, 3);
        assert_eq!(month.to_string(), "2025-03");

        assert!(StatementMonth::parse("2025-13").is_err());
        assert!(StatementMonth::parse("2025").is_err());
        assert!(StatementMonth::parse("march-2025").is_err());
    }

    #[test]
    fn test_statement_month_next_wraps_year() {
        let dec = StatementMonth::parse("2024-12").unwrap();
        let jan = dec.next();
        assert_eq!(jan.to_string(), "2025-01");
    }

    #[test]
    fn test_statement_month_due_date_clamps_day() {
        let feb = StatementMonth::parse("2025-02").unwrap();
        assert_eq!(feb.due_date(30), "2025-02-28");
        assert_eq!(feb.due_date(10), "2025-02-10");

        let leap_feb = StatementMonth::parse("2024-02").unwrap();
        assert_eq!(leap_feb.due_date(30), "2024-02-29");
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(1234.56), "R$ 1.234,56");
        assert_eq!(format_brl(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(format_brl(-42.5), "-R$ 42,50");
    }

    #[test]
    fn test_validate_money_input_accepts_both_decimal_forms() {
        let ptbr = validate_money_input("1.234,56");
        assert!(ptbr.is_valid);
        assert_eq!(ptbr.cleaned_amount, Some(1234.56));

        let plain = validate_money_input("1234.56");
        assert!(plain.is_valid);
        assert_eq!(plain.cleaned_amount, Some(1234.56));

        let comma_only = validate_money_input("42,50");
        assert!(comma_only.is_valid);
        assert_eq!(comma_only.cleaned_amount, Some(42.5));
    }

    #[test]
    fn test_validate_money_input_rejects_bad_values() {
        assert_eq!(
            validate_money_input("").errors,
            vec![MoneyValidationError::EmptyAmount]
        );
        assert_eq!(
            validate_money_input("abc").errors,
            vec![MoneyValidationError::InvalidAmountFormat("abc".to_string())]
        );
        assert_eq!(
            validate_money_input("-10").errors,
            vec![MoneyValidationError::AmountNotPositive]
        );
        assert!(!validate_money_input("2000000").is_valid);
    }
}
