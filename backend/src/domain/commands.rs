//! Domain-level command and query types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to these internal types.

pub mod accounts {
    use crate::domain::models::Account;
    use shared::AccountContext;

    /// Input for creating a new account.
    #[derive(Debug, Clone)]
    pub struct CreateAccountCommand {
        pub name: String,
        pub bank_name: Option<String>,
        pub context: AccountContext,
        pub opening_balance: f64,
    }

    /// Input for updating an account.
    #[derive(Debug, Clone)]
    pub struct UpdateAccountCommand {
        pub account_id: String,
        pub name: Option<String>,
        pub bank_name: Option<String>,
    }

    /// Result of creating or updating an account.
    #[derive(Debug, Clone)]
    pub struct AccountResult {
        pub account: Account,
        pub success_message: String,
    }

    /// Result of deleting an account. Accounts referenced by ledger rows are
    /// deactivated instead of removed.
    #[derive(Debug, Clone)]
    pub struct DeleteAccountResult {
        pub deleted: bool,
        pub deactivated: bool,
        pub success_message: String,
    }
}

pub mod cards {
    use crate::domain::models::card::{Card, CardWithUsage};
    use shared::AccountContext;

    /// Input for creating a new card.
    #[derive(Debug, Clone)]
    pub struct CreateCardCommand {
        pub name: String,
        pub account_id: String,
        pub credit_limit: f64,
        pub closing_day: u32,
        pub due_day: u32,
        pub color: Option<String>,
        pub context: AccountContext,
    }

    /// Input for updating a card.
    #[derive(Debug, Clone)]
    pub struct UpdateCardCommand {
        pub card_id: String,
        pub name: Option<String>,
        pub credit_limit: Option<f64>,
        pub closing_day: Option<u32>,
        pub due_day: Option<u32>,
        pub color: Option<String>,
    }

    /// Result of creating or updating a card.
    #[derive(Debug, Clone)]
    pub struct CardResult {
        pub card: Card,
        pub success_message: String,
    }

    /// Result of listing cards with their aggregate limit usage.
    #[derive(Debug, Clone)]
    pub struct CardListResult {
        pub cards: Vec<CardWithUsage>,
    }

    /// Result of deleting a card. Cards with line items are deactivated.
    #[derive(Debug, Clone)]
    pub struct DeleteCardResult {
        pub deleted: bool,
        pub deactivated: bool,
        pub success_message: String,
    }
}

pub mod invoices {
    use crate::domain::models::LineItem;
    use chrono::NaiveDate;

    /// The aggregated view of one card's statement month.
    #[derive(Debug, Clone, PartialEq)]
    pub struct InvoiceSummary {
        pub card_id: String,
        pub statement_month: String,
        pub items: Vec<LineItem>,
        pub total: f64,
        /// Card-wide pending total, what counts against the limit
        pub limit_used: f64,
        pub limit_available: f64,
        pub is_paid: bool,
        pub total_paid: f64,
        pub paid_count: usize,
        pub payment_date: Option<NaiveDate>,
    }

    /// Input for registering a card purchase, possibly split in installments.
    #[derive(Debug, Clone)]
    pub struct CreatePurchaseCommand {
        pub card_id: String,
        pub description: String,
        pub amount: f64,
        pub first_statement_month: String,
        pub installments: u32,
        pub category_id: Option<String>,
    }

    /// Result of registering a purchase.
    #[derive(Debug, Clone)]
    pub struct CreatePurchaseResult {
        pub items: Vec<LineItem>,
        pub success_message: String,
    }
}

pub mod payments {
    use shared::AccountContext;

    /// Input for paying a card invoice. `item_ids = None` pays every pending
    /// item in the statement month; otherwise only the listed items.
    #[derive(Debug, Clone)]
    pub struct PayInvoiceCommand {
        pub card_id: String,
        pub account_id: String,
        pub statement_month: String,
        pub payment_date: String,
        pub item_ids: Option<Vec<String>>,
        pub context: AccountContext,
    }

    /// Result of a successful payment.
    #[derive(Debug, Clone)]
    pub struct PaymentReceipt {
        pub transaction_id: String,
        pub paid_count: usize,
        pub total_paid: f64,
        pub new_balance: f64,
    }

    /// Input for reversing the payments of a statement month.
    #[derive(Debug, Clone)]
    pub struct ReversePaymentCommand {
        pub card_id: String,
        pub statement_month: String,
    }

    /// Result of a successful reversal.
    #[derive(Debug, Clone)]
    pub struct ReversalReceipt {
        pub restored_count: usize,
        pub total_restored: f64,
    }
}

pub mod transactions {
    use crate::domain::models::LedgerTransaction;
    use shared::AccountContext;

    /// Input for creating a new ledger transaction.
    #[derive(Debug, Clone)]
    pub struct CreateTransactionCommand {
        pub account_id: String,
        pub description: String,
        pub amount: f64,
        pub category_id: Option<String>,
        pub date: Option<String>,
        pub context: AccountContext,
    }

    /// Result of creating a transaction.
    #[derive(Debug, Clone)]
    pub struct CreateTransactionResult {
        pub transaction: LedgerTransaction,
        pub new_balance: f64,
        pub success_message: String,
    }

    /// Query parameters for listing transactions.
    #[derive(Debug, Clone, Default)]
    pub struct TransactionListQuery {
        pub context: Option<AccountContext>,
        pub account_id: Option<String>,
        /// Restrict to one calendar month (YYYY-MM)
        pub month: Option<String>,
        pub after: Option<String>,
        pub limit: Option<u32>,
    }

    /// Generic pagination info returned by list queries.
    #[derive(Debug, Clone)]
    pub struct PaginationInfo {
        pub has_more: bool,
        pub next_cursor: Option<String>,
    }

    /// Result of listing transactions.
    #[derive(Debug, Clone)]
    pub struct TransactionListResult {
        pub transactions: Vec<LedgerTransaction>,
        pub pagination: PaginationInfo,
    }

    /// Result of deleting a transaction.
    #[derive(Debug, Clone)]
    pub struct DeleteTransactionResult {
        pub deleted: bool,
        pub success_message: String,
    }
}

pub mod goals {
    use crate::domain::models::Goal;
    use shared::{AccountContext, CashFlowKind};

    /// Input for creating a new goal.
    #[derive(Debug, Clone)]
    pub struct CreateGoalCommand {
        pub description: String,
        pub kind: CashFlowKind,
        pub category_id: Option<String>,
        pub limit_amount: f64,
        pub start_date: String,
        pub end_date: String,
        pub context: AccountContext,
    }

    /// Input for updating a goal.
    #[derive(Debug, Clone)]
    pub struct UpdateGoalCommand {
        pub goal_id: String,
        pub description: Option<String>,
        pub limit_amount: Option<f64>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    /// Result of creating or updating a goal.
    #[derive(Debug, Clone)]
    pub struct GoalResult {
        pub goal: Goal,
        pub success_message: String,
    }
}

pub mod categories {
    use crate::domain::models::Category;
    use shared::{AccountContext, CashFlowKind};

    /// Input for creating a new category.
    #[derive(Debug, Clone)]
    pub struct CreateCategoryCommand {
        pub name: String,
        pub kind: CashFlowKind,
        pub context: AccountContext,
    }

    /// Result of creating a category.
    #[derive(Debug, Clone)]
    pub struct CategoryResult {
        pub category: Category,
        pub success_message: String,
    }
}
