pub mod account_service;
pub mod card_service;
pub mod category_service;
pub mod commands;
pub mod goal_service;
pub mod invoice_service;
pub mod models;
pub mod payment_service;
pub mod statement_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use card_service::CardService;
pub use category_service::CategoryService;
pub use goal_service::GoalService;
pub use invoice_service::InvoiceService;
pub use payment_service::{PaymentError, PaymentService};
pub use statement_service::StatementService;
pub use transaction_service::TransactionService;
