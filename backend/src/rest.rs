//! REST layer: axum handlers mapping the shared DTOs onto domain commands.
//!
//! Error policy mirrors the dashboard's expectations: validation and
//! business failures surface their message with a 4xx status, unexpected
//! failures log and return a generic 500, and the payment/reversal
//! procedures answer with the RPC-style `{ success, error? }` shape even
//! for business failures.

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::info;

use crate::db::DbConnection;
use crate::domain::commands::accounts::{CreateAccountCommand, UpdateAccountCommand};
use crate::domain::commands::cards::{CreateCardCommand, UpdateCardCommand};
use crate::domain::commands::categories::CreateCategoryCommand;
use crate::domain::commands::goals::{CreateGoalCommand, UpdateGoalCommand};
use crate::domain::commands::invoices::{CreatePurchaseCommand, InvoiceSummary};
use crate::domain::commands::payments::{PayInvoiceCommand, ReversePaymentCommand};
use crate::domain::commands::transactions::{CreateTransactionCommand, TransactionListQuery};
use crate::domain::{
    AccountService, CardService, CategoryService, GoalService, InvoiceService, PaymentService,
    StatementService, TransactionService,
};
use crate::events::EventBus;
use shared::{
    AccountContext, AccountListResponse, CardListResponse, CategoryListResponse,
    CreateAccountRequest, CreateCardRequest, CreateCategoryRequest, CreateGoalRequest,
    CreatePurchaseRequest, CreatePurchaseResponse, CreateTransactionRequest, DeleteResponse,
    GoalProgressResponse, PayInvoiceRequest, PayInvoiceResponse, ReverseInvoicePaymentRequest,
    TransactionListResponse, UpdateAccountRequest, UpdateCardRequest, UpdateGoalRequest,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub cards: CardService,
    pub invoices: InvoiceService,
    pub payments: PaymentService,
    pub transactions: TransactionService,
    pub goals: GoalService,
    pub categories: CategoryService,
    pub statements: StatementService,
    pub events: EventBus,
}

impl AppState {
    /// Wire every service onto one database connection and event bus
    pub fn new(db: DbConnection) -> Self {
        let events = EventBus::new();
        Self {
            accounts: AccountService::new(db.clone(), events.clone()),
            cards: CardService::new(db.clone(), events.clone()),
            invoices: InvoiceService::new(db.clone(), events.clone()),
            payments: PaymentService::new(db.clone(), events.clone()),
            transactions: TransactionService::new(db.clone(), events.clone()),
            goals: GoalService::new(db.clone()),
            categories: CategoryService::new(db.clone()),
            statements: StatementService::new(db, events.clone()),
            events,
        }
    }
}

/// Build the API router
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/cards", get(list_cards).post(create_card))
        .route("/cards/:id", get(get_card).put(update_card).delete(delete_card))
        .route("/cards/:id/invoice", get(get_invoice))
        .route("/cards/:id/invoice/pay", post(pay_invoice))
        .route("/cards/:id/invoice/reverse", post(reverse_invoice_payment))
        .route("/cards/:id/invoice/statement", get(get_invoice_statement))
        .route("/cards/:id/purchases", post(create_purchase))
        .route("/line-items/:id/cancel", post(cancel_line_item))
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/:id", axum::routing::delete(delete_transaction))
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/progress", get(goal_progress))
        .route("/goals/:id", axum::routing::put(update_goal).delete(delete_goal))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", axum::routing::delete(delete_category))
        .route("/events", get(events_stream))
        .with_state(state)
}

/// Optional `?context=personal|business` filter
#[derive(Deserialize, Debug, Default)]
pub struct ContextQuery {
    pub context: Option<String>,
}

impl ContextQuery {
    fn parse(&self) -> Result<Option<AccountContext>, String> {
        match &self.context {
            Some(s) => AccountContext::parse(s).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct MonthQuery {
    pub month: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> impl IntoResponse {
    let context = match query.parse() {
        Ok(context) => context,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    match state.accounts.list_accounts(context).await {
        Ok(accounts) => {
            let response = AccountListResponse {
                accounts: accounts.iter().map(|a| a.to_dto()).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error listing accounts: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing accounts").into_response()
        }
    }
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    info!("POST /api/accounts - request: {:?}", request);

    let command = CreateAccountCommand {
        name: request.name,
        bank_name: request.bank_name,
        context: request.context,
        opening_balance: request.opening_balance,
    };

    match state.accounts.create_account(command).await {
        Ok(result) => (StatusCode::CREATED, Json(result.account.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    match state.accounts.get_account(&account_id).await {
        Ok(Some(account)) => (StatusCode::OK, Json(account.to_dto())).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Account not found").into_response(),
        Err(e) => {
            tracing::error!("Error retrieving account: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving account").into_response()
        }
    }
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(request): Json<UpdateAccountRequest>,
) -> impl IntoResponse {
    let command = UpdateAccountCommand {
        account_id,
        name: request.name,
        bank_name: request.bank_name,
    };

    match state.accounts.update_account(command).await {
        Ok(result) => (StatusCode::OK, Json(result.account.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    match state.accounts.delete_account(&account_id).await {
        Ok(result) => {
            let response = DeleteResponse {
                deleted: result.deleted,
                deactivated: result.deactivated,
                success_message: result.success_message,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

pub async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> impl IntoResponse {
    let context = match query.parse() {
        Ok(context) => context,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    match state.cards.list_cards(context).await {
        Ok(result) => {
            let response = CardListResponse {
                cards: result
                    .cards
                    .iter()
                    .map(|c| shared::CardSummary {
                        card: c.card.to_dto(),
                        limit_used: c.limit_used,
                        limit_available: c.limit_available(),
                    })
                    .collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error listing cards: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing cards").into_response()
        }
    }
}

pub async fn create_card(
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> impl IntoResponse {
    info!("POST /api/cards - request: {:?}", request);

    let command = CreateCardCommand {
        name: request.name,
        account_id: request.account_id,
        credit_limit: request.credit_limit,
        closing_day: request.closing_day,
        due_day: request.due_day,
        color: request.color,
        context: request.context,
    };

    match state.cards.create_card(command).await {
        Ok(result) => (StatusCode::CREATED, Json(result.card.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> impl IntoResponse {
    match state.cards.get_card(&card_id).await {
        Ok(Some(card)) => (StatusCode::OK, Json(card.to_dto())).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Card not found").into_response(),
        Err(e) => {
            tracing::error!("Error retrieving card: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving card").into_response()
        }
    }
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(request): Json<UpdateCardRequest>,
) -> impl IntoResponse {
    let command = UpdateCardCommand {
        card_id,
        name: request.name,
        credit_limit: request.credit_limit,
        closing_day: request.closing_day,
        due_day: request.due_day,
        color: request.color,
    };

    match state.cards.update_card(command).await {
        Ok(result) => (StatusCode::OK, Json(result.card.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> impl IntoResponse {
    match state.cards.delete_card(&card_id).await {
        Ok(result) => {
            let response = DeleteResponse {
                deleted: result.deleted,
                deactivated: result.deactivated,
                success_message: result.success_message,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

fn invoice_to_dto(invoice: InvoiceSummary) -> shared::InvoiceSummary {
    shared::InvoiceSummary {
        card_id: invoice.card_id,
        statement_month: invoice.statement_month,
        items: invoice.items.iter().map(|i| i.to_dto()).collect(),
        total: invoice.total,
        limit_used: invoice.limit_used,
        limit_available: invoice.limit_available,
        is_paid: invoice.is_paid,
        total_paid: invoice.total_paid,
        paid_count: invoice.paid_count,
        payment_date: invoice.payment_date.map(|d| d.to_string()),
    }
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/cards/{}/invoice - month: {}", card_id, query.month);

    match state.invoices.get_invoice(&card_id, &query.month).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice_to_dto(invoice))).into_response(),
        Err(e) if e.to_string().starts_with("Card not found") => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn create_purchase(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(request): Json<CreatePurchaseRequest>,
) -> impl IntoResponse {
    info!("POST /api/cards/{}/purchases - request: {:?}", card_id, request);

    let command = CreatePurchaseCommand {
        card_id,
        description: request.description,
        amount: request.amount,
        first_statement_month: request.first_statement_month,
        installments: request.installments,
        category_id: request.category_id,
    };

    match state.invoices.create_purchase(command).await {
        Ok(result) => {
            let response = CreatePurchaseResponse {
                items: result.items.iter().map(|i| i.to_dto()).collect(),
                success_message: result.success_message,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn cancel_line_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    match state.invoices.cancel_line_item(&item_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(request): Json<PayInvoiceRequest>,
) -> impl IntoResponse {
    info!("POST /api/cards/{}/invoice/pay - request: {:?}", card_id, request);

    let command = PayInvoiceCommand {
        card_id,
        account_id: request.account_id,
        statement_month: request.statement_month,
        payment_date: request.payment_date,
        item_ids: request.item_ids,
        context: request.context,
    };

    match state.payments.pay_invoice(command).await {
        Ok(receipt) => {
            info!("Invoice payment succeeded: {}", receipt.transaction_id);
            let response = PayInvoiceResponse { success: true, error: None };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) if e.is_business_error() => {
            let response = PayInvoiceResponse {
                success: false,
                error: Some(e.to_string()),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error paying invoice: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error paying invoice").into_response()
        }
    }
}

pub async fn reverse_invoice_payment(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(request): Json<ReverseInvoicePaymentRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/cards/{}/invoice/reverse - month: {}",
        card_id, request.statement_month
    );

    let command = ReversePaymentCommand {
        card_id,
        statement_month: request.statement_month,
    };

    match state.payments.reverse_payment(command).await {
        Ok(receipt) => {
            info!("Invoice reversal restored {} item(s)", receipt.restored_count);
            let response = PayInvoiceResponse { success: true, error: None };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) if e.is_business_error() => {
            let response = PayInvoiceResponse {
                success: false,
                error: Some(e.to_string()),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error reversing invoice payment: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error reversing invoice payment").into_response()
        }
    }
}

pub async fn get_invoice_statement(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    match state.statements.render_statement(&card_id, &query.month).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            bytes,
        )
            .into_response(),
        Err(e) if e.to_string().starts_with("Card not found") => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Error rendering statement: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error rendering statement").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Query parameters for transaction list endpoint
#[derive(Deserialize, Debug, Default)]
pub struct TransactionsQuery {
    pub context: Option<String>,
    pub account_id: Option<String>,
    pub month: Option<String>,
    pub after: Option<String>,
    pub limit: Option<u32>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> impl IntoResponse {
    info!("GET /api/transactions - query: {:?}", query);

    let context = match &query.context {
        Some(s) => match AccountContext::parse(s) {
            Ok(ctx) => Some(ctx),
            Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
        },
        None => None,
    };

    let list_query = TransactionListQuery {
        context,
        account_id: query.account_id,
        month: query.month,
        after: query.after,
        limit: query.limit,
    };

    match state.transactions.list_transactions(list_query).await {
        Ok(result) => {
            let response = TransactionListResponse {
                transactions: result.transactions.iter().map(|t| t.to_dto()).collect(),
                pagination: shared::PaginationInfo {
                    has_more: result.pagination.has_more,
                    next_cursor: result.pagination.next_cursor,
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error listing transactions: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing transactions").into_response()
        }
    }
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    info!("POST /api/transactions - request: {:?}", request);

    let command = CreateTransactionCommand {
        account_id: request.account_id,
        description: request.description,
        amount: request.amount,
        category_id: request.category_id,
        date: request.date,
        context: request.context,
    };

    match state.transactions.create_transaction(command).await {
        Ok(result) => (StatusCode::CREATED, Json(result.transaction.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> impl IntoResponse {
    match state.transactions.delete_transaction(&transaction_id).await {
        Ok(result) if result.deleted => (StatusCode::OK, Json(result.success_message)).into_response(),
        Ok(_) => (StatusCode::NOT_FOUND, "Transaction not found").into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

pub async fn list_goals(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> impl IntoResponse {
    let context = match query.parse() {
        Ok(context) => context,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    match state.goals.list_goals(context).await {
        Ok(goals) => {
            let dtos: Vec<shared::Goal> = goals.iter().map(|g| g.to_dto()).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => {
            tracing::error!("Error listing goals: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing goals").into_response()
        }
    }
}

pub async fn create_goal(
    State(state): State<AppState>,
    Json(request): Json<CreateGoalRequest>,
) -> impl IntoResponse {
    info!("POST /api/goals - request: {:?}", request);

    let command = CreateGoalCommand {
        description: request.description,
        kind: request.kind,
        category_id: request.category_id,
        limit_amount: request.limit_amount,
        start_date: request.start_date,
        end_date: request.end_date,
        context: request.context,
    };

    match state.goals.create_goal(command).await {
        Ok(result) => (StatusCode::CREATED, Json(result.goal.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
    Json(request): Json<UpdateGoalRequest>,
) -> impl IntoResponse {
    let command = UpdateGoalCommand {
        goal_id,
        description: request.description,
        limit_amount: request.limit_amount,
        start_date: request.start_date,
        end_date: request.end_date,
    };

    match state.goals.update_goal(command).await {
        Ok(result) => (StatusCode::OK, Json(result.goal.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(goal_id): Path<String>,
) -> impl IntoResponse {
    match state.goals.delete_goal(&goal_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Goal not found").into_response(),
        Err(e) => {
            tracing::error!("Error deleting goal: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error deleting goal").into_response()
        }
    }
}

pub async fn goal_progress(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> impl IntoResponse {
    let context = match query.parse() {
        Ok(Some(context)) => context,
        Ok(None) => AccountContext::Personal,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let today = chrono::Local::now().date_naive();
    match state.goals.goal_progress(context, today).await {
        Ok(progress) => {
            let response = GoalProgressResponse {
                goals: progress
                    .iter()
                    .map(|p| shared::GoalProgress {
                        goal: p.goal.to_dto(),
                        current: p.current,
                        status: p.status,
                    })
                    .collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error computing goal progress: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error computing goal progress").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> impl IntoResponse {
    let context = match query.parse() {
        Ok(context) => context,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    match state.categories.list_categories(context).await {
        Ok(categories) => {
            let response = CategoryListResponse {
                categories: categories.iter().map(|c| c.to_dto()).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::error!("Error listing categories: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing categories").into_response()
        }
    }
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let command = CreateCategoryCommand {
        name: request.name,
        kind: request.kind,
        context: request.context,
    };

    match state.categories.create_category(command).await {
        Ok(result) => (StatusCode::CREATED, Json(result.category.to_dto())).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> impl IntoResponse {
    match state.categories.delete_category(&category_id).await {
        Ok(deleted) => {
            let response = DeleteResponse {
                deleted,
                deactivated: !deleted,
                success_message: if deleted {
                    "Category deleted successfully".to_string()
                } else {
                    "Category is in use and was deactivated instead".to_string()
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Server-sent refresh events. Each message names the entity whose data
/// changed; subscribed views re-fetch what they display.
pub async fn events_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        msg.ok()
            .map(|topic| Ok(Event::default().event("change").data(topic.as_str())))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        api_router(AppState::new(db))
    }

    async fn send_json(router: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).to_string(),
            ))
        };
        (status, value)
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).to_string(),
            ))
        };
        (status, value)
    }

    async fn create_account(router: &Router, balance: f64) -> String {
        let (status, body) = send_json(
            router,
            "POST",
            "/accounts",
            json!({
                "name": "Checking",
                "bank_name": null,
                "context": "Personal",
                "opening_balance": balance,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_card(router: &Router, account_id: &str) -> String {
        let (status, body) = send_json(
            router,
            "POST",
            "/cards",
            json!({
                "name": "Platinum",
                "account_id": account_id,
                "credit_limit": 5000.0,
                "closing_day": 25,
                "due_day": 10,
                "color": null,
                "context": "Personal",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_purchase(router: &Router, card_id: &str, amount: f64, month: &str) {
        let (status, _) = send_json(
            router,
            "POST",
            &format!("/cards/{}/purchases", card_id),
            json!({
                "description": "Purchase",
                "amount": amount,
                "first_statement_month": month,
                "installments": 1,
                "category_id": null,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_account_crud_round_trip() {
        let router = test_router().await;
        let account_id = create_account(&router, 250.0).await;

        let (status, body) = get_json(&router, "/accounts?context=personal").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accounts"].as_array().unwrap().len(), 1);
        assert_eq!(body["accounts"][0]["balance"], json!(250.0));

        let (status, body) = get_json(&router, &format!("/accounts/{}", account_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Checking");

        let (status, _) = get_json(&router, "/accounts/account::missing::0000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_account_validation_error() {
        let router = test_router().await;
        let (status, _) = send_json(
            &router,
            "POST",
            "/accounts",
            json!({
                "name": "",
                "bank_name": null,
                "context": "Personal",
                "opening_balance": 0.0,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invoice_unknown_card_is_404() {
        let router = test_router().await;
        let (status, _) =
            get_json(&router, "/cards/card::missing::0000/invoice?month=2025-03").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payment_flow_through_rest() {
        let router = test_router().await;
        let account_id = create_account(&router, 1000.0).await;
        let card_id = create_card(&router, &account_id).await;
        create_purchase(&router, &card_id, 500.0, "2025-03").await;

        let pay_body = json!({
            "account_id": account_id,
            "statement_month": "2025-03",
            "payment_date": "2025-03-15",
            "item_ids": null,
            "context": "Personal",
        });

        let (status, body) = send_json(
            &router,
            "POST",
            &format!("/cards/{}/invoice/pay", card_id),
            pay_body.clone(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        // The invoice reader now reports the month as paid
        let (status, body) =
            get_json(&router, &format!("/cards/{}/invoice?month=2025-03", card_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_paid"], json!(true));
        assert_eq!(body["total_paid"], json!(500.0));

        // And the account was debited
        let (_, account) = get_json(&router, &format!("/accounts/{}", account_id)).await;
        assert_eq!(account["balance"], json!(500.0));

        // A second identical submission reports a business failure, not a 5xx
        let (status, body) = send_json(
            &router,
            "POST",
            &format!("/cards/{}/invoice/pay", card_id),
            pay_body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("No pending items"));
    }

    #[tokio::test]
    async fn test_reversal_flow_through_rest() {
        let router = test_router().await;
        let account_id = create_account(&router, 1000.0).await;
        let card_id = create_card(&router, &account_id).await;
        create_purchase(&router, &card_id, 300.0, "2025-03").await;

        let (_, body) = send_json(
            &router,
            "POST",
            &format!("/cards/{}/invoice/pay", card_id),
            json!({
                "account_id": account_id,
                "statement_month": "2025-03",
                "payment_date": "2025-03-15",
                "item_ids": null,
                "context": "Personal",
            }),
        )
        .await;
        assert_eq!(body["success"], json!(true));

        let (status, body) = send_json(
            &router,
            "POST",
            &format!("/cards/{}/invoice/reverse", card_id),
            json!({ "statement_month": "2025-03" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let (_, account) = get_json(&router, &format!("/accounts/{}", account_id)).await;
        assert_eq!(account["balance"], json!(1000.0));

        // Reversing again finds no payment
        let (status, body) = send_json(
            &router,
            "POST",
            &format!("/cards/{}/invoice/reverse", card_id),
            json!({ "statement_month": "2025-03" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_statement_endpoint_returns_pdf() {
        let router = test_router().await;
        let account_id = create_account(&router, 1000.0).await;
        let card_id = create_card(&router, &account_id).await;
        create_purchase(&router, &card_id, 120.0, "2025-03").await;

        let request = Request::builder()
            .uri(format!("/cards/{}/invoice/statement?month=2025-03", card_id))
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_goal_progress_endpoint() {
        let router = test_router().await;
        let account_id = create_account(&router, 1000.0).await;

        let (status, _) = send_json(
            &router,
            "POST",
            "/goals",
            json!({
                "description": "Save for vacation",
                "kind": "Income",
                "category_id": null,
                "limit_amount": 500.0,
                "start_date": "2020-01-01",
                "end_date": "2099-12-31",
                "context": "Personal",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send_json(
            &router,
            "POST",
            "/transactions",
            json!({
                "account_id": account_id,
                "description": "Freelance gig",
                "amount": 600.0,
                "category_id": null,
                "date": "2025-01-10",
                "context": "Personal",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = get_json(&router, "/goals/progress?context=personal").await;
        assert_eq!(status, StatusCode::OK);
        let goals = body["goals"].as_array().unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0]["current"], json!(600.0));
        assert_eq!(goals[0]["status"], json!("Completed"));
    }

    #[tokio::test]
    async fn test_invalid_context_query_is_400() {
        let router = test_router().await;
        let (status, _) = get_json(&router, "/accounts?context=corporate").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
