// Expense Tracker - Web Server
// REST API over an in-memory ledger; everything is gone when the process exits

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use expense_tracker::{
    logging, Category, Config, Expense, ExpenseId, ExpenseQuery, ExpenseUpdate, Filter,
    LedgerError, LedgerStore, SortBy, SortOrder, DEFAULT_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone, Default)]
struct AppState {
    ledger: Arc<Mutex<LedgerStore>>,
}

impl AppState {
    fn ledger(&self) -> Result<MutexGuard<'_, LedgerStore>, ApiError> {
        self.ledger
            .lock()
            .map_err(|_| ApiError::Internal("ledger lock poisoned".to_string()))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
enum ApiError {
    #[error(transparent)]
    Validation(#[from] LedgerError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn expense_not_found() -> Self {
        ApiError::NotFound("Expense not found".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ApiResponse {
            success: false,
            data: serde_json::Value::Null,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request / response bodies
// ============================================================================

/// Amount as sent by clients: a JSON number or the raw form text
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    fn into_text(self) -> String {
        match self {
            AmountInput::Number(n) => n.to_string(),
            AmountInput::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateExpense {
    amount: AmountInput,
    #[serde(default)]
    description: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct UpdateExpense {
    amount: Option<AmountInput>,
    description: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    category: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScopeParams {
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClearParams {
    category: Option<String>,
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
struct CategoryInfo {
    name: &'static str,
    icon: &'static str,
}

#[derive(Serialize)]
struct ClearResponse {
    message: String,
    deleted_count: usize,
}

fn parse_category(value: &str) -> ApiResult<Category> {
    value
        .parse::<Category>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Missing, empty or "all" means every category
fn parse_scope(value: Option<&str>) -> ApiResult<Filter> {
    match value.map(str::trim) {
        None | Some("") => Ok(Filter::All),
        Some(v) => v
            .parse::<Filter>()
            .map_err(|e| ApiError::BadRequest(e.to_string())),
    }
}

fn parse_id(value: &str) -> ApiResult<ExpenseId> {
    value.parse().map_err(|_| ApiError::expense_not_found())
}

fn parse_sort_by(value: Option<&str>) -> SortBy {
    match value.map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("amount") => SortBy::Amount,
        Some("category") => SortBy::Category,
        _ => SortBy::Date,
    }
}

fn parse_sort_order(value: Option<&str>) -> SortOrder {
    match value {
        Some(v) if v.eq_ignore_ascii_case("asc") => SortOrder::Asc,
        _ => SortOrder::Desc,
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/categories - The fixed category set with glyphs
async fn get_categories() -> impl IntoResponse {
    let categories: Vec<CategoryInfo> = Category::ALL
        .iter()
        .map(|c| CategoryInfo {
            name: c.as_str(),
            icon: c.icon(),
        })
        .collect();
    Json(ApiResponse::ok(categories))
}

/// POST /api/expenses - Create an expense
async fn create_expense(
    State(state): State<AppState>,
    Json(body): Json<CreateExpense>,
) -> ApiResult<impl IntoResponse> {
    let category = parse_category(&body.category)?;
    let amount = body.amount.into_text();

    let mut ledger = state.ledger()?;
    let expense = ledger
        .add_expense(&amount, &body.description, category)?
        .clone();

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

/// GET /api/expenses - List with optional filter, sorting and paging
async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ApiResponse<Vec<Expense>>>> {
    let query = ExpenseQuery {
        filter: parse_scope(params.category.as_deref())?,
        sort_by: parse_sort_by(params.sort_by.as_deref()),
        order: parse_sort_order(params.sort_order.as_deref()),
        offset: params.offset.unwrap_or(0),
        limit: params.limit.unwrap_or(DEFAULT_LIMIT),
    };

    let ledger = state.ledger()?;
    Ok(Json(ApiResponse::ok(ledger.query(&query))))
}

/// GET /api/expenses/total - Total and count, optionally for one category
async fn get_total(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> ApiResult<impl IntoResponse> {
    let scope = parse_scope(params.category.as_deref())?;
    let ledger = state.ledger()?;
    Ok(Json(ApiResponse::ok(ledger.summary_for(scope))))
}

/// GET /api/expenses/stats - Breakdown by category
async fn get_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let ledger = state.ledger()?;
    Ok(Json(ApiResponse::ok(ledger.category_stats())))
}

/// GET /api/expenses/:id
async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let ledger = state.ledger()?;
    let expense = ledger.get(id).cloned().ok_or_else(ApiError::expense_not_found)?;
    Ok(Json(ApiResponse::ok(expense)))
}

/// PUT /api/expenses/:id - Change any of amount, description, category
async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateExpense>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let update = ExpenseUpdate {
        amount: body.amount.map(AmountInput::into_text),
        description: body.description,
        category: body.category.as_deref().map(parse_category).transpose()?,
    };

    let mut ledger = state.ledger()?;
    let expense = ledger
        .update_expense(id, update)?
        .cloned()
        .ok_or_else(ApiError::expense_not_found)?;
    Ok(Json(ApiResponse::ok(expense)))
}

/// DELETE /api/expenses/:id
async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let mut ledger = state.ledger()?;
    if !ledger.delete_expense(id) {
        return Err(ApiError::expense_not_found());
    }
    Ok(Json(ApiResponse::ok("Expense deleted successfully")))
}

/// DELETE /api/expenses?confirm=true - Bulk delete, optionally one category
async fn clear_expenses(
    State(state): State<AppState>,
    Query(params): Query<ClearParams>,
) -> ApiResult<impl IntoResponse> {
    if !params.confirm {
        return Err(ApiError::BadRequest(
            "Confirmation required. Add ?confirm=true to the request".to_string(),
        ));
    }

    let scope = parse_scope(params.category.as_deref())?;
    let mut ledger = state.ledger()?;
    let deleted_count = ledger.clear(scope);

    let message = match scope {
        Filter::All => "All expenses deleted successfully".to_string(),
        Filter::Category(c) => format!("All {} expenses deleted successfully", c),
    };
    Ok(Json(ApiResponse::ok(ClearResponse {
        message,
        deleted_count,
    })))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .route(
            "/expenses",
            get(list_expenses).post(create_expense).delete(clear_expenses),
        )
        .route("/expenses/total", get(get_total))
        .route("/expenses/stats", get(get_stats))
        .route(
            "/expenses/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "expense-server", version)]
struct Cli {
    /// Config file (defaults to $EXPENSE_TRACKER_CONFIG or the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init(&config.logging, logging::Fallback::Stdout)?;

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, version = expense_tracker::VERSION, "expense server listening");

    axum::serve(listener, app(AppState::default()))
        .await
        .context("Server error")?;

    Ok(())
}
