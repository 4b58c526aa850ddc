// Construction Ledger - Web Server
// JSON API over the sheet export for the dashboard front end.

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use construction_ledger::{
    budget_variance, category_totals, classify_all, detect_price_increases, item_histories,
    item_totals, load_csv, AppConfig, BudgetReport, CategoryTotal, ClassifiedExpense,
    ExpenseRecord, ItemHistory, ItemTotal, PriceAlert, RecordCache, SynonymTable,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
    table: Arc<SynonymTable>,
    data_path: Arc<PathBuf>,
    cache: Arc<RecordCache>,
}

impl AppState {
    /// Snapshot of the sheet, reloaded once the cache TTL has passed
    async fn records(&self) -> Result<Arc<Vec<ExpenseRecord>>> {
        let key = self.data_path.to_string_lossy().into_owned();
        if let Some(records) = self.cache.get_fresh(&key) {
            return Ok(records);
        }

        // Reading and parsing the export is blocking file I/O
        let state = self.clone();
        tokio::task::spawn_blocking(move || state.load_records(&key))
            .await
            .context("Sheet loader task failed")?
    }

    fn load_records(&self, key: &str) -> Result<Arc<Vec<ExpenseRecord>>> {
        self.cache.get_or_load(key, || {
            let report = load_csv(self.data_path.as_path())?;
            info!("{}", report.summary());
            Ok(report.records)
        })
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn failure(status: StatusCode, context: &str, err: &anyhow::Error) -> Response {
    error!("{}: {:#}", context, err);
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(format!("{}: {}", context, err)),
        }),
    )
        .into_response()
}

/// Run `f` on the current records or answer 500 when the sheet can't be loaded
async fn with_records<T, F>(state: &AppState, f: F) -> Response
where
    T: Serialize,
    F: FnOnce(&[ExpenseRecord]) -> T,
{
    match state.records().await {
        Ok(records) => ApiResponse::ok(f(records.as_slice())),
        Err(e) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load expenses",
            &e,
        ),
    }
}

#[derive(Deserialize)]
struct AlertQuery {
    threshold: Option<f64>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ItemsResponse {
    totals: Vec<ItemTotal>,
    categories: Vec<CategoryTotal>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}

/// GET /api/expenses - All expenses with their canonical item
async fn get_expenses(State(state): State<AppState>) -> Response {
    with_records(&state, |records| -> Vec<ClassifiedExpense> {
        classify_all(records, &state.table)
    })
    .await
}

/// GET /api/items - Spend per canonical item and per category
async fn get_items(State(state): State<AppState>) -> Response {
    with_records(&state, |records| ItemsResponse {
        totals: item_totals(&classify_all(records, &state.table)),
        categories: category_totals(records),
    })
    .await
}

/// GET /api/items/:name - Price history of one item
async fn get_item_history(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    // Path is already percent-decoded ("Vergalh%C3%A3o" arrives as "Vergalhão")
    with_records(&state, |records| -> Option<ItemHistory> {
        item_histories(records, &state.table)
            .into_iter()
            .find(|h| h.item == name)
    })
    .await
}

/// GET /api/alerts?threshold=&limit= - Price increases, largest first
async fn get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> Response {
    let trend = state.config.trend_config();
    let threshold = query.threshold.unwrap_or(trend.threshold_percent);
    let limit = query.limit.or(trend.max_results);

    with_records(&state, |records| -> Vec<PriceAlert> {
        detect_price_increases(records, &state.table, threshold, limit)
    })
    .await
}

/// GET /api/budget - Spend per category against the configured budget
async fn get_budget(State(state): State<AppState>) -> Response {
    with_records(&state, |records| -> BudgetReport {
        budget_variance(records, &state.config.budget)
    })
    .await
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    // Optional config file as first argument, env vars on top
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let data_path = config
        .data_path
        .clone()
        .context("No sheet export configured (set data_path or LEDGER_DATA)")?;
    let table = config.synonym_table()?;

    info!(
        data = %data_path.display(),
        items = table.len(),
        ttl_secs = config.cache_ttl_secs,
        "Construction Ledger server starting"
    );

    let state = AppState {
        cache: Arc::new(RecordCache::new(config.cache_ttl())),
        table: Arc::new(table),
        data_path: Arc::new(data_path),
        config: Arc::new(config),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/expenses", get(get_expenses))
        .route("/items", get(get_items))
        .route("/items/:name", get(get_item_history))
        .route("/alerts", get(get_alerts))
        .route("/budget", get(get_budget))
        .with_state(state.clone());

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = state.config.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("   API: http://{}/api/alerts", addr);

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SHEET: &str = "Data,Descrição,Valor\n\
                         01/01/2024,Taxa 5%20 extra,\"10,00\"\n\
                         01/02/2024,taxa 5%20 extra,\"12,00\"\n";

    fn state_for(name: &str) -> AppState {
        let path = std::env::temp_dir().join(format!(
            "ledger-server-{}-{}.csv",
            name,
            std::process::id()
        ));
        std::fs::write(&path, SHEET).unwrap();

        AppState {
            config: Arc::new(AppConfig::default()),
            table: Arc::new(SynonymTable::new()),
            data_path: Arc::new(path),
            cache: Arc::new(RecordCache::new(Duration::from_secs(60))),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_records_load_once_then_come_from_cache() {
        let state = state_for("records");

        let first = state.records().await.unwrap();
        let second = state.records().await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_missing_sheet_is_a_server_error() {
        let mut state = state_for("missing");
        state.data_path = Arc::new(PathBuf::from("/nonexistent/obra.csv"));

        let response = get_expenses(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_item_history_matches_name_with_literal_percent() {
        let state = state_for("history");

        // axum hands the handler the decoded segment; "%20" here is literal text
        let response = get_item_history(State(state), Path("Taxa 5%20 Extra".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"]["item"], "Taxa 5%20 Extra");
        assert_eq!(body["data"]["observations"].as_array().unwrap().len(), 2);
    }
}
