// Owner Statements - Web Server
// JSON API over the statement core with Axum

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use owner_statements::{
    balance_source, breakdown_csv, csv_file_name, logging, markdown_report, report_file_name,
    reservation_source, AppConfig, BalanceSource, ConfigManager, ConfigStore, ManualExpense,
    ReservationSource, Settings, SettingsEditor, SettingsOverride, SettingsSource,
    StatementError, StatementGenerator, StatementPeriod, StatementResult, VERSION,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<RwLock<ConfigStore>>,
    manager: ConfigManager,
    reservations: Arc<dyn ReservationSource + Send + Sync>,
    balances: Arc<dyn BalanceSource + Send + Sync>,
}

impl AppState {
    fn new(
        store: ConfigStore,
        manager: ConfigManager,
        reservations: Arc<dyn ReservationSource + Send + Sync>,
        balances: Arc<dyn BalanceSource + Send + Sync>,
    ) -> Self {
        AppState {
            store: Arc::new(RwLock::new(store)),
            manager,
            reservations,
            balances,
        }
    }

    fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let manager = config.config_manager();
        let store = manager
            .load()
            .with_context(|| format!("Failed to load configuration from {}", manager.config_path().display()))?;

        Ok(AppState::new(
            store,
            manager,
            Arc::from(reservation_source(config)),
            Arc::from(balance_source(config)),
        ))
    }

    /// Apply `edit` to a copy, persist the copy, then publish it.
    /// A failed edit or save leaves the shared settings untouched.
    async fn edit_store<T>(
        &self,
        edit: impl FnOnce(&mut ConfigStore) -> Result<T, StatementError>,
    ) -> Result<(T, ConfigStore), ApiError> {
        let mut store = self.store.write().await;
        let mut edited = store.clone();
        let value = edit(&mut edited)?;
        self.manager.save(&edited)?;
        *store = edited.clone();

        Ok((value, edited))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Library error carried to the HTTP edge
struct ApiError(StatementError);

impl From<StatementError> for ApiError {
    fn from(err: StatementError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &StatementError) -> StatusCode {
    match err {
        StatementError::DuplicateOverride(_) => StatusCode::CONFLICT,
        StatementError::UnknownOverride(_) => StatusCode::NOT_FOUND,
        err if err.is_input_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::warn!(error = %self.0, "request rejected");
        }

        (status, Json(ApiResponse::err(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Settings overview response
#[derive(Serialize)]
struct SettingsOverview {
    default_settings: Settings,
    client_overrides: std::collections::BTreeMap<String, SettingsOverride>,
    tags: Vec<String>,
    active_properties: usize,
}

/// Effective settings for one tag
#[derive(Serialize)]
struct ResolvedSettings {
    tag: String,
    /// False when the tag silently fell back to the defaults
    configured: bool,
    settings: Settings,
}

#[derive(Deserialize)]
struct OverrideRequest {
    tag: String,
    #[serde(default)]
    settings: SettingsOverride,
}

#[derive(Deserialize)]
struct StatementRequest {
    tag: Option<String>,
    /// YYYY-MM; last month when omitted
    month: Option<String>,
    #[serde(default)]
    manual_expenses: Vec<ManualExpense>,
}

fn resolved(store: &ConfigStore, tag: &str) -> ResolvedSettings {
    ResolvedSettings {
        tag: tag.to_string(),
        configured: store.override_for(tag).is_some(),
        settings: store.resolve(tag),
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/settings - Defaults and every property override
async fn get_settings(State(state): State<AppState>) -> ApiResult<SettingsOverview> {
    let store = state.store.read().await;

    Ok(Json(ApiResponse::ok(SettingsOverview {
        default_settings: store.default_settings.clone(),
        client_overrides: store.client_overrides.clone(),
        tags: store.tags(),
        active_properties: store.active_properties(),
    })))
}

/// GET /api/settings/:tag - Effective settings for one property
async fn get_tag_settings(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<ResolvedSettings> {
    let store = state.store.read().await;

    Ok(Json(ApiResponse::ok(resolved(&store, &tag))))
}

/// PUT /api/settings/defaults - Replace the default settings
async fn put_defaults(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> ApiResult<Settings> {
    let ((), store) = state
        .edit_store(|store| {
            store.update_defaults(settings);
            Ok(())
        })
        .await?;

    Ok(Json(ApiResponse::ok(store.default_settings)))
}

/// POST /api/overrides - Register a property
async fn add_override(
    State(state): State<AppState>,
    Json(request): Json<OverrideRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ResolvedSettings>>), ApiError> {
    let ((), store) = state
        .edit_store(|store| store.add_override(&request.tag, request.settings))
        .await?;

    let created = resolved(&store, request.tag.trim());
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// DELETE /api/overrides/:tag - Forget a property
async fn remove_override(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<SettingsOverride> {
    let (removed, _) = state.edit_store(|store| store.remove_override(&tag)).await?;

    Ok(Json(ApiResponse::ok(removed)))
}

async fn run_statement(state: &AppState, request: StatementRequest) -> Result<StatementResult, ApiError> {
    let period = match request.month.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(month) => month.parse::<StatementPeriod>()?,
        None => StatementPeriod::last_month(),
    };

    let store = state.store.read().await;
    let tag = request
        .tag
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .unwrap_or_else(|| store.default_settings.default_tag.clone());

    let result = StatementGenerator::new(&*store, state.reservations.as_ref(), state.balances.as_ref())
        .generate(&tag, period, &request.manual_expenses)?;

    Ok(result)
}

/// POST /api/statements - Generate a statement
async fn generate_statement(
    State(state): State<AppState>,
    Json(request): Json<StatementRequest>,
) -> ApiResult<StatementResult> {
    let result = run_statement(&state, request).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// POST /api/statements/report - Generate and render the markdown report
async fn statement_report(
    State(state): State<AppState>,
    Json(request): Json<StatementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = run_statement(&state, request).await?;
    let file_name = report_file_name(&result.tag, &result.period);

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        markdown_report(&result),
    ))
}

/// POST /api/statements/csv - Generate and export the breakdown table
async fn statement_csv(
    State(state): State<AppState>,
    Json(request): Json<StatementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = run_statement(&state, request).await?;
    let file_name = csv_file_name(&result.tag, &result.period);
    let body = breakdown_csv(&result.breakdown)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        body,
    ))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/settings", get(get_settings))
        .route("/settings/defaults", put(put_defaults))
        .route("/settings/:tag", get(get_tag_settings))
        .route("/overrides", post(add_override))
        .route("/overrides/:tag", delete(remove_override))
        .route("/statements", post(generate_statement))
        .route("/statements/report", post(statement_report))
        .route("/statements/csv", post(statement_csv))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    println!("🌐 Owner Statements {} - Web Server", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::from_env();
    let state = AppState::from_config(&config)?;
    println!("✓ Configuration: {}", config.config_path.display());
    match &config.reservations_path {
        Some(path) => println!("✓ Reservations:  {}", path.display()),
        None => println!("✓ Reservations:  sample data"),
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/statements", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");
    tracing::info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app).await.context("Failed to start server")?;

    Ok(())
}
