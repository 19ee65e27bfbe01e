//! # PnL Ledger Web Server
//!
//! The JSON API over the stored ledger. Every read recomputes the daily and
//! monthly series from a fresh snapshot of the store; nothing derived is kept
//! between requests.

use analytics::{MetricsEngine, MetricsReport};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use configuration::{Config, ServerConfig};
use core_types::{LedgerSettings, RawEntry};
use database::DbRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

use error::AppError;

/// The shared application state that all handlers can access.
#[derive(Debug, Clone)]
pub struct AppState {
    pub repo: DbRepository,
    pub engine: MetricsEngine,
}

impl AppState {
    pub fn new(repo: DbRepository) -> Self {
        Self {
            repo,
            engine: MetricsEngine::new(),
        }
    }

    /// Computes the report for the stored entries and settings as they are now.
    pub async fn current_report(&self) -> Result<MetricsReport, AppError> {
        let entries: Vec<RawEntry> = self
            .repo
            .list_entries()
            .await?
            .iter()
            .map(RawEntry::from)
            .collect();
        let settings = self.repo.get_settings().await?;

        Ok(self
            .engine
            .compute(&entries, settings.starting_balance, settings.exchange_rate))
    }
}

/// Builds the application router. Kept separate from `run_server` so tests can
/// drive it without binding a socket.
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route(
            "/api/entries",
            get(handlers::list_entries).post(handlers::add_entry),
        )
        .route("/api/entries/:entry_id", delete(handlers::delete_entry))
        .route("/api/metrics", get(handlers::get_metrics))
        .route("/api/calculate", post(handlers::calculate))
        .route("/api/export/entries.csv", get(handlers::export_entries))
        .route("/api/export/daily.csv", get(handlers::export_daily))
        .route("/api/export/monthly.csv", get(handlers::export_monthly))
        .route("/api/import/csv", post(handlers::import_csv))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
}

/// Connects to the database, applies migrations, seeds the settings row and
/// serves the API until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = database::connect(&config.database).await?;
    database::run_migrations(&pool).await?;
    let repo = DbRepository::new(pool);
    repo.seed_settings(&LedgerSettings::from(&config.ledger))
        .await?;

    let app = router(Arc::new(AppState::new(repo)), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server started and listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
    }
}
