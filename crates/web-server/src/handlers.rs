use crate::{AppState, error::AppError};
use analytics::MetricsReport;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use core_types::{
    CalculateRequest, Entry, HealthResponse, ImportSummary, LedgerSettings, NewEntry, RawEntry,
    SettingsUpdate,
};
use ledger_io::{ExportKind, export_file_name, read_entries, write_daily, write_entries, write_monthly};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CalculateOptions {
    /// Fail the whole request when any entry has an unreadable date.
    #[serde(default)]
    pub strict: bool,
}

/// # GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// # GET /api/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LedgerSettings>, AppError> {
    let settings = state.repo.get_settings().await?;
    Ok(Json(settings))
}

/// # PUT /api/settings
/// Only the fields present in the body change.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<LedgerSettings>, AppError> {
    let settings = state.repo.update_settings(&update).await?;
    Ok(Json(settings))
}

/// # GET /api/entries
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Entry>>, AppError> {
    let entries = state.repo.list_entries().await?;
    Ok(Json(entries))
}

/// # POST /api/entries
pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawEntry>,
) -> Result<(StatusCode, Json<Entry>), AppError> {
    let new_entry = NewEntry::try_from(&raw)?;
    let entry = state.repo.add_entry(&new_entry).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// # DELETE /api/entries/:entry_id
/// An id that is not a UUID cannot name a stored entry, so it is a 404 too.
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = Uuid::parse_str(&entry_id)
        .map_err(|_| AppError::NotFound(format!("Entry '{entry_id}' not found")))?;
    state.repo.delete_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/metrics
/// Recomputes both series from the current store snapshot.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MetricsReport>, AppError> {
    Ok(Json(state.current_report().await?))
}

/// # POST /api/calculate
/// Computes metrics for the shipped entries without touching the store.
/// Missing parameters fall back to the stored settings.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Query(options): Query<CalculateOptions>,
    Json(request): Json<CalculateRequest>,
) -> Result<Json<MetricsReport>, AppError> {
    let stored = state.repo.get_settings().await?;
    let report = state.engine.compute(
        &request.data,
        request.starting_balance.unwrap_or(stored.starting_balance),
        request.exchange_rate.unwrap_or(stored.exchange_rate),
    );
    let report = if options.strict {
        report.into_strict()?
    } else {
        report
    };
    Ok(Json(report))
}

/// # GET /api/export/entries.csv
pub async fn export_entries(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let entries: Vec<RawEntry> = state
        .repo
        .list_entries()
        .await?
        .iter()
        .map(RawEntry::from)
        .collect();

    let mut body = Vec::new();
    write_entries(&mut body, &entries).map_err(AppError::Export)?;
    Ok(csv_download(ExportKind::Entries, body))
}

/// # GET /api/export/daily.csv
pub async fn export_daily(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let report = state.current_report().await?;
    let mut body = Vec::new();
    write_daily(&mut body, &report.daily).map_err(AppError::Export)?;
    Ok(csv_download(ExportKind::Daily, body))
}

/// # GET /api/export/monthly.csv
pub async fn export_monthly(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let report = state.current_report().await?;
    let mut body = Vec::new();
    write_monthly(&mut body, &report.monthly).map_err(AppError::Export)?;
    Ok(csv_download(ExportKind::Monthly, body))
}

/// # POST /api/import/csv
/// Replaces the whole ledger with the rows of the uploaded document. Rows
/// without a readable date are skipped and counted.
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ImportSummary>, AppError> {
    let (entries, summary) = read_entries(body.as_bytes())?.into_validated();
    state.repo.replace_entries(&entries).await?;
    Ok(Json(summary))
}

fn csv_download(kind: ExportKind, body: Vec<u8>) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(kind, Utc::now().date_naive())
    );
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
