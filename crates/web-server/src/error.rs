use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Invalid entry: {0}")]
    InvalidEntry(#[from] core_types::CoreError),
    #[error("Rejected batch: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
    #[error("CSV error: {0}")]
    Csv(#[from] ledger_io::IoError),
    #[error("Export failed: {0}")]
    Export(ledger_io::IoError),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(database::DbError::NotFound) => {
                (StatusCode::NOT_FOUND, "Entry not found".to_string())
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::InvalidEntry(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Analytics(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Csv(ledger_io::IoError::Io(io_err)) => {
                tracing::error!(error = ?io_err, "CSV I/O error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to read the CSV document".to_string(),
                )
            }
            AppError::Csv(csv_err) => (StatusCode::BAD_REQUEST, csv_err.to_string()),
            AppError::Export(err) => {
                tracing::error!(error = ?err, "CSV export failed.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to produce the CSV document".to_string(),
                )
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });
        (status, body).into_response()
    }
}
