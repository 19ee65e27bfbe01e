use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database URL {0}")]
    InvalidUrl(String),

    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No row matched the given id.
    #[error("The requested entry does not exist.")]
    NotFound,
}
