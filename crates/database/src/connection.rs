use crate::error::DbError;
use configuration::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::env;
use std::str::FromStr;
use tracing::info;

/// Establishes a connection pool to the SQLite database.
///
/// `DATABASE_URL` (from the environment or a `.env` file) takes precedence over
/// the configured URL. The database file is created if it does not exist.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, DbError> {
    // A missing .env file is fine; the configured URL is the fallback.
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| config.url.clone());
    connect_url(&database_url, config).await
}

/// Connects to an explicit URL using the pool settings from `config`.
pub async fn connect_url(database_url: &str, config: &DatabaseConfig) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| DbError::InvalidUrl(format!("{database_url}: {e}")))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await?;

    info!(url = %database_url, "Connected to the ledger database.");
    Ok(pool)
}

/// Opens a private in-memory database with the schema applied.
///
/// The pool holds exactly one connection that is never recycled, because every
/// SQLite in-memory connection is a separate database.
pub async fn connect_in_memory() -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| DbError::InvalidUrl(e.to_string()))?;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Applies the embedded migrations so the schema is up to date.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
