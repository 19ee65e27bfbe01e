use crate::DbError;
use chrono::Utc;
use core_types::{Entry, LedgerSettings, NewEntry, SettingsUpdate};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==========================================================================
    // Entries
    // ==========================================================================

    /// Fetches every stored entry, oldest date first. Entries sharing a date
    /// keep their insertion order.
    pub async fn list_entries(&self) -> Result<Vec<Entry>, DbError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, date, gain, loss, withdrawal, deposit, created_at
            FROM entries
            ORDER BY date ASC, created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Stores a validated entry and returns it with its new identity.
    pub async fn add_entry(&self, new_entry: &NewEntry) -> Result<Entry, DbError> {
        let entry = Entry::create(new_entry);
        insert_entry(&self.pool, &entry).await?;
        debug!(id = %entry.id, date = %entry.date, "Stored ledger entry.");
        Ok(entry)
    }

    /// Removes one entry by id.
    pub async fn delete_entry(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        debug!(%id, "Deleted ledger entry.");
        Ok(())
    }

    /// Replaces the whole ledger with `entries` in a single transaction.
    /// Either every row is swapped or the previous ledger is left untouched.
    pub async fn replace_entries(&self, entries: &[NewEntry]) -> Result<usize, DbError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM entries")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let created_at = Utc::now();
        for new_entry in entries {
            let entry = Entry {
                created_at,
                ..Entry::create(new_entry)
            };
            insert_entry(&mut *tx, &entry).await?;
        }

        tx.commit().await?;
        info!(removed, inserted = entries.len(), "Replaced ledger entries.");
        Ok(entries.len())
    }

    // ==========================================================================
    // Settings
    // ==========================================================================

    /// Reads the settings row, falling back to the built-in defaults when the
    /// row has never been written.
    pub async fn get_settings(&self) -> Result<LedgerSettings, DbError> {
        let row = sqlx::query_as::<_, (f64, f64)>(
            "SELECT starting_balance, exchange_rate FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|(starting_balance, exchange_rate)| LedgerSettings {
                starting_balance,
                exchange_rate,
            })
            .unwrap_or_default())
    }

    /// Writes `defaults` only if no settings row exists yet. Safe to call on
    /// every startup.
    pub async fn seed_settings(&self, defaults: &LedgerSettings) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO settings (id, starting_balance, exchange_rate, updated_at)
            VALUES (1, ?, ?, ?)
            "#,
        )
        .bind(defaults.starting_balance)
        .bind(defaults.exchange_rate)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                starting_balance = defaults.starting_balance,
                exchange_rate = defaults.exchange_rate,
                "Seeded ledger settings."
            );
        }
        Ok(())
    }

    /// Applies a partial update and returns the resulting settings.
    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<LedgerSettings, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, (f64, f64)>(
            "SELECT starting_balance, exchange_rate FROM settings WHERE id = 1",
        )
        .fetch_optional(&mut *tx)
        .await?;

        let mut settings = current
            .map(|(starting_balance, exchange_rate)| LedgerSettings {
                starting_balance,
                exchange_rate,
            })
            .unwrap_or_default();
        settings.apply(update);

        sqlx::query(
            r#"
            INSERT INTO settings (id, starting_balance, exchange_rate, updated_at)
            VALUES (1, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                starting_balance = excluded.starting_balance,
                exchange_rate = excluded.exchange_rate,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(settings.starting_balance)
        .bind(settings.exchange_rate)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            starting_balance = settings.starting_balance,
            exchange_rate = settings.exchange_rate,
            "Updated ledger settings."
        );
        Ok(settings)
    }
}

async fn insert_entry<'e, E>(executor: E, entry: &Entry) -> Result<(), DbError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO entries (id, date, gain, loss, withdrawal, deposit, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id)
    .bind(entry.date)
    .bind(entry.gain)
    .bind(entry.loss)
    .bind(entry.withdrawal)
    .bind(entry.deposit)
    .bind(entry.created_at)
    .execute(executor)
    .await?;
    Ok(())
}
