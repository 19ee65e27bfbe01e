//! # PnL Ledger Database Crate
//!
//! This crate is the ledger's persistent store: the raw entries the user has
//! recorded and the single settings row (starting balance, exchange rate).
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application talks to a
//!   `DbRepository` and never sees a query string.
//! - **Raw data only:** Computed daily and monthly series are never stored.
//!   They are derived from a snapshot of `list_entries` on every read.
//! - **Asynchronous & Pooled:** All operations are asynchronous and share a
//!   `SqlitePool`. Migrations are embedded in the binary.
//!
//! ## Public API
//!
//! - `connect`: Establishes the connection pool from `DatabaseConfig`.
//! - `connect_url`: Same, but against an explicit URL.
//! - `connect_in_memory`: A private, migrated in-memory database for tests.
//! - `run_migrations`: Applies the embedded schema migrations.
//! - `DbRepository`: Entry CRUD, bulk replacement and settings access.
//! - `DbError`: The specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{connect, connect_in_memory, connect_url, run_migrations};
pub use error::DbError;
pub use repository::DbRepository;
