//! Shared data model of the ledger: raw and stored entries, the derived daily
//! and monthly rows, settings, and the lenient parsing rules every layer uses.

pub mod amount;
pub mod calendar;
pub mod entry;
pub mod error;
pub mod request;
pub mod series;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use amount::{parse_amount, sanitize_amount};
pub use calendar::{Month, parse_entry_date};
pub use entry::{Entry, NewEntry, RawEntry};
pub use error::CoreError;
pub use request::{CalculateRequest, ErrorResponse, HealthResponse, ImportSummary};
pub use series::{DailyRow, MonthlyRow};
pub use settings::{LedgerSettings, SettingsUpdate};
