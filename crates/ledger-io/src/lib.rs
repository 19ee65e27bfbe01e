//! Tabular import and export for the ledger.
//!
//! The metrics engine never sees a file format; this crate turns CSV documents
//! into `RawEntry`s and computed series back into CSV.

pub mod error;
pub mod export;
pub mod import;

pub use error::{IoError, Result};
pub use export::{ExportKind, export_file_name, format_amount, write_daily, write_entries, write_monthly};
pub use import::{ImportOutcome, read_entries};
