//! # Ledger Metrics Engine
//!
//! This crate turns the raw entries of a trading ledger (gains, losses,
//! withdrawals, deposits) into the daily and monthly series the rest of the
//! application displays and exports.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage,
//!   HTTP, or file formats. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `MetricsEngine` keeps nothing between calls.
//!   Every call recomputes both series from the complete entry snapshot, so the
//!   output depends only on the input collection and the two parameters.
//!
//! ## Public API
//!
//! - `MetricsEngine`: The calculator itself.
//! - `compute_metrics`: A free-function shortcut for one-off computations.
//! - `MetricsReport`: Daily series, monthly series, and rejected entries.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{MetricsEngine, compute_metrics};
pub use error::AnalyticsError;
pub use report::{MetricsReport, RejectedEntry};
