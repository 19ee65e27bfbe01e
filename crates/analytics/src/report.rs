use crate::error::AnalyticsError;
use core_types::{DailyRow, MonthlyRow};
use serde::{Deserialize, Serialize};

/// An input entry that was left out of the computation because its date could
/// not be read as a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEntry {
    /// Position of the entry in the input collection.
    pub index: usize,
    /// The date text exactly as supplied.
    pub date: String,
    pub reason: String,
}

/// The output of the `MetricsEngine`.
///
/// Both series are empty when there is nothing to report. That is the
/// canonical "no data" state and is distinct from a table of zero rows with
/// default values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub daily: Vec<DailyRow>,
    pub monthly: Vec<MonthlyRow>,
    #[serde(default)]
    pub rejected: Vec<RejectedEntry>,
}

impl MetricsReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no valid entry contributed to the report.
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    /// Balance after the last recorded day, if any.
    pub fn closing_balance(&self) -> Option<f64> {
        self.daily.last().map(|row| row.balance)
    }

    /// Converts a partially accepted batch into an error, for callers that
    /// want all-or-nothing semantics.
    pub fn into_strict(self) -> Result<Self, AnalyticsError> {
        if self.rejected.is_empty() {
            Ok(self)
        } else {
            Err(AnalyticsError::InvalidEntries(self.rejected))
        }
    }
}
