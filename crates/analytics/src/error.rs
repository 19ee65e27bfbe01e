use crate::report::RejectedEntry;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("{} invalid entries in batch: {}", .0.len(), summarize(.0))]
    InvalidEntries(Vec<RejectedEntry>),
}

fn summarize(rejected: &[RejectedEntry]) -> String {
    rejected
        .iter()
        .map(|r| format!("#{} ({})", r.index, r.reason))
        .collect::<Vec<_>>()
        .join(", ")
}
