use crate::calendar::Month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One aggregated calendar day of the ledger, with running totals.
///
/// `serial` is a display index (1-based chronological position). It shifts
/// whenever an earlier date is added or removed and must never be used as a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub serial: usize,
    pub date: NaiveDate,
    pub gain: f64,
    pub cumulative_gain: f64,
    pub loss: f64,
    pub cumulative_loss: f64,
    pub net: f64,
    pub cumulative_net: f64,
    pub withdrawal: f64,
    pub cumulative_withdrawal: f64,
    /// `cumulative_withdrawal` expressed in the secondary display currency.
    pub cumulative_withdrawal_converted: f64,
    pub deposit: f64,
    pub cumulative_deposit: f64,
    pub balance: f64,
}

/// One aggregated calendar month. Running totals continue across month
/// boundaries and equal those of the last day in the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub serial: usize,
    pub month: Month,
    pub gain: f64,
    pub cumulative_gain: f64,
    pub loss: f64,
    pub cumulative_loss: f64,
    pub net: f64,
    pub cumulative_net: f64,
    pub withdrawal: f64,
    pub cumulative_withdrawal: f64,
    pub cumulative_withdrawal_converted: f64,
    pub deposit: f64,
    pub cumulative_deposit: f64,
    pub balance: f64,
}
