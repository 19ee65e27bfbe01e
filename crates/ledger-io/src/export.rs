//! CSV export of entries and computed series.
//!
//! Column layout matches the sheets users already keep. Raw amounts (the
//! columns an import reads back) are written at full precision; computed
//! totals are rounded to cents. Rounding happens here and nowhere upstream.

use crate::error::Result;
use crate::import::{DATE_HEADER, DEPOSIT_HEADER, GAIN_HEADER, LOSS_HEADER, WITHDRAWAL_HEADER};
use chrono::NaiveDate;
use core_types::{DailyRow, MonthlyRow, RawEntry, sanitize_amount};
use csv::WriterBuilder;
use rust_decimal::prelude::*;
use serde::Serialize;
use std::io::Write;

/// Formats an amount with exactly two decimals, rounding half away from zero.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "0.00".to_string();
    }
    // Decimal tops out near 7.9e28.
    let Some(decimal) = Decimal::from_f64(value) else {
        return format!("{value:.2}");
    };
    let rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return "0.00".to_string();
    }
    format!("{rounded:.2}")
}

/// Shortest text that parses back to the same `f64`.
fn exact_amount(value: f64) -> String {
    sanitize_amount(value).to_string()
}

/// The three documents the exporter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Entries,
    Daily,
    Monthly,
}

impl ExportKind {
    fn label(&self) -> &'static str {
        match self {
            ExportKind::Entries => "Entries",
            ExportKind::Daily => "DateWise",
            ExportKind::Monthly => "Monthwise",
        }
    }
}

/// File name for a download, e.g. `PnL_Tracker_DateWise_20240131.csv`.
pub fn export_file_name(kind: ExportKind, on: NaiveDate) -> String {
    format!("PnL_Tracker_{}_{}.csv", kind.label(), on.format("%Y%m%d"))
}

#[derive(Serialize)]
struct EntryCsvRow<'a> {
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Gain ($)")]
    gain: String,
    #[serde(rename = "Loss ($)")]
    loss: String,
    #[serde(rename = "Withdrawal ($)")]
    withdrawal: String,
    #[serde(rename = "Deposit ($)")]
    deposit: String,
}

#[derive(Serialize)]
struct DailyCsvRow {
    #[serde(rename = "Sl")]
    serial: usize,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Gain ($)")]
    gain: String,
    #[serde(rename = "Cgain ($)")]
    cumulative_gain: String,
    #[serde(rename = "Loss ($)")]
    loss: String,
    #[serde(rename = "Closs ($)")]
    cumulative_loss: String,
    #[serde(rename = "Net ($)")]
    net: String,
    #[serde(rename = "Cum ($)")]
    cumulative_net: String,
    #[serde(rename = "Withdrawal ($)")]
    withdrawal: String,
    #[serde(rename = "CWithdrawal ($)")]
    cumulative_withdrawal: String,
    #[serde(rename = "Deposit ($)")]
    deposit: String,
    #[serde(rename = "CDeposit ($)")]
    cumulative_deposit: String,
    #[serde(rename = "Balance ($)")]
    balance: String,
}

#[derive(Serialize)]
struct MonthlyCsvRow {
    #[serde(rename = "Sl")]
    serial: usize,
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "Gain ($)")]
    gain: String,
    #[serde(rename = "Loss ($)")]
    loss: String,
    #[serde(rename = "Net ($)")]
    net: String,
    #[serde(rename = "Cum ($)")]
    cumulative_net: String,
    #[serde(rename = "Withdrawal ($)")]
    withdrawal: String,
    #[serde(rename = "CWithdrawal ($)")]
    cumulative_withdrawal: String,
    #[serde(rename = "Deposit ($)")]
    deposit: String,
    #[serde(rename = "CDeposit ($)")]
    cumulative_deposit: String,
    #[serde(rename = "Balance ($)")]
    balance: String,
}

/// Writes raw entries in the import layout, so the output can be re-imported.
pub fn write_entries<W: Write>(writer: W, entries: &[RawEntry]) -> Result<()> {
    let mut wrt = WriterBuilder::new().has_headers(false).from_writer(writer);
    wrt.write_record([DATE_HEADER, GAIN_HEADER, LOSS_HEADER, WITHDRAWAL_HEADER, DEPOSIT_HEADER])?;

    for entry in entries {
        wrt.serialize(EntryCsvRow {
            date: &entry.date,
            gain: exact_amount(entry.gain),
            loss: exact_amount(entry.loss),
            withdrawal: exact_amount(entry.withdrawal),
            deposit: exact_amount(entry.deposit),
        })?;
    }
    wrt.flush()?;
    Ok(())
}

/// Writes the daily series. An empty series produces only the header row.
/// The per-day amount columns stay exact so the file can be re-imported.
pub fn write_daily<W: Write>(writer: W, rows: &[DailyRow]) -> Result<()> {
    let mut wrt = WriterBuilder::new().has_headers(false).from_writer(writer);
    wrt.write_record([
        "Sl",
        "Date",
        "Gain ($)",
        "Cgain ($)",
        "Loss ($)",
        "Closs ($)",
        "Net ($)",
        "Cum ($)",
        "Withdrawal ($)",
        "CWithdrawal ($)",
        "Deposit ($)",
        "CDeposit ($)",
        "Balance ($)",
    ])?;

    for row in rows {
        wrt.serialize(DailyCsvRow {
            serial: row.serial,
            date: row.date.format("%Y-%m-%d").to_string(),
            gain: exact_amount(row.gain),
            cumulative_gain: format_amount(row.cumulative_gain),
            loss: exact_amount(row.loss),
            cumulative_loss: format_amount(row.cumulative_loss),
            net: format_amount(row.net),
            cumulative_net: format_amount(row.cumulative_net),
            withdrawal: exact_amount(row.withdrawal),
            cumulative_withdrawal: format_amount(row.cumulative_withdrawal),
            deposit: exact_amount(row.deposit),
            cumulative_deposit: format_amount(row.cumulative_deposit),
            balance: format_amount(row.balance),
        })?;
    }
    wrt.flush()?;
    Ok(())
}

/// Writes the monthly series. An empty series produces only the header row.
pub fn write_monthly<W: Write>(writer: W, rows: &[MonthlyRow]) -> Result<()> {
    let mut wrt = WriterBuilder::new().has_headers(false).from_writer(writer);
    wrt.write_record([
        "Sl",
        "Month",
        "Gain ($)",
        "Loss ($)",
        "Net ($)",
        "Cum ($)",
        "Withdrawal ($)",
        "CWithdrawal ($)",
        "Deposit ($)",
        "CDeposit ($)",
        "Balance ($)",
    ])?;

    for row in rows {
        wrt.serialize(MonthlyCsvRow {
            serial: row.serial,
            month: row.month.to_string(),
            gain: format_amount(row.gain),
            loss: format_amount(row.loss),
            net: format_amount(row.net),
            cumulative_net: format_amount(row.cumulative_net),
            withdrawal: format_amount(row.withdrawal),
            cumulative_withdrawal: format_amount(row.cumulative_withdrawal),
            deposit: format_amount(row.deposit),
            cumulative_deposit: format_amount(row.cumulative_deposit),
            balance: format_amount(row.balance),
        })?;
    }
    wrt.flush()?;
    Ok(())
}
