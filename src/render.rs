//! Terminal rendering of entries, series and settings.

use analytics::MetricsReport;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use core_types::{DailyRow, Entry, LedgerSettings, MonthlyRow};
use ledger_io::format_amount;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn amount(value: f64) -> Cell {
    Cell::new(format_amount(value)).set_alignment(CellAlignment::Right)
}

pub fn entries_table(entries: &[Entry]) -> Table {
    let mut table = new_table(&["Id", "Date", "Gain", "Loss", "Withdrawal", "Deposit"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(entry.date),
            amount(entry.gain),
            amount(entry.loss),
            amount(entry.withdrawal),
            amount(entry.deposit),
        ]);
    }
    table
}

pub fn daily_table(rows: &[DailyRow]) -> Table {
    let mut table = new_table(&[
        "Sl",
        "Date",
        "Gain",
        "CGain",
        "Loss",
        "CLoss",
        "Net",
        "Cum",
        "Withdrawal",
        "CWithdrawal",
        "CWithdrawal (conv.)",
        "Deposit",
        "CDeposit",
        "Balance",
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.serial),
            Cell::new(row.date),
            amount(row.gain),
            amount(row.cumulative_gain),
            amount(row.loss),
            amount(row.cumulative_loss),
            amount(row.net),
            amount(row.cumulative_net),
            amount(row.withdrawal),
            amount(row.cumulative_withdrawal),
            amount(row.cumulative_withdrawal_converted),
            amount(row.deposit),
            amount(row.cumulative_deposit),
            amount(row.balance),
        ]);
    }
    table
}

pub fn monthly_table(rows: &[MonthlyRow]) -> Table {
    let mut table = new_table(&[
        "Sl",
        "Month",
        "Gain",
        "Loss",
        "Net",
        "Cum",
        "Withdrawal",
        "CWithdrawal",
        "CWithdrawal (conv.)",
        "Deposit",
        "CDeposit",
        "Balance",
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.serial),
            Cell::new(row.month),
            amount(row.gain),
            amount(row.loss),
            amount(row.net),
            amount(row.cumulative_net),
            amount(row.withdrawal),
            amount(row.cumulative_withdrawal),
            amount(row.cumulative_withdrawal_converted),
            amount(row.deposit),
            amount(row.cumulative_deposit),
            amount(row.balance),
        ]);
    }
    table
}

pub fn settings_table(settings: &LedgerSettings) -> Table {
    let mut table = new_table(&["Setting", "Value"]);
    table.add_row(vec![
        Cell::new("Starting balance"),
        amount(settings.starting_balance),
    ]);
    table.add_row(vec![
        Cell::new("Exchange rate"),
        Cell::new(settings.exchange_rate).set_alignment(CellAlignment::Right),
    ]);
    table
}

/// Prints one of the two series, followed by any rejected input.
pub fn print_report(report: &MetricsReport, monthly: bool) {
    if report.is_empty() {
        println!("No entries to report.");
    } else if monthly {
        println!("{}", monthly_table(&report.monthly));
    } else {
        println!("{}", daily_table(&report.daily));
    }

    for rejected in &report.rejected {
        eprintln!(
            "Skipped entry #{} ('{}'): {}",
            rejected.index, rejected.date, rejected.reason
        );
    }
}
