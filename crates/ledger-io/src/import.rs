//! CSV import of raw entries.
//!
//! Expected header (extra columns are ignored, so a daily export can be fed back in):
//! `Date,Gain ($),Loss ($),Withdrawal ($),Deposit ($)`

use crate::error::{IoError, Result};
use core_types::{ImportSummary, NewEntry, RawEntry, parse_amount};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use tracing::{debug, warn};

pub const DATE_HEADER: &str = "Date";
pub const GAIN_HEADER: &str = "Gain ($)";
pub const LOSS_HEADER: &str = "Loss ($)";
pub const WITHDRAWAL_HEADER: &str = "Withdrawal ($)";
pub const DEPOSIT_HEADER: &str = "Deposit ($)";

const REQUIRED_HEADERS: [&str; 5] = [DATE_HEADER, GAIN_HEADER, LOSS_HEADER, WITHDRAWAL_HEADER, DEPOSIT_HEADER];

/// Entries read from a document, plus the number of rows without a date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    pub entries: Vec<RawEntry>,
    pub skipped_rows: usize,
}

impl ImportOutcome {
    /// Validates the dates of the imported rows. Rows whose date cannot be
    /// read are dropped and added to the skipped count.
    pub fn into_validated(self) -> (Vec<NewEntry>, ImportSummary) {
        let mut skipped = self.skipped_rows;
        let mut valid = Vec::with_capacity(self.entries.len());

        for raw in &self.entries {
            match NewEntry::try_from(raw) {
                Ok(entry) => valid.push(entry),
                Err(e) => {
                    warn!(date = %raw.date, error = %e, "Skipping imported row.");
                    skipped += 1;
                }
            }
        }

        let summary = ImportSummary {
            imported: valid.len(),
            skipped,
        };
        (valid, summary)
    }
}

/// Positions of the required columns within a header row.
struct ColumnMap {
    date: usize,
    gain: usize,
    loss: usize,
    withdrawal: usize,
    deposit: usize,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let positions: Vec<Option<usize>> = REQUIRED_HEADERS
            .iter()
            .map(|name| position_of(&normalized, name))
            .collect();

        match positions.as_slice() {
            [Some(date), Some(gain), Some(loss), Some(withdrawal), Some(deposit)] => Ok(Self {
                date: *date,
                gain: *gain,
                loss: *loss,
                withdrawal: *withdrawal,
                deposit: *deposit,
            }),
            _ => Err(IoError::MissingColumns(
                REQUIRED_HEADERS
                    .iter()
                    .zip(&positions)
                    .filter(|(_, position)| position.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect(),
            )),
        }
    }
}

fn position_of(normalized: &[String], name: &str) -> Option<usize> {
    let wanted = normalize_header(name);
    normalized.iter().position(|header| *header == wanted)
}

/// `"Gain ($)"`, `" gain "` and `"GAIN"` all name the same column.
fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    let without_unit = trimmed.strip_suffix("($)").unwrap_or(trimmed);
    without_unit.trim().to_lowercase()
}

fn amount_cell(record: &StringRecord, index: usize) -> f64 {
    record.get(index).map(parse_amount).unwrap_or(0.0)
}

/// Reads raw entries from a CSV document with a header row.
///
/// Rows with an empty date cell are skipped and counted. Amount cells are
/// lenient: blank or unparseable values become `0.0`. Dates are passed through
/// unvalidated; the caller decides how to treat unparseable ones.
pub fn read_entries<R: Read>(reader: R) -> Result<ImportOutcome> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = ColumnMap::resolve(&headers)?;

    let mut outcome = ImportOutcome::default();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let date = record.get(columns.date).unwrap_or_default();
        if date.is_empty() {
            warn!(row = row + 1, "Skipping import row without a date.");
            outcome.skipped_rows += 1;
            continue;
        }

        outcome.entries.push(RawEntry {
            date: date.to_string(),
            gain: amount_cell(&record, columns.gain),
            loss: amount_cell(&record, columns.loss),
            withdrawal: amount_cell(&record, columns.withdrawal),
            deposit: amount_cell(&record, columns.deposit),
        });
    }

    debug!(
        entries = outcome.entries.len(),
        skipped = outcome.skipped_rows,
        "Read entries from CSV."
    );
    Ok(outcome)
}
