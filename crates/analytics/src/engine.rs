use crate::report::{MetricsReport, RejectedEntry};
use chrono::NaiveDate;
use core_types::{DailyRow, Month, MonthlyRow, RawEntry, parse_entry_date, sanitize_amount};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// The raw amounts recorded for one day (or one entry within a day).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DayAmounts {
    gain: f64,
    loss: f64,
    withdrawal: f64,
    deposit: f64,
}

impl DayAmounts {
    fn from_raw(raw: &RawEntry) -> Self {
        Self {
            gain: sanitize_amount(raw.gain),
            loss: sanitize_amount(raw.loss),
            withdrawal: sanitize_amount(raw.withdrawal),
            deposit: sanitize_amount(raw.deposit),
        }
    }

    /// Total order used to sum same-day entries in a fixed sequence, so that
    /// floating-point results do not depend on input order.
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| self.loss.total_cmp(&other.loss))
            .then_with(|| self.withdrawal.total_cmp(&other.withdrawal))
            .then_with(|| self.deposit.total_cmp(&other.deposit))
    }

    fn accumulate(&mut self, other: &Self) {
        self.gain += other.gain;
        self.loss += other.loss;
        self.withdrawal += other.withdrawal;
        self.deposit += other.deposit;
    }
}

/// Running totals carried from one day to the next.
#[derive(Debug, Clone, Copy, Default)]
struct RunningTotals {
    gain: f64,
    loss: f64,
    net: f64,
    withdrawal: f64,
    deposit: f64,
}

impl RunningTotals {
    fn advance(&mut self, day: &DayAmounts, net: f64) {
        self.gain += day.gain;
        self.loss += day.loss;
        self.net += net;
        self.withdrawal += day.withdrawal;
        self.deposit += day.deposit;
    }

    /// Withdrawals reduce and deposits increase the balance.
    fn balance(&self, starting_balance: f64) -> f64 {
        starting_balance + self.net - self.withdrawal + self.deposit
    }
}

/// A stateless calculator that turns ledger entries into daily and monthly
/// series with running totals.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating ledger metrics.
    ///
    /// # Arguments
    ///
    /// * `entries` - Raw entries in any order; several entries may share a date.
    /// * `starting_balance` - Account value before the first entry.
    /// * `exchange_rate` - Factor for the converted cumulative withdrawal column.
    ///   It has no influence on the balance.
    ///
    /// # Returns
    ///
    /// A `MetricsReport` with both series and the entries whose dates could not
    /// be parsed. Rejected entries do not abort the batch.
    pub fn compute(
        &self,
        entries: &[RawEntry],
        starting_balance: f64,
        exchange_rate: f64,
    ) -> MetricsReport {
        if entries.is_empty() {
            return MetricsReport::new();
        }

        let starting_balance = sanitize_amount(starting_balance);
        let exchange_rate = sanitize_amount(exchange_rate);

        let (dated, rejected) = self.normalize(entries);
        let days = self.group_by_date(dated);
        let daily = self.build_daily_series(&days, starting_balance, exchange_rate);
        let monthly = self.build_monthly_series(&daily);

        debug!(
            entries = entries.len(),
            rejected = rejected.len(),
            days = daily.len(),
            months = monthly.len(),
            "Computed ledger metrics."
        );

        MetricsReport {
            daily,
            monthly,
            rejected,
        }
    }

    /// Parses dates and coerces amounts, splitting off entries with unusable dates.
    fn normalize(&self, entries: &[RawEntry]) -> (Vec<(NaiveDate, DayAmounts)>, Vec<RejectedEntry>) {
        let mut dated = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            match parse_entry_date(&entry.date) {
                Ok(date) => dated.push((date, DayAmounts::from_raw(entry))),
                Err(e) => {
                    warn!(index, date = %entry.date, error = %e, "Rejecting ledger entry.");
                    rejected.push(RejectedEntry {
                        index,
                        date: entry.date.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        (dated, rejected)
    }

    /// Merges entries sharing a calendar date, returning one item per date in
    /// ascending order.
    fn group_by_date(&self, mut dated: Vec<(NaiveDate, DayAmounts)>) -> Vec<(NaiveDate, DayAmounts)> {
        dated.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.canonical_cmp(&b.1)));

        let mut days: Vec<(NaiveDate, DayAmounts)> = Vec::new();
        for (date, amounts) in dated {
            match days.last_mut() {
                Some((last_date, totals)) if *last_date == date => totals.accumulate(&amounts),
                _ => days.push((date, amounts)),
            }
        }
        days
    }

    /// A single left-to-right pass producing the daily running totals.
    fn build_daily_series(
        &self,
        days: &[(NaiveDate, DayAmounts)],
        starting_balance: f64,
        exchange_rate: f64,
    ) -> Vec<DailyRow> {
        let mut running = RunningTotals::default();

        days.iter()
            .enumerate()
            .map(|(position, (date, day))| {
                let net = day.gain - day.loss;
                running.advance(day, net);

                DailyRow {
                    serial: position + 1,
                    date: *date,
                    gain: day.gain,
                    cumulative_gain: running.gain,
                    loss: day.loss,
                    cumulative_loss: running.loss,
                    net,
                    cumulative_net: running.net,
                    withdrawal: day.withdrawal,
                    cumulative_withdrawal: running.withdrawal,
                    cumulative_withdrawal_converted: running.withdrawal * exchange_rate,
                    deposit: day.deposit,
                    cumulative_deposit: running.deposit,
                    balance: running.balance(starting_balance),
                }
            })
            .collect()
    }

    /// Coarsens the daily series into calendar months. Per-month amounts are
    /// sums of the daily amounts; running totals are those of the month's last day.
    fn build_monthly_series(&self, daily: &[DailyRow]) -> Vec<MonthlyRow> {
        let mut monthly: Vec<MonthlyRow> = Vec::new();

        for row in daily {
            let month = Month::from(row.date);
            let continues_month = monthly.last().is_some_and(|current| current.month == month);

            if continues_month {
                if let Some(current) = monthly.last_mut() {
                    absorb_day(current, row);
                }
            } else {
                let serial = monthly.len() + 1;
                monthly.push(open_month(serial, month, row));
            }
        }

        monthly
    }
}

fn open_month(serial: usize, month: Month, row: &DailyRow) -> MonthlyRow {
    MonthlyRow {
        serial,
        month,
        gain: row.gain,
        cumulative_gain: row.cumulative_gain,
        loss: row.loss,
        cumulative_loss: row.cumulative_loss,
        net: row.net,
        cumulative_net: row.cumulative_net,
        withdrawal: row.withdrawal,
        cumulative_withdrawal: row.cumulative_withdrawal,
        cumulative_withdrawal_converted: row.cumulative_withdrawal_converted,
        deposit: row.deposit,
        cumulative_deposit: row.cumulative_deposit,
        balance: row.balance,
    }
}

fn absorb_day(current: &mut MonthlyRow, row: &DailyRow) {
    current.gain += row.gain;
    current.loss += row.loss;
    current.net += row.net;
    current.withdrawal += row.withdrawal;
    current.deposit += row.deposit;

    current.cumulative_gain = row.cumulative_gain;
    current.cumulative_loss = row.cumulative_loss;
    current.cumulative_net = row.cumulative_net;
    current.cumulative_withdrawal = row.cumulative_withdrawal;
    current.cumulative_withdrawal_converted = row.cumulative_withdrawal_converted;
    current.cumulative_deposit = row.cumulative_deposit;
    current.balance = row.balance;
}

/// Convenience wrapper around `MetricsEngine::compute`.
pub fn compute_metrics(entries: &[RawEntry], starting_balance: f64, exchange_rate: f64) -> MetricsReport {
    MetricsEngine::new().compute(entries, starting_balance, exchange_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_series() {
        let report = compute_metrics(&[], 1000.0, 80.0);
        assert!(report.daily.is_empty());
        assert!(report.monthly.is_empty());
        assert!(report.rejected.is_empty());
        assert!(report.is_empty());
        assert_eq!(report.closing_balance(), None);
    }

    #[test]
    fn two_day_january_scenario() {
        let entries = vec![
            RawEntry::new("2024-01-01").with_gain(100.0),
            RawEntry::new("2024-01-02").with_loss(30.0).with_withdrawal(20.0),
        ];
        let report = compute_metrics(&entries, 1000.0, 1.0);

        assert_eq!(report.daily.len(), 2);
        let first = &report.daily[0];
        assert_eq!(first.serial, 1);
        assert_eq!(first.date, ymd(2024, 1, 1));
        assert_eq!(first.gain, 100.0);
        assert_eq!(first.loss, 0.0);
        assert_eq!(first.cumulative_gain, 100.0);
        assert_eq!(first.cumulative_loss, 0.0);
        assert_eq!(first.net, 100.0);
        assert_eq!(first.cumulative_net, 100.0);
        assert_eq!(first.balance, 1100.0);

        let second = &report.daily[1];
        assert_eq!(second.serial, 2);
        assert_eq!(second.gain, 0.0);
        assert_eq!(second.loss, 30.0);
        assert_eq!(second.cumulative_gain, 100.0);
        assert_eq!(second.cumulative_loss, 30.0);
        assert_eq!(second.net, -30.0);
        assert_eq!(second.cumulative_net, 70.0);
        assert_eq!(second.withdrawal, 20.0);
        assert_eq!(second.cumulative_withdrawal, 20.0);
        assert_eq!(second.balance, 1050.0);

        assert_eq!(report.monthly.len(), 1);
        let january = &report.monthly[0];
        assert_eq!(january.serial, 1);
        assert_eq!(january.month.to_string(), "2024-01");
        assert_eq!(january.gain, 100.0);
        assert_eq!(january.loss, 30.0);
        assert_eq!(january.net, 70.0);
        assert_eq!(january.withdrawal, 20.0);
        assert_eq!(january.balance, 1050.0);
    }

    #[test]
    fn same_date_entries_are_merged() {
        let entries = vec![
            RawEntry::new("2024-03-10").with_gain(10.0),
            RawEntry::new("2024-03-10").with_gain(5.0).with_loss(2.0),
        ];
        let report = compute_metrics(&entries, 0.0, 1.0);

        assert_eq!(report.daily.len(), 1);
        assert_eq!(report.daily[0].gain, 15.0);
        assert_eq!(report.daily[0].loss, 2.0);
        assert_eq!(report.daily[0].net, 13.0);
    }

    #[test]
    fn unordered_input_is_sorted_chronologically() {
        let entries = vec![
            RawEntry::new("2024-02-01").with_gain(3.0),
            RawEntry::new("2023-12-31").with_gain(1.0),
            RawEntry::new("2024-01-15").with_gain(2.0),
        ];
        let report = compute_metrics(&entries, 0.0, 1.0);

        let dates: Vec<_> = report.daily.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2023, 12, 31), ymd(2024, 1, 15), ymd(2024, 2, 1)]);
        let serials: Vec<_> = report.daily.iter().map(|r| r.serial).collect();
        assert_eq!(serials, vec![1, 2, 3]);
        let months: Vec<_> = report.monthly.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn invalid_dates_are_rejected_without_aborting() {
        let entries = vec![
            RawEntry::new("2024-01-01").with_gain(50.0),
            RawEntry::new("not a date").with_gain(999.0),
            RawEntry::new("").with_loss(1.0),
        ];
        let report = compute_metrics(&entries, 0.0, 1.0);

        assert_eq!(report.daily.len(), 1);
        assert_eq!(report.daily[0].gain, 50.0);
        let indexes: Vec<_> = report.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![1, 2]);
        assert_eq!(report.rejected[0].date, "not a date");

        let strict = report.into_strict();
        assert!(matches!(strict, Err(crate::AnalyticsError::InvalidEntries(ref r)) if r.len() == 2));
    }

    #[test]
    fn only_invalid_entries_yield_no_data() {
        let report = compute_metrics(&[RawEntry::new("??")], 500.0, 1.0);
        assert!(report.is_empty());
        assert!(report.monthly.is_empty());
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn non_finite_amounts_are_treated_as_zero() {
        let entries = vec![RawEntry::new("2024-01-01").with_gain(f64::NAN).with_loss(f64::INFINITY)];
        let report = compute_metrics(&entries, 10.0, 1.0);
        assert_eq!(report.daily[0].gain, 0.0);
        assert_eq!(report.daily[0].loss, 0.0);
        assert_eq!(report.daily[0].balance, 10.0);
    }

    #[test]
    fn exchange_rate_only_affects_converted_withdrawals() {
        let entries = vec![
            RawEntry::new("2024-01-01").with_withdrawal(20.0),
            RawEntry::new("2024-01-05").with_withdrawal(5.0).with_deposit(100.0),
        ];
        let plain = compute_metrics(&entries, 1000.0, 1.0);
        let converted = compute_metrics(&entries, 1000.0, 80.0);

        assert_eq!(converted.daily[0].cumulative_withdrawal_converted, 1600.0);
        assert_eq!(converted.daily[1].cumulative_withdrawal_converted, 2000.0);
        assert_eq!(converted.monthly[0].cumulative_withdrawal_converted, 2000.0);
        for (a, b) in plain.daily.iter().zip(&converted.daily) {
            assert_eq!(a.balance, b.balance);
        }
        assert_eq!(converted.daily[1].balance, 1000.0 - 25.0 + 100.0);
    }

    #[test]
    fn running_totals_continue_across_months() {
        let entries = vec![
            RawEntry::new("2024-01-30").with_gain(10.0).with_deposit(100.0),
            RawEntry::new("2024-01-31").with_loss(4.0),
            RawEntry::new("2024-02-01").with_gain(6.0).with_withdrawal(50.0),
            RawEntry::new("2024-03-15").with_loss(1.0),
        ];
        let report = compute_metrics(&entries, 0.0, 1.0);

        assert_eq!(report.monthly.len(), 3);
        let [jan, feb, mar] = [&report.monthly[0], &report.monthly[1], &report.monthly[2]];

        assert_eq!(jan.gain, 10.0);
        assert_eq!(jan.loss, 4.0);
        assert_eq!(jan.net, 6.0);
        assert_eq!(jan.cumulative_net, 6.0);
        assert_eq!(jan.balance, 106.0);

        assert_eq!(feb.gain, 6.0);
        assert_eq!(feb.net, 6.0);
        assert_eq!(feb.cumulative_gain, 16.0);
        assert_eq!(feb.cumulative_net, 12.0);
        assert_eq!(feb.withdrawal, 50.0);
        assert_eq!(feb.cumulative_deposit, 100.0);
        assert_eq!(feb.balance, 62.0);

        assert_eq!(mar.serial, 3);
        assert_eq!(mar.cumulative_loss, 5.0);
        assert_eq!(mar.balance, 61.0);
        assert_eq!(report.closing_balance(), Some(61.0));
    }

    #[test]
    fn february_month_matches_final_day() {
        let entries: Vec<RawEntry> = (1..=28)
            .map(|day| {
                RawEntry::new(format!("2023-02-{day:02}"))
                    .with_gain(day as f64)
                    .with_loss(0.5)
                    .with_withdrawal(if day % 7 == 0 { 10.0 } else { 0.0 })
                    .with_deposit(if day == 1 { 200.0 } else { 0.0 })
            })
            .collect();
        let report = compute_metrics(&entries, 1000.0, 3.0);

        assert_eq!(report.daily.len(), 28);
        assert_eq!(report.monthly.len(), 1);
        let last_day = report.daily.last().unwrap();
        let month = &report.monthly[0];
        assert_eq!(month.cumulative_gain, last_day.cumulative_gain);
        assert_eq!(month.cumulative_loss, last_day.cumulative_loss);
        assert_eq!(month.cumulative_net, last_day.cumulative_net);
        assert_eq!(month.cumulative_withdrawal, last_day.cumulative_withdrawal);
        assert_eq!(month.cumulative_withdrawal_converted, last_day.cumulative_withdrawal_converted);
        assert_eq!(month.cumulative_deposit, last_day.cumulative_deposit);
        assert_eq!(month.balance, last_day.balance);
        assert_eq!(month.withdrawal, 40.0);
    }

    #[test]
    fn negative_net_moves_balance_down() {
        let entries = vec![
            RawEntry::new("2024-06-01").with_loss(300.0),
            RawEntry::new("2024-06-02").with_gain(100.0),
        ];
        let report = compute_metrics(&entries, 500.0, 1.0);
        assert_eq!(report.daily[0].balance, 200.0);
        assert_eq!(report.daily[1].balance, 300.0);
        assert_eq!(report.daily[0].cumulative_net, -300.0);
    }
}
