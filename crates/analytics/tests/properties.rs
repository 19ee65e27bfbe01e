//! Property-based tests for the metrics engine.
//!
//! These tests verify that ordering, running-total and reconciliation laws
//! hold for arbitrary entry collections, using the `proptest` crate.

use analytics::{MetricsEngine, compute_metrics};
use chrono::{Duration, NaiveDate};
use core_types::{Month, RawEntry};
use proptest::prelude::*;

// =============================================================================
// Generators
// =============================================================================

/// Generates a single entry within a ~5 month window, with amounts that carry
/// fractional cents so that summation order would matter if it were not fixed.
fn arb_entry() -> impl Strategy<Value = RawEntry> {
    (
        0i64..150,
        0.0f64..5_000.0,
        0.0f64..5_000.0,
        prop_oneof![Just(0.0f64), 0.0f64..1_000.0],
        prop_oneof![Just(0.0f64), 0.0f64..1_000.0],
    )
        .prop_map(|(offset, gain, loss, withdrawal, deposit)| {
            let base = NaiveDate::from_ymd_opt(2023, 11, 20).unwrap();
            let date = base + Duration::days(offset);
            RawEntry::new(date.format("%Y-%m-%d").to_string())
                .with_gain(gain)
                .with_loss(loss)
                .with_withdrawal(withdrawal)
                .with_deposit(deposit)
        })
}

fn arb_entries(max_count: usize) -> impl Strategy<Value = Vec<RawEntry>> {
    proptest::collection::vec(arb_entry(), 0..=max_count)
}

/// Generates a collection together with a shuffled copy of it.
fn arb_entries_and_shuffle() -> impl Strategy<Value = (Vec<RawEntry>, Vec<RawEntry>)> {
    arb_entries(60).prop_flat_map(|entries| {
        let shuffled = Just(entries.clone()).prop_shuffle();
        (Just(entries), shuffled)
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Calling the engine twice with the same arguments yields identical output.
    #[test]
    fn prop_computation_is_idempotent(entries in arb_entries(60), balance in -1e6f64..1e6, rate in 0.0f64..200.0) {
        let engine = MetricsEngine::new();
        let first = engine.compute(&entries, balance, rate);
        let second = engine.compute(&entries, balance, rate);
        prop_assert_eq!(first, second);
    }

    /// Input order has no influence on the output, down to the last bit.
    #[test]
    fn prop_order_invariance((entries, shuffled) in arb_entries_and_shuffle()) {
        let a = compute_metrics(&entries, 1_000.0, 80.0);
        let b = compute_metrics(&shuffled, 1_000.0, 80.0);
        prop_assert_eq!(a, b);
    }

    /// Dates are strictly increasing and serials are dense from 1.
    #[test]
    fn prop_daily_series_is_ordered_and_dense(entries in arb_entries(60)) {
        let report = compute_metrics(&entries, 0.0, 1.0);
        for (position, row) in report.daily.iter().enumerate() {
            prop_assert_eq!(row.serial, position + 1);
        }
        for pair in report.daily.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for pair in report.monthly.windows(2) {
            prop_assert!(pair[0].month < pair[1].month);
        }
    }

    /// cumulative[i] = cumulative[i-1] + value[i] for every running field.
    #[test]
    fn prop_running_total_law(entries in arb_entries(60), balance in -1e5f64..1e5) {
        let report = compute_metrics(&entries, balance, 1.0);
        if let Some(first) = report.daily.first() {
            prop_assert_eq!(first.cumulative_gain, first.gain);
            prop_assert_eq!(first.cumulative_loss, first.loss);
            prop_assert_eq!(first.cumulative_net, first.net);
            prop_assert_eq!(first.cumulative_withdrawal, first.withdrawal);
            prop_assert_eq!(first.cumulative_deposit, first.deposit);
        }
        for pair in report.daily.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            prop_assert_eq!(cur.cumulative_gain, prev.cumulative_gain + cur.gain);
            prop_assert_eq!(cur.cumulative_loss, prev.cumulative_loss + cur.loss);
            prop_assert_eq!(cur.cumulative_net, prev.cumulative_net + cur.net);
            prop_assert_eq!(cur.cumulative_withdrawal, prev.cumulative_withdrawal + cur.withdrawal);
            prop_assert_eq!(cur.cumulative_deposit, prev.cumulative_deposit + cur.deposit);
            prop_assert!(cur.cumulative_gain >= prev.cumulative_gain);
            prop_assert!(cur.cumulative_loss >= prev.cumulative_loss);
        }
        for row in &report.daily {
            prop_assert_eq!(row.net, row.gain - row.loss);
            let expected = balance + row.cumulative_net - row.cumulative_withdrawal + row.cumulative_deposit;
            prop_assert_eq!(row.balance, expected);
        }
    }

    /// Each month carries the running totals of its last day, so the final
    /// monthly balance always reconciles with the final daily balance.
    #[test]
    fn prop_monthly_series_reconciles_with_daily(entries in arb_entries(60), rate in 0.0f64..100.0) {
        let report = compute_metrics(&entries, 2_500.0, rate);
        prop_assert_eq!(report.daily.is_empty(), report.monthly.is_empty());

        for month in &report.monthly {
            let last_day = report
                .daily
                .iter()
                .filter(|row| Month::from(row.date) == month.month)
                .last()
                .expect("every month has at least one day");
            prop_assert_eq!(month.cumulative_gain, last_day.cumulative_gain);
            prop_assert_eq!(month.cumulative_net, last_day.cumulative_net);
            prop_assert_eq!(month.cumulative_withdrawal_converted, last_day.cumulative_withdrawal_converted);
            prop_assert_eq!(month.balance, last_day.balance);
        }

        if let (Some(last_month), Some(last_day)) = (report.monthly.last(), report.daily.last()) {
            prop_assert_eq!(last_month.balance, last_day.balance);
            prop_assert_eq!(last_month.cumulative_deposit, last_day.cumulative_deposit);
        }
    }
}
