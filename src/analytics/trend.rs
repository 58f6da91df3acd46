//! Comparing the first and second half of the recorded period.
//!
//! Each collection is sorted by date and split by count at `floor(n / 2)`,
//! so the halves hold the same number of records rather than the same number
//! of days. Deliveries and fuel expenses are split independently.

use std::collections::HashSet;

use serde::Serialize;

use crate::{delivery::Delivery, gas::GasEntry};

/// Totals for the two halves of a sorted series and the change between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HalfComparison {
    /// The total of the earlier half.
    pub first_half: f64,
    /// The total of the later half.
    pub second_half: f64,
    /// The change from the first to the second half in percent.
    pub change_percent: f64,
}

/// Fee, delivery count and fuel expense trends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendComparison {
    /// The trend in delivery fees.
    pub fees: HalfComparison,
    /// The number of deliveries in each half.
    pub delivery_count: HalfComparison,
    /// The trend in fuel expenses.
    pub gas: HalfComparison,
}

/// The outcome of a trend comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Trend {
    /// Deliveries span fewer than two distinct dates.
    InsufficientData,
    /// The halves were compared.
    Compared(TrendComparison),
}

/// The percentage change from `first` to `second`.
///
/// A change from zero to a nonzero value counts as +100%; zero to zero is 0%.
pub fn percentage_change(first: f64, second: f64) -> f64 {
    if first == 0.0 {
        if second == 0.0 { 0.0 } else { 100.0 }
    } else {
        (second - first) / first.abs() * 100.0
    }
}

/// Compare the first and second half of the delivery fees and fuel expenses.
///
/// Returns [Trend::InsufficientData] unless deliveries were made on at least
/// two distinct dates.
pub fn compare_halves(deliveries: &[Delivery], gas_entries: &[GasEntry]) -> Trend {
    let distinct_dates = deliveries
        .iter()
        .map(|delivery| delivery.date)
        .collect::<HashSet<_>>()
        .len();

    if distinct_dates < 2 {
        return Trend::InsufficientData;
    }

    let mut fees: Vec<_> = deliveries
        .iter()
        .map(|delivery| (delivery.date, delivery.fee_or_zero()))
        .collect();
    let mut gas: Vec<_> = gas_entries
        .iter()
        .map(|entry| (entry.date, entry.amount))
        .collect();

    let mut counts: Vec<_> = deliveries.iter().map(|delivery| (delivery.date, 1.0)).collect();

    Trend::Compared(TrendComparison {
        fees: compare_sorted_halves(&mut fees),
        delivery_count: compare_sorted_halves(&mut counts),
        gas: compare_sorted_halves(&mut gas),
    })
}

fn compare_sorted_halves<K: Ord>(values: &mut [(K, f64)]) -> HalfComparison {
    // Stable, so records on the same date keep their recorded order.
    values.sort_by(|a, b| a.0.cmp(&b.0));

    let (first, second) = values.split_at(values.len() / 2);
    let first_half: f64 = first.iter().map(|(_, value)| value).sum();
    let second_half: f64 = second.iter().map(|(_, value)| value).sum();

    HalfComparison {
        first_half,
        second_half,
        change_percent: percentage_change(first_half, second_half),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        analytics::{Trend, compare_halves, percentage_change},
        test_utils::{delivery, gas},
    };

    #[test]
    fn doubling_fees_is_one_hundred_percent() {
        let deliveries = [
            delivery("2", date!(2024 - 01 - 02), 20.0),
            delivery("1", date!(2024 - 01 - 01), 10.0),
        ];

        let Trend::Compared(trend) = compare_halves(&deliveries, &[]) else {
            panic!("expected a comparison");
        };

        assert_eq!(trend.fees.first_half, 10.0);
        assert_eq!(trend.fees.second_half, 20.0);
        assert_eq!(trend.fees.change_percent, 100.0);
    }

    #[test]
    fn needs_two_distinct_dates() {
        let deliveries = [
            delivery("1", date!(2024 - 01 - 01), 10.0),
            delivery("2", date!(2024 - 01 - 01), 20.0),
        ];

        assert_eq!(compare_halves(&deliveries, &[]), Trend::InsufficientData);
        assert_eq!(compare_halves(&[], &[]), Trend::InsufficientData);
    }

    #[test]
    fn odd_count_puts_extra_record_in_second_half() {
        let deliveries = [
            delivery("1", date!(2024 - 01 - 01), 10.0),
            delivery("2", date!(2024 - 01 - 02), 20.0),
            delivery("3", date!(2024 - 01 - 03), 30.0),
        ];

        let Trend::Compared(trend) = compare_halves(&deliveries, &[]) else {
            panic!("expected a comparison");
        };

        assert_eq!(trend.fees.first_half, 10.0);
        assert_eq!(trend.fees.second_half, 50.0);
        assert_eq!(trend.fees.change_percent, 400.0);
        assert_eq!(trend.delivery_count.first_half, 1.0);
        assert_eq!(trend.delivery_count.second_half, 2.0);
        assert_eq!(trend.delivery_count.change_percent, 100.0);
    }

    #[test]
    fn gas_is_split_independently() {
        let deliveries = [
            delivery("1", date!(2024 - 01 - 01), 10.0),
            delivery("2", date!(2024 - 01 - 05), 10.0),
        ];
        let gas_entries = [
            gas(date!(2024 - 01 - 04), 30.0),
            gas(date!(2024 - 01 - 02), 40.0),
            gas(date!(2024 - 01 - 03), 20.0),
            gas(date!(2024 - 01 - 01), 60.0),
        ];

        let Trend::Compared(trend) = compare_halves(&deliveries, &gas_entries) else {
            panic!("expected a comparison");
        };

        assert_eq!(trend.gas.first_half, 100.0);
        assert_eq!(trend.gas.second_half, 50.0);
        assert_eq!(trend.gas.change_percent, -50.0);
        assert_eq!(trend.fees.change_percent, 0.0);
    }

    #[test]
    fn change_from_zero() {
        assert_eq!(percentage_change(0.0, 0.0), 0.0);
        assert_eq!(percentage_change(0.0, 15.0), 100.0);
        assert_eq!(percentage_change(0.0, -15.0), 100.0);
    }

    #[test]
    fn change_from_negative_uses_absolute_base() {
        assert_eq!(percentage_change(-10.0, 10.0), 200.0);
    }
}
