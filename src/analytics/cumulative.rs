//! The running profit over time, as plotted by the profit evolution chart.

use serde::Serialize;
use time::Date;

use crate::{
    analytics::daily::group_by_date, date::serialize_iso, delivery::Delivery, gas::GasEntry,
};

/// One point of the profit evolution series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitPoint {
    /// The day.
    #[serde(serialize_with = "serialize_iso")]
    pub date: Date,
    /// Fees minus fuel expenses on this day.
    pub daily_profit: f64,
    /// The sum of daily profits up to and including this day.
    pub cumulative_profit: f64,
}

/// Build the cumulative profit series over every date with a record.
///
/// The series is in chronological order. It is empty when there are no
/// records and has a single point when every record is on the same date.
pub fn cumulative_profit(deliveries: &[Delivery], gas_entries: &[GasEntry]) -> Vec<ProfitPoint> {
    let mut cumulative = 0.0;

    group_by_date(deliveries, gas_entries)
        .into_iter()
        .map(|day| {
            cumulative += day.profit;

            ProfitPoint {
                date: day.date,
                daily_profit: day.profit,
                cumulative_profit: cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        analytics::cumulative_profit,
        test_utils::{delivery, gas},
    };

    #[test]
    fn empty_input_gives_empty_series() {
        assert!(cumulative_profit(&[], &[]).is_empty());
    }

    #[test]
    fn accumulates_daily_profit_in_date_order() {
        let deliveries = [
            delivery("3", date!(2024 - 01 - 03), 20.0),
            delivery("1", date!(2024 - 01 - 01), 10.0),
        ];
        let gas_entries = [gas(date!(2024 - 01 - 02), 5.0)];

        let series = cumulative_profit(&deliveries, &gas_entries);

        let dates: Vec<_> = series.iter().map(|point| point.date).collect();
        let daily: Vec<_> = series.iter().map(|point| point.daily_profit).collect();
        let cumulative: Vec<_> = series.iter().map(|point| point.cumulative_profit).collect();
        assert_eq!(
            dates,
            [
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 02),
                date!(2024 - 01 - 03)
            ]
        );
        assert_eq!(daily, [10.0, -5.0, 20.0]);
        assert_eq!(cumulative, [10.0, 5.0, 25.0]);
    }

    #[test]
    fn single_date_gives_single_point() {
        let deliveries = [delivery("1", date!(2024 - 01 - 01), 10.0)];
        let gas_entries = [gas(date!(2024 - 01 - 01), 4.0)];

        let series = cumulative_profit(&deliveries, &gas_entries);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].cumulative_profit, 6.0);
    }
}
