//! Per-day summaries and the best and worst days.

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::{date::serialize_iso, delivery::Delivery, gas::GasEntry};

/// Deliveries, fuel expenses and profit for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DaySummary {
    /// The day.
    #[serde(serialize_with = "serialize_iso")]
    pub date: Date,
    /// The number of deliveries made on this day.
    pub delivery_count: usize,
    /// The sum of fees earned on this day.
    pub total_fees: f64,
    /// The sum of fuel expenses on this day.
    pub total_gas: f64,
    /// Fees minus fuel expenses.
    pub profit: f64,
}

impl DaySummary {
    fn empty(date: Date) -> Self {
        Self {
            date,
            delivery_count: 0,
            total_fees: 0.0,
            total_gas: 0.0,
            profit: 0.0,
        }
    }

    /// The mean fee per delivery, 0 on days without deliveries.
    pub fn average_fee(&self) -> f64 {
        if self.delivery_count == 0 {
            0.0
        } else {
            self.total_fees / self.delivery_count as f64
        }
    }
}

/// The most and least profitable days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BestWorstDays {
    /// The day with the highest profit.
    pub best: DaySummary,
    /// The day with the lowest profit.
    pub worst: DaySummary,
}

/// Group deliveries and fuel expenses by date.
///
/// Returns one summary per date that has a delivery or a fuel expense, in
/// chronological order.
pub fn group_by_date(deliveries: &[Delivery], gas_entries: &[GasEntry]) -> Vec<DaySummary> {
    let mut days: BTreeMap<Date, DaySummary> = BTreeMap::new();

    for delivery in deliveries {
        let day = days
            .entry(delivery.date)
            .or_insert_with(|| DaySummary::empty(delivery.date));
        day.delivery_count += 1;
        day.total_fees += delivery.fee_or_zero();
    }

    for entry in gas_entries {
        let day = days
            .entry(entry.date)
            .or_insert_with(|| DaySummary::empty(entry.date));
        day.total_gas += entry.amount;
    }

    days.into_values()
        .map(|mut day| {
            day.profit = day.total_fees - day.total_gas;
            day
        })
        .collect()
}

/// Find the best and worst days among `days`.
///
/// The best day has the highest profit, ties going to the day with more
/// deliveries. The worst day has the lowest profit, ties going to the day with
/// the lower average fee. Remaining ties keep the earlier entry.
/// Returns `None` when `days` is empty.
pub fn best_and_worst_days(days: &[DaySummary]) -> Option<BestWorstDays> {
    let (first, rest) = days.split_first()?;
    let mut best = first;
    let mut worst = first;

    for day in rest {
        if day.profit > best.profit
            || (day.profit == best.profit && day.delivery_count > best.delivery_count)
        {
            best = day;
        }

        if day.profit < worst.profit
            || (day.profit == worst.profit && day.average_fee() < worst.average_fee())
        {
            worst = day;
        }
    }

    Some(BestWorstDays {
        best: *best,
        worst: *worst,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        analytics::{best_and_worst_days, group_by_date},
        test_utils::{delivery, gas, pending_delivery},
    };

    #[test]
    fn empty_input_has_no_days() {
        let days = group_by_date(&[], &[]);

        assert!(days.is_empty());
        assert_eq!(best_and_worst_days(&days), None);
    }

    #[test]
    fn groups_both_collections_by_date() {
        let deliveries = [
            delivery("1", date!(2024 - 01 - 02), 10.0),
            delivery("2", date!(2024 - 01 - 01), 20.0),
            pending_delivery("3", date!(2024 - 01 - 01)),
        ];
        let gas_entries = [
            gas(date!(2024 - 01 - 01), 5.0),
            gas(date!(2024 - 01 - 03), 30.0),
        ];

        let days = group_by_date(&deliveries, &gas_entries);

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, date!(2024 - 01 - 01));
        assert_eq!(days[0].delivery_count, 2);
        assert_eq!(days[0].total_fees, 20.0);
        assert_eq!(days[0].total_gas, 5.0);
        assert_eq!(days[0].profit, 15.0);
        assert_eq!(days[1].profit, 10.0);
        assert_eq!(days[2].delivery_count, 0);
        assert_eq!(days[2].profit, -30.0);
    }

    #[test]
    fn single_day_is_both_best_and_worst() {
        let deliveries = [delivery("1", date!(2024 - 01 - 01), 50.0)];
        let gas_entries = [gas(date!(2024 - 01 - 01), 20.0)];

        let days = group_by_date(&deliveries, &gas_entries);
        let result = best_and_worst_days(&days).unwrap();

        assert_eq!(result.best.date, date!(2024 - 01 - 01));
        assert_eq!(result.worst.date, date!(2024 - 01 - 01));
        assert_eq!(result.best.profit, 30.0);
        assert_eq!(result.worst.profit, 30.0);
    }

    #[test]
    fn best_tie_goes_to_more_deliveries() {
        let deliveries = [
            delivery("1", date!(2024 - 01 - 01), 30.0),
            delivery("2", date!(2024 - 01 - 02), 10.0),
            delivery("3", date!(2024 - 01 - 02), 20.0),
        ];

        let days = group_by_date(&deliveries, &[]);
        let result = best_and_worst_days(&days).unwrap();

        assert_eq!(result.best.date, date!(2024 - 01 - 02));
    }

    #[test]
    fn worst_tie_goes_to_lower_average_fee() {
        // Both days make a profit of 10, but the second averages 5 per delivery.
        let deliveries = [
            delivery("1", date!(2024 - 01 - 01), 10.0),
            delivery("2", date!(2024 - 01 - 02), 5.0),
            delivery("3", date!(2024 - 01 - 02), 5.0),
            delivery("4", date!(2024 - 01 - 03), 100.0),
        ];

        let days = group_by_date(&deliveries, &[]);
        let result = best_and_worst_days(&days).unwrap();

        assert_eq!(result.worst.date, date!(2024 - 01 - 02));
        assert_eq!(result.best.date, date!(2024 - 01 - 03));
    }
}
