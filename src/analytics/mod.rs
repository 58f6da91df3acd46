//! Derived figures for the dashboard.
//!
//! Every function here is pure: it reads the current deliveries and fuel
//! expenses and returns plain numbers, leaving rounding and currency display
//! to the caller. Zero records always give a defined empty result.

mod cumulative;
mod daily;
mod statistics;
mod totals;
mod trend;
mod weekday;

pub use cumulative::{ProfitPoint, cumulative_profit};
pub use daily::{BestWorstDays, DaySummary, best_and_worst_days, group_by_date};
pub use statistics::{ValueRange, mean, pearson_correlation, sample_std_dev, value_range};
pub use totals::{Totals, calculate_totals};
pub use trend::{HalfComparison, Trend, TrendComparison, compare_halves, percentage_change};
pub use weekday::{WEEKDAY_ORDER, WeekdayStats, group_by_weekday, peak_weekday};

use serde::Serialize;

use crate::{delivery::Delivery, gas::GasEntry};

/// Every dashboard figure computed from one snapshot of the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Overall totals and averages.
    pub totals: Totals,
    /// Delivery statistics per weekday, starting on Sunday.
    pub weekdays: Vec<WeekdayStats>,
    /// The weekday with the most deliveries.
    pub peak_weekday: Option<WeekdayStats>,
    /// Per-day figures in chronological order.
    pub days: Vec<DaySummary>,
    /// The most and least profitable days, `None` when there is no data.
    pub best_and_worst: Option<BestWorstDays>,
    /// First half versus second half of the period.
    pub trend: Trend,
    /// The running profit per day.
    pub profit_series: Vec<ProfitPoint>,
    /// The smallest and largest recorded fee.
    pub fee_range: Option<ValueRange>,
    /// The sample standard deviation of recorded fees.
    pub fee_std_dev: f64,
    /// See [weekday_fee_correlation].
    pub weekday_fee_correlation: f64,
}

impl DashboardSummary {
    /// Compute every figure for the given records.
    pub fn compute(deliveries: &[Delivery], gas_entries: &[GasEntry]) -> Self {
        tracing::debug!(
            "Computing dashboard for {} deliveries and {} gas entries",
            deliveries.len(),
            gas_entries.len()
        );

        let weekdays = group_by_weekday(deliveries);
        let peak_weekday = peak_weekday(&weekdays).cloned();
        let days = group_by_date(deliveries, gas_entries);
        let best_and_worst = best_and_worst_days(&days);
        let fees = recorded_fees(deliveries);

        Self {
            totals: calculate_totals(deliveries, gas_entries),
            weekday_fee_correlation: weekday_fee_correlation(&weekdays),
            peak_weekday,
            weekdays,
            days,
            best_and_worst,
            trend: compare_halves(deliveries, gas_entries),
            profit_series: cumulative_profit(deliveries, gas_entries),
            fee_range: value_range(&fees),
            fee_std_dev: sample_std_dev(&fees),
        }
    }
}

/// The fees of deliveries that have one recorded, in record order.
pub fn recorded_fees(deliveries: &[Delivery]) -> Vec<f64> {
    deliveries.iter().filter_map(|delivery| delivery.fee).collect()
}

/// The Pearson correlation between the average fee and the number of
/// deliveries across weekdays.
///
/// Only weekdays with at least one delivery take part. A positive value means
/// busier weekdays also pay more per delivery.
pub fn weekday_fee_correlation(stats: &[WeekdayStats]) -> f64 {
    let (counts, average_fees): (Vec<f64>, Vec<f64>) = stats
        .iter()
        .filter(|stat| stat.count > 0)
        .map(|stat| (stat.count as f64, stat.average_fee))
        .unzip();

    pearson_correlation(&average_fees, &counts)
}
