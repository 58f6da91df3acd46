//! Grouping deliveries by day of the week.

use serde::Serialize;
use time::Weekday;

use crate::{date::weekday_label, delivery::Delivery};

/// The order weekdays are listed and compared in, starting on Sunday.
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Sunday,
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
];

/// Delivery statistics for one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayStats {
    /// The day of the week.
    #[serde(skip)]
    pub weekday: Weekday,
    /// The Portuguese name of the day.
    pub label: &'static str,
    /// The number of deliveries made on this weekday.
    pub count: usize,
    /// The sum of the fees earned on this weekday.
    pub total_fees: f64,
    /// The mean fee per delivery, 0 when there were no deliveries.
    pub average_fee: f64,
}

/// Group deliveries by the weekday of their date.
///
/// Always returns seven entries in [WEEKDAY_ORDER]; weekdays without
/// deliveries have zero counts.
pub fn group_by_weekday(deliveries: &[Delivery]) -> Vec<WeekdayStats> {
    let mut counts = [0usize; 7];
    let mut fees = [0.0f64; 7];

    for delivery in deliveries {
        let index = delivery.date.weekday().number_days_from_sunday() as usize;
        counts[index] += 1;
        fees[index] += delivery.fee_or_zero();
    }

    WEEKDAY_ORDER
        .iter()
        .enumerate()
        .map(|(index, &weekday)| WeekdayStats {
            weekday,
            label: weekday_label(weekday),
            count: counts[index],
            total_fees: fees[index],
            average_fee: if counts[index] == 0 {
                0.0
            } else {
                fees[index] / counts[index] as f64
            },
        })
        .collect()
}

/// The weekday with the most deliveries.
///
/// Ties go to the weekday listed first in `stats`. Returns `None` when no
/// weekday has any deliveries.
pub fn peak_weekday(stats: &[WeekdayStats]) -> Option<&WeekdayStats> {
    stats
        .iter()
        .filter(|stat| stat.count > 0)
        .fold(None, |peak: Option<&WeekdayStats>, stat| match peak {
            Some(peak) if peak.count >= stat.count => Some(peak),
            _ => Some(stat),
        })
}
