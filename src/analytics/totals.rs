//! Overall totals and averages.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    delivery::{Delivery, DeliveryStatus},
    gas::GasEntry,
};

/// Totals over every recorded delivery and fuel expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// The sum of all delivery fees.
    pub total_fees: f64,
    /// The sum of all fuel expenses.
    pub total_gas: f64,
    /// Fees minus fuel expenses.
    pub net_profit: f64,
    /// Net profit as a percentage of fees, 0 when there are no fees.
    pub profit_margin: f64,
    /// The number of deliveries.
    pub delivery_count: usize,
    /// The number of deliveries with status completed.
    pub completed_count: usize,
    /// The number of deliveries with status pending.
    pub pending_count: usize,
    /// The number of fuel expenses.
    pub gas_entry_count: usize,
    /// The mean fee per delivery.
    pub average_fee: f64,
    /// The mean fuel expense per fill-up.
    pub average_gas: f64,
    /// The number of distinct days with at least one delivery.
    pub active_days: usize,
    /// The mean number of deliveries per active day.
    pub average_deliveries_per_day: f64,
}

/// Calculate the [Totals] for the given records.
///
/// All fields are zero when both slices are empty.
pub fn calculate_totals(deliveries: &[Delivery], gas_entries: &[GasEntry]) -> Totals {
    let total_fees: f64 = deliveries.iter().map(Delivery::fee_or_zero).sum();
    let total_gas: f64 = gas_entries.iter().map(|entry| entry.amount).sum();
    let net_profit = total_fees - total_gas;

    let profit_margin = if total_fees == 0.0 {
        0.0
    } else {
        net_profit / total_fees * 100.0
    };

    let completed_count = deliveries
        .iter()
        .filter(|delivery| delivery.status() == DeliveryStatus::Completed)
        .count();

    let active_days = deliveries
        .iter()
        .map(|delivery| delivery.date)
        .collect::<HashSet<_>>()
        .len();

    Totals {
        total_fees,
        total_gas,
        net_profit,
        profit_margin,
        delivery_count: deliveries.len(),
        completed_count,
        pending_count: deliveries.len() - completed_count,
        gas_entry_count: gas_entries.len(),
        average_fee: ratio(total_fees, deliveries.len()),
        average_gas: ratio(total_gas, gas_entries.len()),
        active_days,
        average_deliveries_per_day: ratio(deliveries.len() as f64, active_days),
    }
}

fn ratio(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}
