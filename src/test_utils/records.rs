//! Record fixtures shared by unit tests.

use time::Date;

use crate::{
    delivery::{Delivery, DeliveryForm},
    gas::{GasEntry, GasEntryForm},
};

pub(crate) fn delivery(order_number: &str, date: Date, fee: f64) -> Delivery {
    Delivery::build(order_number, date).fee(Some(fee)).finalize()
}

pub(crate) fn pending_delivery(order_number: &str, date: Date) -> Delivery {
    Delivery::build(order_number, date).finalize()
}

pub(crate) fn gas(date: Date, amount: f64) -> GasEntry {
    GasEntry::build(amount, date).finalize()
}

pub(crate) fn delivery_form(order_number: &str, date: &str, fee: Option<&str>) -> DeliveryForm {
    DeliveryForm {
        order_number: order_number.to_owned(),
        date: date.to_owned(),
        fee: fee.map(str::to_owned),
        ..Default::default()
    }
}

pub(crate) fn gas_form(date: &str, amount: &str) -> GasEntryForm {
    GasEntryForm {
        date: date.to_owned(),
        amount: amount.to_owned(),
        ..Default::default()
    }
}
