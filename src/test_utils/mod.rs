#![allow(missing_docs)]

pub(crate) mod records;
pub(crate) mod storage;

pub(crate) use records::{delivery, delivery_form, gas, gas_form, pending_delivery};
pub(crate) use storage::FlakyStorage;
