//! Fuel expenses recorded at each fill-up.

mod core;
mod form;

pub use core::{DEFAULT_GAS_DESCRIPTION, GasEntry, GasEntryBuilder};
pub use form::GasEntryForm;
