//! Deliveries and the fees earned for them.
//!
//! This module contains the `Delivery` model, its builder, and the
//! unvalidated `DeliveryForm` used for user input and CSV rows.

mod core;
mod form;

pub use core::{Delivery, DeliveryBuilder, DeliveryStatus};
pub use form::DeliveryForm;

pub(crate) use form::non_blank;
