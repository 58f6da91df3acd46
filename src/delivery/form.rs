//! Unvalidated delivery input, as typed into a form or read from a CSV row.

use serde::{Deserialize, Serialize};

use crate::{
    RecordId,
    amount::parse_amount,
    date::parse_date,
    delivery::{Delivery, DeliveryBuilder, DeliveryStatus},
};

/// Form data for delivery creation and editing.
///
/// Every field is kept as text so that validation can report exactly which
/// field is wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryForm {
    /// An existing ID, e.g. from an extended CSV export.
    pub id: Option<String>,
    /// The order number.
    pub order_number: String,
    /// The date as `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub date: String,
    /// The fee, blank while pending.
    pub fee: Option<String>,
    /// An encoded receipt photo.
    pub image: Option<String>,
    /// An explicit status, e.g. "Pendente".
    pub status: Option<String>,
}

impl DeliveryForm {
    /// Convert the form into a builder.
    ///
    /// Returns `None` if a required field cannot be parsed. Callers should
    /// run [crate::validate] first to get a description of what is wrong.
    pub fn to_builder(&self) -> Option<DeliveryBuilder> {
        let date = parse_date(&self.date)?;
        let fee = match non_blank(self.fee.as_deref()) {
            Some(fee) => Some(parse_amount(fee)?),
            None => None,
        };
        let status_override = match non_blank(self.status.as_deref()) {
            Some(status) => Some(DeliveryStatus::parse(status)?),
            None => None,
        };

        Some(
            Delivery::build(&self.order_number, date)
                .id(self.id.as_deref().and_then(RecordId::new))
                .fee(fee)
                .image(non_blank(self.image.as_deref()).map(str::to_owned))
                .status_override(status_override),
        )
    }
}

impl From<&Delivery> for DeliveryForm {
    fn from(delivery: &Delivery) -> Self {
        Self {
            id: Some(delivery.id.to_string()),
            order_number: delivery.order_number.clone(),
            date: delivery.date.to_string(),
            fee: delivery.fee.map(|fee| fee.to_string()),
            image: delivery.image.clone(),
            status: delivery.status_override.map(|status| status.as_str().to_owned()),
        }
    }
}

pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}
