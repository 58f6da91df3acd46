//! Unvalidated gas entry input.

use serde::{Deserialize, Serialize};

use crate::{
    RecordId,
    amount::parse_amount,
    date::parse_date,
    delivery::non_blank,
    gas::{GasEntry, GasEntryBuilder},
};

/// Form data for gas entry creation and editing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasEntryForm {
    /// An existing ID, e.g. from an extended CSV export.
    pub id: Option<String>,
    /// The date as `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub date: String,
    /// The amount paid.
    pub amount: String,
    /// An optional label.
    pub description: Option<String>,
    /// An encoded receipt photo.
    pub image: Option<String>,
}

impl GasEntryForm {
    /// Convert the form into a builder.
    ///
    /// Returns `None` if the date or amount cannot be parsed. Callers should
    /// run [crate::validate] first to get a description of what is wrong.
    pub fn to_builder(&self) -> Option<GasEntryBuilder> {
        let date = parse_date(&self.date)?;
        let amount = parse_amount(&self.amount)?;

        Some(
            GasEntry::build(amount, date)
                .id(self.id.as_deref().and_then(RecordId::new))
                .description(self.description.as_deref())
                .image(non_blank(self.image.as_deref()).map(str::to_owned)),
        )
    }
}

impl From<&GasEntry> for GasEntryForm {
    fn from(entry: &GasEntry) -> Self {
        Self {
            id: Some(entry.id.to_string()),
            date: entry.date.to_string(),
            amount: entry.amount.to_string(),
            description: Some(entry.description.clone()),
            image: entry.image.clone(),
        }
    }
}
