//! Defines the core data model for fuel expenses.

use time::Date;

use crate::RecordId;

/// The description used when a gas entry is recorded without one.
pub const DEFAULT_GAS_DESCRIPTION: &str = "Abastecimento";

/// A single fill-up and what it cost.
///
/// To create a new `GasEntry`, use [GasEntry::build].
#[derive(Debug, Clone, PartialEq)]
pub struct GasEntry {
    /// The ID of the gas entry.
    pub id: RecordId,
    /// The day of the fill-up.
    pub date: Date,
    /// The amount paid, always greater than zero.
    pub amount: f64,
    /// A free text label, e.g. the name of the station.
    pub description: String,
    /// An encoded photo of the receipt, stored as-is.
    pub image: Option<String>,
}

impl GasEntry {
    /// Create a new gas entry.
    ///
    /// Shortcut for [GasEntryBuilder] for discoverability.
    pub fn build(amount: f64, date: Date) -> GasEntryBuilder {
        GasEntryBuilder {
            id: None,
            date,
            amount,
            description: DEFAULT_GAS_DESCRIPTION.to_owned(),
            image: None,
        }
    }
}

/// A builder for creating [GasEntry] instances.
#[derive(Debug, Clone, PartialEq)]
pub struct GasEntryBuilder {
    /// An existing ID. A new ID is generated if `None`.
    pub id: Option<RecordId>,
    /// The day of the fill-up.
    pub date: Date,
    /// The amount paid.
    pub amount: f64,
    /// Defaults to [DEFAULT_GAS_DESCRIPTION].
    pub description: String,
    /// An encoded receipt photo.
    pub image: Option<String>,
}

impl GasEntryBuilder {
    /// Set the ID for the gas entry.
    pub fn id(mut self, id: Option<RecordId>) -> Self {
        self.id = id;
        self
    }

    /// Set the description, falling back to the default for blank text.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .unwrap_or(DEFAULT_GAS_DESCRIPTION)
            .to_owned();
        self
    }

    /// Set the receipt image for the gas entry.
    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// Create the gas entry, generating an ID if none was set.
    pub fn finalize(self) -> GasEntry {
        GasEntry {
            id: self.id.unwrap_or_else(RecordId::generate),
            date: self.date,
            amount: self.amount,
            description: self.description,
            image: self.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::gas::{DEFAULT_GAS_DESCRIPTION, GasEntry};

    #[test]
    fn description_defaults_to_placeholder() {
        let entry = GasEntry::build(50.0, date!(2024 - 01 - 01)).finalize();

        assert_eq!(entry.description, DEFAULT_GAS_DESCRIPTION);
    }

    #[test]
    fn blank_description_uses_placeholder() {
        let entry = GasEntry::build(50.0, date!(2024 - 01 - 01))
            .description(Some("   "))
            .finalize();

        assert_eq!(entry.description, DEFAULT_GAS_DESCRIPTION);
    }

    #[test]
    fn description_is_trimmed() {
        let entry = GasEntry::build(50.0, date!(2024 - 01 - 01))
            .description(Some(" Posto Ipiranga "))
            .finalize();

        assert_eq!(entry.description, "Posto Ipiranga");
    }
}
