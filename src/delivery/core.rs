//! Defines the core data model for deliveries.

use time::Date;

use crate::RecordId;

// ============================================================================
// MODELS
// ============================================================================

/// Whether a delivery has been paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The fee has not been recorded yet.
    Pending,
    /// The fee has been recorded.
    Completed,
}

impl DeliveryStatus {
    /// Parse a status word in either English or Portuguese, ignoring case.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "pending" | "pendente" => Some(Self::Pending),
            "completed" | "concluída" | "concluida" | "concluído" | "concluido" => {
                Some(Self::Completed)
            }
            _ => None,
        }
    }

    /// The machine-readable name used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// The Portuguese label used in CSV files and on screen.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Completed => "Concluída",
        }
    }
}

/// A single delivery and the fee earned for it.
///
/// To create a new `Delivery`, use [Delivery::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// The ID of the delivery.
    pub id: RecordId,
    /// The order or ticket number given by the platform, never empty.
    pub order_number: String,
    /// The day the delivery was made.
    pub date: Date,
    /// The fee earned, `None` or zero while the delivery is pending.
    pub fee: Option<f64>,
    /// An encoded photo of the receipt, stored as-is.
    pub image: Option<String>,
    /// A status chosen by the user that takes precedence over the status
    /// derived from the fee.
    pub status_override: Option<DeliveryStatus>,
}

impl Delivery {
    /// Create a new delivery.
    ///
    /// Shortcut for [DeliveryBuilder] for discoverability.
    pub fn build(order_number: &str, date: Date) -> DeliveryBuilder {
        DeliveryBuilder {
            id: None,
            order_number: order_number.trim().to_owned(),
            date,
            fee: None,
            image: None,
            status_override: None,
        }
    }

    /// The fee, counting a pending delivery as zero.
    pub fn fee_or_zero(&self) -> f64 {
        self.fee.unwrap_or(0.0)
    }

    /// The status derived from the fee unless the user has overridden it.
    pub fn status(&self) -> DeliveryStatus {
        self.status_override.unwrap_or(self.derived_status())
    }

    /// The status implied by the fee alone: completed once a fee is recorded.
    pub fn derived_status(&self) -> DeliveryStatus {
        if self.fee_or_zero() > 0.0 {
            DeliveryStatus::Completed
        } else {
            DeliveryStatus::Pending
        }
    }

    /// Drop an override that agrees with the derived status.
    pub fn without_redundant_override(self) -> Self {
        let status_override = self
            .status_override
            .filter(|&status| status != self.derived_status());

        Self {
            status_override,
            ..self
        }
    }
}

/// A builder for creating [Delivery] instances.
///
/// ```ignore
/// use time::macros::date;
///
/// let delivery = Delivery::build("PED-1042", date!(2024 - 03 - 05))
///     .fee(Some(12.5))
///     .finalize();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryBuilder {
    /// An existing ID, e.g. from an import. A new ID is generated if `None`.
    pub id: Option<RecordId>,
    /// The trimmed order number.
    pub order_number: String,
    /// The day of the delivery.
    pub date: Date,
    /// The fee, if known.
    pub fee: Option<f64>,
    /// An encoded receipt photo.
    pub image: Option<String>,
    /// An explicit status chosen by the user.
    pub status_override: Option<DeliveryStatus>,
}

impl DeliveryBuilder {
    /// Set the ID for the delivery.
    pub fn id(mut self, id: Option<RecordId>) -> Self {
        self.id = id;
        self
    }

    /// Set the fee for the delivery.
    pub fn fee(mut self, fee: Option<f64>) -> Self {
        self.fee = fee;
        self
    }

    /// Set the receipt image for the delivery.
    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// Override the status derived from the fee.
    pub fn status_override(mut self, status: Option<DeliveryStatus>) -> Self {
        self.status_override = status;
        self
    }

    /// Create the delivery, generating an ID if none was set.
    pub fn finalize(self) -> Delivery {
        Delivery {
            id: self.id.unwrap_or_else(RecordId::generate),
            order_number: self.order_number,
            date: self.date,
            fee: self.fee,
            image: self.image,
            status_override: self.status_override,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        RecordId,
        delivery::{Delivery, DeliveryStatus},
    };

    #[test]
    fn status_is_derived_from_fee() {
        let pending = Delivery::build("1", date!(2024 - 01 - 01)).finalize();
        let zero_fee = Delivery::build("2", date!(2024 - 01 - 01))
            .fee(Some(0.0))
            .finalize();
        let completed = Delivery::build("3", date!(2024 - 01 - 01))
            .fee(Some(8.0))
            .finalize();

        assert_eq!(pending.status(), DeliveryStatus::Pending);
        assert_eq!(zero_fee.status(), DeliveryStatus::Pending);
        assert_eq!(completed.status(), DeliveryStatus::Completed);
    }

    #[test]
    fn status_override_wins_over_fee() {
        let delivery = Delivery::build("1", date!(2024 - 01 - 01))
            .fee(Some(8.0))
            .status_override(Some(DeliveryStatus::Pending))
            .finalize();

        assert_eq!(delivery.status(), DeliveryStatus::Pending);
    }

    #[test]
    fn finalize_keeps_existing_id() {
        let id = RecordId::new("abc").unwrap();

        let delivery = Delivery::build("1", date!(2024 - 01 - 01))
            .id(Some(id.clone()))
            .finalize();

        assert_eq!(delivery.id, id);
    }

    #[test]
    fn build_trims_order_number() {
        let delivery = Delivery::build("  PED-7 ", date!(2024 - 01 - 01)).finalize();

        assert_eq!(delivery.order_number, "PED-7");
    }

    #[test]
    fn parses_status_words() {
        assert_eq!(DeliveryStatus::parse("Pendente"), Some(DeliveryStatus::Pending));
        assert_eq!(
            DeliveryStatus::parse(" CONCLUÍDA "),
            Some(DeliveryStatus::Completed)
        );
        assert_eq!(
            DeliveryStatus::parse("completed"),
            Some(DeliveryStatus::Completed)
        );
        assert_eq!(DeliveryStatus::parse("maybe"), None);
    }
}
