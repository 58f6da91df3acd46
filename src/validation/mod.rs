//! Schema and business-rule checks for records before they enter the store.
//!
//! Field-level rules are declared per record kind in [rules] and evaluated by
//! one generic routine. Business rules (duplicate orders, suspicious fuel
//! expenses) only run once every field is well formed.

mod rules;

use std::fmt::Display;

use crate::{
    RecordId,
    date::{parse_date, to_display},
    delivery::{Delivery, DeliveryForm, non_blank},
    format::format_currency,
    gas::{GasEntry, GasEntryForm},
};

/// Gas entries above this amount are flagged as suspicious.
pub const SUSPICIOUS_GAS_AMOUNT: f64 = 500.0;

/// A record awaiting validation, tagged with its kind.
#[derive(Debug, Clone, Copy)]
pub enum Candidate<'a> {
    /// A delivery and its fee.
    Delivery(&'a DeliveryForm),
    /// A fuel expense.
    Gas(&'a GasEntryForm),
}

/// The records a candidate is checked against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The deliveries already recorded.
    pub deliveries: &'a [Delivery],
    /// The gas entries already recorded.
    pub gas_entries: &'a [GasEntry],
}

/// Options that change how strictly a candidate is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions<'a> {
    /// Skip the record with this ID when checking for duplicates, so that an
    /// edited record is not reported as a duplicate of itself.
    pub exclude_id: Option<&'a RecordId>,
    /// Treat suspicious values as errors.
    pub strict: bool,
}

/// A problem with a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The name of the field, e.g. "orderNumber".
    pub field: &'static str,
    /// A message that can be shown to the user.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The outcome of validating a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that prevent the record from being saved.
    pub errors: Vec<FieldError>,
    /// Advisory findings, e.g. an unusually large fuel expense.
    pub warnings: Vec<FieldError>,
}

impl ValidationReport {
    /// Whether the record may be saved.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any advisory finding was raised.
    pub fn is_suspicious(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether an error was reported for `field`.
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self
            .errors
            .iter()
            .map(|error| error.message.as_str())
            .collect();

        write!(f, "{}", messages.join("; "))
    }
}

/// Validate `candidate` against the records in `context`.
///
/// Never fails: every problem is described in the returned report.
pub fn validate(
    candidate: Candidate<'_>,
    context: &ValidationContext<'_>,
    options: ValidationOptions<'_>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    match candidate {
        Candidate::Delivery(form) => {
            rules::check_fields(form, rules::DELIVERY_RULES, &mut report.errors);

            if report.is_valid() {
                check_id_is_unused(form.id.as_deref(), context, options, &mut report);
                check_duplicate_order(form, context, options, &mut report);
            }
        }
        Candidate::Gas(form) => {
            rules::check_fields(form, rules::GAS_ENTRY_RULES, &mut report.errors);

            if report.is_valid() {
                check_id_is_unused(form.id.as_deref(), context, options, &mut report);
                check_suspicious_gas_entry(form, context, options, &mut report);
            }
        }
    }

    if options.strict {
        report.errors.extend(report.warnings.iter().cloned());
    }

    if !report.is_valid() {
        tracing::debug!("Validation failed: {report}");
    }

    report
}

fn is_excluded(id: &RecordId, options: ValidationOptions<'_>) -> bool {
    options.exclude_id == Some(id)
}

fn check_id_is_unused(
    id: Option<&str>,
    context: &ValidationContext<'_>,
    options: ValidationOptions<'_>,
    report: &mut ValidationReport,
) {
    let Some(id) = non_blank(id).and_then(RecordId::new) else {
        return;
    };

    if is_excluded(&id, options) {
        return;
    }

    let in_use = context.deliveries.iter().any(|delivery| delivery.id == id)
        || context.gas_entries.iter().any(|entry| entry.id == id);

    if in_use {
        report.errors.push(FieldError::new(
            "id",
            format!("the ID {id} is already in use"),
        ));
    }
}

fn check_duplicate_order(
    form: &DeliveryForm,
    context: &ValidationContext<'_>,
    options: ValidationOptions<'_>,
    report: &mut ValidationReport,
) {
    let Some(date) = parse_date(&form.date) else {
        return;
    };
    let order_number = form.order_number.trim();

    let is_duplicate = context.deliveries.iter().any(|delivery| {
        !is_excluded(&delivery.id, options)
            && delivery.date == date
            && delivery.order_number == order_number
    });

    if is_duplicate {
        report.errors.push(FieldError::new(
            "orderNumber",
            format!(
                "order {order_number} was already recorded on {}",
                to_display(date)
            ),
        ));
    }
}

fn check_suspicious_gas_entry(
    form: &GasEntryForm,
    context: &ValidationContext<'_>,
    options: ValidationOptions<'_>,
    report: &mut ValidationReport,
) {
    let Some(entry) = form.to_builder() else {
        return;
    };

    if entry.amount > SUSPICIOUS_GAS_AMOUNT {
        report.warnings.push(FieldError::new(
            "amount",
            format!(
                "{} is an unusually large fuel expense, check that it is correct",
                format_currency(entry.amount)
            ),
        ));
    }

    let same_day = context
        .gas_entries
        .iter()
        .any(|existing| !is_excluded(&existing.id, options) && existing.date == entry.date);

    if same_day {
        report.warnings.push(FieldError::new(
            "date",
            format!(
                "a fuel expense was already recorded on {}",
                to_display(entry.date)
            ),
        ));
    }
}
