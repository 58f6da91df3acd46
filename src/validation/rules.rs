//! Declarative field rules for each record kind.

use crate::{
    amount::parse_amount,
    date::is_canonical,
    delivery::{DeliveryForm, DeliveryStatus},
    gas::GasEntryForm,
    validation::FieldError,
};

/// A single field check.
///
/// Blank values fail `required` fields and skip `check` otherwise.
pub(super) struct FieldRule<F> {
    /// The field name reported in errors.
    pub field: &'static str,
    /// A human readable name for the field.
    pub label: &'static str,
    pub required: bool,
    pub value: fn(&F) -> Option<&str>,
    pub check: fn(&str) -> bool,
    /// Reported when `check` fails.
    pub message: &'static str,
}

pub(super) static DELIVERY_RULES: &[FieldRule<DeliveryForm>] = &[
    FieldRule {
        field: "orderNumber",
        label: "order number",
        required: true,
        value: order_number,
        check: always_valid,
        message: "",
    },
    FieldRule {
        field: "date",
        label: "date",
        required: true,
        value: delivery_date,
        check: is_date,
        message: "date must be a valid date in the form YYYY-MM-DD",
    },
    FieldRule {
        field: "fee",
        label: "fee",
        required: false,
        value: fee,
        check: is_non_negative_amount,
        message: "fee must be a number greater than or equal to zero",
    },
    FieldRule {
        field: "status",
        label: "status",
        required: false,
        value: status,
        check: is_status,
        message: "status must be either \"Pendente\" or \"Concluída\"",
    },
];

pub(super) static GAS_ENTRY_RULES: &[FieldRule<GasEntryForm>] = &[
    FieldRule {
        field: "date",
        label: "date",
        required: true,
        value: gas_date,
        check: is_date,
        message: "date must be a valid date in the form YYYY-MM-DD",
    },
    FieldRule {
        field: "amount",
        label: "amount",
        required: true,
        value: amount,
        check: is_positive_amount,
        message: "amount must be a number greater than zero",
    },
];

/// Evaluate `rules` against `form`, appending a [FieldError] for each failure.
pub(super) fn check_fields<F>(form: &F, rules: &[FieldRule<F>], errors: &mut Vec<FieldError>) {
    for rule in rules {
        let value = (rule.value)(form)
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match value {
            None if rule.required => {
                errors.push(FieldError::new(
                    rule.field,
                    format!("{} is required", rule.label),
                ));
            }
            Some(value) if !(rule.check)(value) => {
                errors.push(FieldError::new(rule.field, rule.message));
            }
            _ => {}
        }
    }
}

fn order_number(form: &DeliveryForm) -> Option<&str> {
    Some(&form.order_number)
}

fn delivery_date(form: &DeliveryForm) -> Option<&str> {
    Some(&form.date)
}

fn fee(form: &DeliveryForm) -> Option<&str> {
    form.fee.as_deref()
}

fn status(form: &DeliveryForm) -> Option<&str> {
    form.status.as_deref()
}

fn gas_date(form: &GasEntryForm) -> Option<&str> {
    Some(&form.date)
}

fn amount(form: &GasEntryForm) -> Option<&str> {
    Some(&form.amount)
}

fn always_valid(_: &str) -> bool {
    true
}

fn is_date(value: &str) -> bool {
    is_canonical(value)
}

fn is_non_negative_amount(value: &str) -> bool {
    parse_amount(value).is_some_and(|amount| amount >= 0.0)
}

fn is_positive_amount(value: &str) -> bool {
    parse_amount(value).is_some_and(|amount| amount > 0.0)
}

fn is_status(value: &str) -> bool {
    DeliveryStatus::parse(value).is_some()
}
