//! Loading persisted collections and repairing what can be repaired.
//!
//! Records written by older versions may lack an ID, carry a date in display
//! form, or store amounts as text. Such records are fixed in place and every
//! fix is logged. Records that cannot be fixed are reported and kept aside
//! for manual handling instead of being dropped.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value, json};
use time::Date;

use crate::{
    RecordId,
    amount::parse_amount,
    date::{is_canonical, parse_date, to_display, to_iso},
    delivery::{Delivery, DeliveryStatus},
    gas::GasEntry,
    storage::PersistenceError,
};

/// A field that was fixed while loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repair {
    /// The storage key of the collection the record belongs to.
    pub collection: &'static str,
    /// The ID of the record after repair.
    pub record_id: String,
    /// The repaired field.
    pub field: &'static str,
    /// What was changed.
    pub description: String,
}

/// A record that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnrepairableRecord {
    /// The storage key of the collection the record belongs to.
    pub collection: &'static str,
    /// The position of the record in the stored array.
    pub index: usize,
    /// Why the record could not be repaired.
    pub reason: String,
    /// The record exactly as it was stored.
    pub raw: Value,
}

/// The findings of an integrity check.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    /// Fields that were fixed.
    pub repairs: Vec<Repair>,
    /// Records that need manual attention.
    pub unrepairable: Vec<UnrepairableRecord>,
}

impl IntegrityReport {
    /// Whether every record loaded without changes.
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty() && self.unrepairable.is_empty()
    }

    /// The raw unrepairable records of one collection.
    pub fn unrepairable_in(&self, collection: &str) -> Vec<Value> {
        self.unrepairable
            .iter()
            .filter(|record| record.collection == collection)
            .map(|record| record.raw.clone())
            .collect()
    }
}

/// Loads both collections, tracking IDs across them so that no two records
/// end up sharing one.
#[derive(Debug, Default)]
pub struct Loader {
    seen_ids: HashSet<RecordId>,
    report: IntegrityReport,
}

impl Loader {
    /// Create a loader with an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load deliveries from the JSON stored under `collection`.
    ///
    /// A missing value is an empty collection.
    pub fn load_deliveries(&mut self, collection: &'static str, json: Option<&str>) -> Vec<Delivery> {
        let mut deliveries: Vec<Delivery> = Vec::new();

        for (index, value) in self.parse_array(collection, json).into_iter().enumerate() {
            match self.repair_delivery(collection, &value, &deliveries) {
                Ok(delivery) => deliveries.push(delivery),
                Err(reason) => self.reject(collection, index, reason, value),
            }
        }

        deliveries
    }

    /// Load gas entries from the JSON stored under `collection`.
    ///
    /// A missing value is an empty collection.
    pub fn load_gas_entries(&mut self, collection: &'static str, json: Option<&str>) -> Vec<GasEntry> {
        let mut gas_entries = Vec::new();

        for (index, value) in self.parse_array(collection, json).into_iter().enumerate() {
            match self.repair_gas_entry(collection, &value) {
                Ok(entry) => gas_entries.push(entry),
                Err(reason) => self.reject(collection, index, reason, value),
            }
        }

        gas_entries
    }

    /// Finish loading and return the findings.
    pub fn finish(self) -> IntegrityReport {
        self.report
    }

    fn parse_array(&mut self, collection: &'static str, json: Option<&str>) -> Vec<Value> {
        let Some(json) = json else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<Value>>(json) {
            Ok(values) => values,
            Err(error) => {
                self.reject(
                    collection,
                    0,
                    format!("the stored collection is not a JSON array: {error}"),
                    Value::String(json.to_owned()),
                );
                Vec::new()
            }
        }
    }

    fn reject(&mut self, collection: &'static str, index: usize, reason: String, raw: Value) {
        tracing::warn!("Could not load record {index} of {collection}: {reason}");

        self.report.unrepairable.push(UnrepairableRecord {
            collection,
            index,
            reason,
            raw,
        });
    }

    fn repair(&mut self, collection: &'static str, id: &RecordId, field: &'static str, description: String) {
        tracing::warn!("Repaired {field} of {collection} record {id}: {description}");

        self.report.repairs.push(Repair {
            collection,
            record_id: id.to_string(),
            field,
            description,
        });
    }

    fn repair_delivery(
        &mut self,
        collection: &'static str,
        value: &Value,
        loaded: &[Delivery],
    ) -> Result<Delivery, String> {
        let fields = value.as_object().ok_or("the record is not a JSON object")?;

        let order_number = text_field(fields, "orderNumber")
            .filter(|order_number| !order_number.trim().is_empty())
            .ok_or("the order number is missing")?;
        let (date, date_repair) = read_date(fields)?;
        let (fee, fee_repair) = read_fee(fields)?;

        if loaded.iter().any(|delivery| {
            delivery.date == date && delivery.order_number == order_number.trim()
        }) {
            return Err(format!(
                "order {} on {} is a duplicate of an earlier record",
                order_number.trim(),
                to_display(date)
            ));
        }

        let id = self.claim_id(collection, fields);

        if let Some(description) = date_repair {
            self.repair(collection, &id, "date", description);
        }
        if let Some(description) = fee_repair {
            self.repair(collection, &id, "fee", description);
        }

        let status = text_field(fields, "status").and_then(|status| DeliveryStatus::parse(&status));
        let overridden = fields
            .get("statusOverridden")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let delivery = Delivery::build(&order_number, date)
            .id(Some(id))
            .fee(fee)
            .image(text_field(fields, "image"))
            .status_override(status)
            .finalize();

        // Older records only store the effective status, so a status that
        // disagrees with the fee must have been chosen by the user.
        if overridden {
            Ok(delivery)
        } else {
            Ok(delivery.without_redundant_override())
        }
    }

    fn repair_gas_entry(&mut self, collection: &'static str, value: &Value) -> Result<GasEntry, String> {
        let fields = value.as_object().ok_or("the record is not a JSON object")?;

        let (date, date_repair) = read_date(fields)?;
        let (amount, amount_repair) = match fields.get("amount") {
            Some(Value::Number(number)) => (number.as_f64(), None),
            Some(Value::String(text)) => (
                parse_amount(text),
                Some(format!("converted the text \"{text}\" to a number")),
            ),
            _ => (None, None),
        };
        let amount = amount
            .filter(|&amount| amount > 0.0)
            .ok_or("the amount is missing or not greater than zero")?;

        let id = self.claim_id(collection, fields);

        if let Some(description) = date_repair {
            self.repair(collection, &id, "date", description);
        }
        if let Some(description) = amount_repair {
            self.repair(collection, &id, "amount", description);
        }

        Ok(GasEntry::build(amount, date)
            .id(Some(id))
            .description(text_field(fields, "description").as_deref())
            .image(text_field(fields, "image"))
            .finalize())
    }

    /// Take the stored ID, or a new one if it is missing or already taken.
    fn claim_id(&mut self, collection: &'static str, fields: &Map<String, Value>) -> RecordId {
        let stored = text_field(fields, "id").and_then(|id| RecordId::new(&id));

        let id = match stored {
            Some(id) if !self.seen_ids.contains(&id) => {
                // Legacy IDs may be stored as numbers.
                if !matches!(fields.get("id"), Some(Value::String(_))) {
                    self.repair(collection, &id, "id", "converted the ID to text".to_owned());
                }
                id
            }
            Some(duplicate) => {
                let id = RecordId::generate();
                self.repair(
                    collection,
                    &id,
                    "id",
                    format!("replaced the ID {duplicate}, which was already in use"),
                );
                id
            }
            None => {
                let id = RecordId::generate();
                self.repair(collection, &id, "id", "generated a missing ID".to_owned());
                id
            }
        };

        self.seen_ids.insert(id.clone());
        id
    }
}

/// Read a field that should hold text, accepting numbers as well.
fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn read_date(fields: &Map<String, Value>) -> Result<(Date, Option<String>), String> {
    let text = text_field(fields, "date").ok_or("the date is missing")?;
    let date = parse_date(&text).ok_or_else(|| format!("the date \"{text}\" is not a valid date"))?;

    let repair = (!is_canonical(&text))
        .then(|| format!("converted the date \"{text}\" to {}", to_iso(date)));

    Ok((date, repair))
}

fn read_fee(fields: &Map<String, Value>) -> Result<(Option<f64>, Option<String>), String> {
    let (fee, repair) = match fields.get("fee") {
        None | Some(Value::Null) => (None, None),
        Some(Value::Number(number)) => (number.as_f64(), None),
        Some(Value::String(text)) if text.trim().is_empty() => (None, None),
        Some(Value::String(text)) => match parse_amount(text) {
            Some(fee) => (
                Some(fee),
                Some(format!("converted the text \"{text}\" to a number")),
            ),
            None => (
                Some(0.0),
                Some(format!("replaced the unreadable fee \"{text}\" with 0")),
            ),
        },
        Some(other) => (
            Some(0.0),
            Some(format!("replaced the unreadable fee {other} with 0")),
        ),
    };

    match fee {
        Some(fee) if fee < 0.0 => Err(format!("the fee {fee} is negative")),
        _ => Ok((fee, repair)),
    }
}

/// Serialize deliveries into the stored JSON form.
///
/// # Errors
/// Returns [PersistenceError::Serialization] if a fee is not a finite number.
pub fn deliveries_to_json(deliveries: &[Delivery]) -> Result<String, PersistenceError> {
    ensure_finite(deliveries.iter().filter_map(|delivery| delivery.fee))?;

    let values: Vec<Value> = deliveries
        .iter()
        .map(|delivery| {
            let mut value = json!({
                "id": delivery.id.as_str(),
                "orderNumber": delivery.order_number,
                "date": to_iso(delivery.date),
                "fee": delivery.fee,
                "status": delivery.status().as_str(),
            });

            if let Value::Object(fields) = &mut value {
                if let Some(image) = &delivery.image {
                    fields.insert("image".to_owned(), Value::String(image.clone()));
                }
                if delivery.status_override.is_some() {
                    fields.insert("statusOverridden".to_owned(), Value::Bool(true));
                }
            }

            value
        })
        .collect();

    to_json(&values)
}

/// Serialize gas entries into the stored JSON form.
///
/// # Errors
/// Returns [PersistenceError::Serialization] if an amount is not a finite
/// number.
pub fn gas_entries_to_json(gas_entries: &[GasEntry]) -> Result<String, PersistenceError> {
    ensure_finite(gas_entries.iter().map(|entry| entry.amount))?;

    let values: Vec<Value> = gas_entries
        .iter()
        .map(|entry| {
            let mut value = json!({
                "id": entry.id.as_str(),
                "date": to_iso(entry.date),
                "amount": entry.amount,
                "description": entry.description,
            });

            if let (Value::Object(fields), Some(image)) = (&mut value, &entry.image) {
                fields.insert("image".to_owned(), Value::String(image.clone()));
            }

            value
        })
        .collect();

    to_json(&values)
}

fn to_json(values: &[Value]) -> Result<String, PersistenceError> {
    serde_json::to_string(values).map_err(|error| PersistenceError::Serialization(error.to_string()))
}

/// serde_json writes non-finite floats as null, which would read back as a
/// pending fee or a missing amount.
fn ensure_finite(amounts: impl IntoIterator<Item = f64>) -> Result<(), PersistenceError> {
    match amounts.into_iter().find(|amount| !amount.is_finite()) {
        Some(amount) => Err(PersistenceError::Serialization(format!(
            "cannot store the amount {amount}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        delivery::{Delivery, DeliveryStatus},
        gas::DEFAULT_GAS_DESCRIPTION,
        integrity::{Loader, deliveries_to_json, gas_entries_to_json},
        test_utils::{delivery, gas, pending_delivery},
    };

    #[test]
    fn missing_collections_load_empty() {
        let mut loader = Loader::new();

        assert!(loader.load_deliveries("deliveries", None).is_empty());
        assert!(loader.load_gas_entries("gas_entries", None).is_empty());
        assert!(loader.finish().is_clean());
    }

    #[test]
    fn stored_records_load_unchanged() {
        let deliveries = vec![
            delivery("1", date!(2024 - 01 - 01), 10.5),
            pending_delivery("2", date!(2024 - 01 - 02)),
            Delivery::build("3", date!(2024 - 01 - 02))
                .fee(Some(7.0))
                .image(Some("data:image/png;base64,AAAA".to_owned()))
                .status_override(Some(DeliveryStatus::Pending))
                .finalize(),
        ];
        let gas_entries = vec![gas(date!(2024 - 01 - 01), 40.0)];
        let deliveries_json = deliveries_to_json(&deliveries).unwrap();
        let gas_json = gas_entries_to_json(&gas_entries).unwrap();

        let mut loader = Loader::new();
        let loaded_deliveries = loader.load_deliveries("deliveries", Some(&deliveries_json));
        let loaded_gas = loader.load_gas_entries("gas_entries", Some(&gas_json));

        assert_eq!(loaded_deliveries, deliveries);
        assert_eq!(loaded_gas, gas_entries);
        assert!(loader.finish().is_clean());
    }

    #[test]
    fn repairs_legacy_fields() {
        let json = json!([
            {"orderNumber": "1", "date": "05/03/2024", "fee": "12,50"},
            {"id": 1709600000000u64, "orderNumber": 2, "date": "2024-03-05T22:00:00.000Z", "fee": "abc"},
        ])
        .to_string();

        let mut loader = Loader::new();
        let deliveries = loader.load_deliveries("deliveries", Some(&json));
        let report = loader.finish();

        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].date, date!(2024 - 03 - 05));
        assert_eq!(deliveries[0].fee, Some(12.5));
        assert_eq!(deliveries[1].id.as_str(), "1709600000000");
        assert_eq!(deliveries[1].order_number, "2");
        assert_eq!(deliveries[1].date, date!(2024 - 03 - 05));
        assert_eq!(deliveries[1].fee, Some(0.0));
        assert!(report.unrepairable.is_empty());

        let repaired_fields: Vec<_> = report.repairs.iter().map(|repair| repair.field).collect();
        assert_eq!(repaired_fields, ["id", "date", "fee", "id", "date", "fee"]);
    }

    #[test]
    fn duplicate_ids_are_replaced() {
        let json = json!([
            {"id": "same", "date": "2024-03-05", "amount": 10.0},
            {"id": "same", "date": "2024-03-06", "amount": 20.0},
        ])
        .to_string();

        let mut loader = Loader::new();
        let gas_entries = loader.load_gas_entries("gas_entries", Some(&json));
        let report = loader.finish();

        assert_eq!(gas_entries[0].id.as_str(), "same");
        assert_ne!(gas_entries[1].id.as_str(), "same");
        assert_eq!(gas_entries[1].description, DEFAULT_GAS_DESCRIPTION);
        assert_eq!(report.repairs.len(), 1);
    }

    #[test]
    fn unrepairable_records_are_kept_in_report() {
        let json = json!([
            {"id": "a", "orderNumber": "", "date": "2024-03-05"},
            {"id": "b", "orderNumber": "1", "date": "someday"},
            {"id": "c", "orderNumber": "1", "date": "2024-03-05", "fee": -3},
            "not an object",
            {"id": "d", "orderNumber": "1", "date": "2024-03-05", "fee": 4},
            {"id": "e", "orderNumber": "1", "date": "2024-03-05", "fee": 5},
        ])
        .to_string();

        let mut loader = Loader::new();
        let deliveries = loader.load_deliveries("deliveries", Some(&json));
        let report = loader.finish();

        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].id.as_str(), "d");
        let indices: Vec<_> = report.unrepairable.iter().map(|record| record.index).collect();
        assert_eq!(indices, [0, 1, 2, 3, 5]);
        assert_eq!(report.unrepairable[3].raw, json!("not an object"));
        assert_eq!(report.unrepairable_in("deliveries").len(), 5);
    }

    #[test]
    fn gas_entry_without_valid_amount_is_unrepairable() {
        let json = json!([
            {"id": "a", "date": "2024-03-05"},
            {"id": "b", "date": "2024-03-05", "amount": 0},
            {"id": "c", "date": "2024-03-05", "amount": "30"},
        ])
        .to_string();

        let mut loader = Loader::new();
        let gas_entries = loader.load_gas_entries("gas_entries", Some(&json));
        let report = loader.finish();

        assert_eq!(gas_entries.len(), 1);
        assert_eq!(gas_entries[0].amount, 30.0);
        assert_eq!(report.unrepairable.len(), 2);
        assert_eq!(report.repairs[0].field, "amount");
    }

    #[test]
    fn corrupt_collection_is_kept_verbatim() {
        let mut loader = Loader::new();

        let deliveries = loader.load_deliveries("deliveries", Some("{not json"));
        let report = loader.finish();

        assert!(deliveries.is_empty());
        assert_eq!(report.unrepairable.len(), 1);
        assert_eq!(report.unrepairable[0].raw, json!("{not json"));
    }

    #[test]
    fn ids_are_unique_across_collections() {
        let deliveries_json = json!([{"id": "x", "orderNumber": "1", "date": "2024-03-05"}]).to_string();
        let gas_json = json!([{"id": "x", "date": "2024-03-05", "amount": 10}]).to_string();

        let mut loader = Loader::new();
        let deliveries = loader.load_deliveries("deliveries", Some(&deliveries_json));
        let gas_entries = loader.load_gas_entries("gas_entries", Some(&gas_json));

        assert_ne!(deliveries[0].id, gas_entries[0].id);
    }

    #[test]
    fn non_finite_amounts_are_not_serialized() {
        let entries = [gas(date!(2024 - 03 - 05), f64::INFINITY)];

        assert!(gas_entries_to_json(&entries).is_err());
    }
}
