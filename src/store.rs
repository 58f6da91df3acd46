//! The record store: the in-memory collections and every way to change them.
//!
//! The store is the only owner of the deliveries and gas entries. Every
//! mutation is validated first, applied in memory, then written to storage.
//! A failed write keeps the in-memory change and reports [Error::NotSaved] so
//! the caller can warn the user and retry.

use serde::Serialize;
use time::Date;

use crate::{
    Error, RecordId,
    analytics::DashboardSummary,
    csv_codec::{CsvLayout, ImportGate, ImportTicket, decode, encode, export_filename},
    delivery::{Delivery, DeliveryForm},
    gas::{GasEntry, GasEntryForm},
    integrity::{IntegrityReport, Loader, deliveries_to_json, gas_entries_to_json},
    storage::{
        DELIVERIES_KEY, GAS_ENTRIES_KEY, PersistenceError, Storage, UNREPAIRABLE_SUFFIX,
        save_verified,
    },
    validation::{
        Candidate, FieldError, ValidationContext, ValidationOptions, ValidationReport, validate,
    },
};

/// What changed in a [Store].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// A delivery was added, updated or removed.
    DeliveriesChanged,
    /// A gas entry was added, updated or removed.
    GasEntriesChanged,
    /// Records were imported from a CSV file.
    Imported,
    /// The collections were reloaded from storage.
    Reloaded,
}

/// The result of adding or updating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    /// The ID of the record.
    pub id: RecordId,
    /// Advisory findings, e.g. an unusually large fuel expense.
    pub warnings: Vec<FieldError>,
}

/// How many records an import added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// The number of deliveries added.
    pub deliveries: usize,
    /// The number of gas entries added.
    pub gas_entries: usize,
}

/// An export ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// The suggested file name.
    pub filename: String,
    /// The CSV text.
    pub contents: String,
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Owns the delivery and gas entry collections and keeps them in sync with
/// a [Storage] backend.
pub struct Store<S: Storage> {
    storage: S,
    deliveries: Vec<Delivery>,
    gas_entries: Vec<GasEntry>,
    integrity_report: IntegrityReport,
    strict: bool,
    import_gate: ImportGate,
    listeners: Vec<Listener>,
}

impl<S: Storage> Store<S> {
    /// Open a store over `storage`, loading and repairing the stored records.
    ///
    /// Repaired collections are written back. Records that cannot be repaired
    /// are moved under their collection key with the `_unrepairable` suffix
    /// and listed in [Store::integrity_report].
    ///
    /// # Errors
    /// Returns [Error::Load] if storage cannot be read, or if repairs cannot
    /// be written back.
    pub fn open(storage: S) -> Result<Self, Error> {
        let mut store = Self {
            storage,
            deliveries: Vec::new(),
            gas_entries: Vec::new(),
            integrity_report: IntegrityReport::default(),
            strict: false,
            import_gate: ImportGate::new(),
            listeners: Vec::new(),
        };

        store.load()?;

        Ok(store)
    }

    /// Treat suspicious values as errors in every later mutation and import.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Whether suspicious values are treated as errors.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The deliveries in the order they were recorded.
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// The gas entries in the order they were recorded.
    pub fn gas_entries(&self) -> &[GasEntry] {
        &self.gas_entries
    }

    /// What the last load from storage had to repair or set aside.
    pub fn integrity_report(&self) -> &IntegrityReport {
        &self.integrity_report
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The storage backend, e.g. for a host that shares it with another
    /// writer. Changes made through it are only seen after
    /// [Store::reload_from_persistence].
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Every dashboard figure for the current records.
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary::compute(&self.deliveries, &self.gas_entries)
    }

    /// Call `listener` after every change to the collections.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Validate and add a delivery.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the form is invalid, in which case
    /// nothing changes, or [Error::NotSaved] if the delivery was added but
    /// could not be written to storage.
    pub fn add_delivery(&mut self, form: &DeliveryForm) -> Result<Saved, Error> {
        let report = self.validate(Candidate::Delivery(form), None)?;
        let delivery = form
            .to_builder()
            .ok_or_else(|| Error::Validation(report.clone()))?
            .finalize()
            .without_redundant_override();
        let id = delivery.id.clone();

        tracing::debug!("Adding delivery {id} for order {}", delivery.order_number);
        self.deliveries.push(delivery);
        let saved = self.save_deliveries();
        self.notify(StoreEvent::DeliveriesChanged);

        saved.map(|()| Saved {
            id,
            warnings: report.warnings,
        })
    }

    /// Validate and replace the delivery with the given ID.
    ///
    /// The ID is kept. So is the receipt image if the form has none.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such delivery,
    /// [Error::Validation] if the form is invalid, or [Error::NotSaved] if the
    /// change could not be written to storage.
    pub fn update_delivery(&mut self, id: &RecordId, form: &DeliveryForm) -> Result<Saved, Error> {
        let index = self
            .deliveries
            .iter()
            .position(|delivery| &delivery.id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        let report = self.validate(Candidate::Delivery(form), Some(id))?;
        let mut builder = form
            .to_builder()
            .ok_or_else(|| Error::Validation(report.clone()))?
            .id(Some(id.clone()));

        if builder.image.is_none() {
            builder.image = self.deliveries[index].image.clone();
        }

        tracing::debug!("Updating delivery {id}");
        self.deliveries[index] = builder.finalize().without_redundant_override();
        let saved = self.save_deliveries();
        self.notify(StoreEvent::DeliveriesChanged);

        saved.map(|()| Saved {
            id: id.clone(),
            warnings: report.warnings,
        })
    }

    /// Remove the delivery with the given ID, keeping the order of the rest.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such delivery, or
    /// [Error::NotSaved] if the removal could not be written to storage.
    pub fn remove_delivery(&mut self, id: &RecordId) -> Result<Delivery, Error> {
        let index = self
            .deliveries
            .iter()
            .position(|delivery| &delivery.id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;

        tracing::debug!("Removing delivery {id}");
        let removed = self.deliveries.remove(index);
        let saved = self.save_deliveries();
        self.notify(StoreEvent::DeliveriesChanged);

        saved.map(|()| removed)
    }

    /// Validate and add a gas entry.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the form is invalid, in which case
    /// nothing changes, or [Error::NotSaved] if the entry was added but could
    /// not be written to storage.
    pub fn add_gas_entry(&mut self, form: &GasEntryForm) -> Result<Saved, Error> {
        let report = self.validate(Candidate::Gas(form), None)?;
        let entry = form
            .to_builder()
            .ok_or_else(|| Error::Validation(report.clone()))?
            .finalize();
        let id = entry.id.clone();

        tracing::debug!("Adding gas entry {id} of {}", entry.amount);
        self.gas_entries.push(entry);
        let saved = self.save_gas_entries();
        self.notify(StoreEvent::GasEntriesChanged);

        saved.map(|()| Saved {
            id,
            warnings: report.warnings,
        })
    }

    /// Validate and replace the gas entry with the given ID.
    ///
    /// The ID is kept. So is the receipt image if the form has none.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such entry,
    /// [Error::Validation] if the form is invalid, or [Error::NotSaved] if the
    /// change could not be written to storage.
    pub fn update_gas_entry(&mut self, id: &RecordId, form: &GasEntryForm) -> Result<Saved, Error> {
        let index = self
            .gas_entries
            .iter()
            .position(|entry| &entry.id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        let report = self.validate(Candidate::Gas(form), Some(id))?;
        let mut builder = form
            .to_builder()
            .ok_or_else(|| Error::Validation(report.clone()))?
            .id(Some(id.clone()));

        if builder.image.is_none() {
            builder.image = self.gas_entries[index].image.clone();
        }

        tracing::debug!("Updating gas entry {id}");
        self.gas_entries[index] = builder.finalize();
        let saved = self.save_gas_entries();
        self.notify(StoreEvent::GasEntriesChanged);

        saved.map(|()| Saved {
            id: id.clone(),
            warnings: report.warnings,
        })
    }

    /// Remove the gas entry with the given ID, keeping the order of the rest.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such entry, or
    /// [Error::NotSaved] if the removal could not be written to storage.
    pub fn remove_gas_entry(&mut self, id: &RecordId) -> Result<GasEntry, Error> {
        let index = self
            .gas_entries
            .iter()
            .position(|entry| &entry.id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;

        tracing::debug!("Removing gas entry {id}");
        let removed = self.gas_entries.remove(index);
        let saved = self.save_gas_entries();
        self.notify(StoreEvent::GasEntriesChanged);

        saved.map(|()| removed)
    }

    /// Remove the record with the given ID from whichever collection holds it.
    ///
    /// # Errors
    /// See [Store::remove_delivery] and [Store::remove_gas_entry].
    pub fn remove(&mut self, id: &RecordId) -> Result<(), Error> {
        if self.deliveries.iter().any(|delivery| &delivery.id == id) {
            self.remove_delivery(id).map(|_| ())
        } else {
            self.remove_gas_entry(id).map(|_| ())
        }
    }

    /// Decode `text` as CSV and add every record in it.
    ///
    /// The import is all or nothing: if any row is invalid, no record is
    /// added.
    ///
    /// # Errors
    /// Returns [Error::Import] if the file cannot be imported, or
    /// [Error::NotSaved] if the records were added but could not be written
    /// to storage.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportSummary, Error> {
        let context = ValidationContext {
            deliveries: &self.deliveries,
            gas_entries: &self.gas_entries,
        };
        let options = ValidationOptions {
            exclude_id: None,
            strict: self.strict,
        };
        let decoded = decode(text, &context, options)?;

        let summary = ImportSummary {
            deliveries: decoded.deliveries.len(),
            gas_entries: decoded.gas_entries.len(),
        };

        self.deliveries.extend(decoded.deliveries);
        self.gas_entries.extend(decoded.gas_entries);
        let saved = self
            .save_deliveries()
            .and_then(|()| self.save_gas_entries());
        self.notify(StoreEvent::Imported);

        tracing::info!(
            "Imported {} deliveries and {} gas entries",
            summary.deliveries,
            summary.gas_entries
        );

        saved.map(|()| summary)
    }

    /// Start an import whose file is still being read.
    ///
    /// Starting another import makes the returned ticket stale.
    pub fn begin_import(&self) -> ImportTicket {
        self.import_gate.begin()
    }

    /// Finish an import started with [Store::begin_import].
    ///
    /// Returns `Ok(None)` without touching the collections if a newer import
    /// has been started since.
    ///
    /// # Errors
    /// See [Store::import_csv].
    pub fn finish_import(
        &mut self,
        ticket: ImportTicket,
        text: &str,
    ) -> Result<Option<ImportSummary>, Error> {
        if !self.import_gate.is_current(ticket) {
            tracing::debug!("Discarding the result of a superseded import");
            return Ok(None);
        }

        self.import_csv(text).map(Some)
    }

    /// Encode every record as CSV, named for `today`.
    ///
    /// # Errors
    /// Returns [Error::Export] if the records cannot be encoded.
    pub fn export_csv(&self, layout: CsvLayout, today: Date) -> Result<CsvExport, Error> {
        let contents = encode(&self.deliveries, &self.gas_entries, layout)?;
        let filename = export_filename(today, &contents);

        tracing::info!(
            "Exported {} deliveries and {} gas entries as {filename}",
            self.deliveries.len(),
            self.gas_entries.len()
        );

        Ok(CsvExport { filename, contents })
    }

    /// Replace the in-memory collections with what is in storage, e.g. after
    /// another process wrote to it.
    ///
    /// # Errors
    /// Returns [Error::Load] if storage cannot be read or repairs cannot be
    /// written back. The collections are left unchanged in that case.
    pub fn reload_from_persistence(&mut self) -> Result<(), Error> {
        self.load()?;
        self.notify(StoreEvent::Reloaded);

        Ok(())
    }

    fn options<'a>(&self, exclude_id: Option<&'a RecordId>) -> ValidationOptions<'a> {
        ValidationOptions {
            exclude_id,
            strict: self.strict,
        }
    }

    fn validate(
        &self,
        candidate: Candidate<'_>,
        exclude_id: Option<&RecordId>,
    ) -> Result<ValidationReport, Error> {
        let context = ValidationContext {
            deliveries: &self.deliveries,
            gas_entries: &self.gas_entries,
        };
        let report = validate(candidate, &context, self.options(exclude_id));

        if report.is_valid() {
            Ok(report)
        } else {
            Err(Error::Validation(report))
        }
    }

    fn notify(&mut self, event: StoreEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    fn save_deliveries(&mut self) -> Result<(), Error> {
        deliveries_to_json(&self.deliveries)
            .and_then(|json| save_verified(&mut self.storage, DELIVERIES_KEY, &json))
            .map_err(Error::NotSaved)
    }

    fn save_gas_entries(&mut self) -> Result<(), Error> {
        gas_entries_to_json(&self.gas_entries)
            .and_then(|json| save_verified(&mut self.storage, GAS_ENTRIES_KEY, &json))
            .map_err(Error::NotSaved)
    }

    fn load(&mut self) -> Result<(), Error> {
        let deliveries_json = self.storage.get(DELIVERIES_KEY).map_err(Error::Load)?;
        let gas_json = self.storage.get(GAS_ENTRIES_KEY).map_err(Error::Load)?;

        let mut loader = Loader::new();
        let deliveries = loader.load_deliveries(DELIVERIES_KEY, deliveries_json.as_deref());
        let gas_entries = loader.load_gas_entries(GAS_ENTRIES_KEY, gas_json.as_deref());
        let report = loader.finish();

        self.write_back(DELIVERIES_KEY, &report, || deliveries_to_json(&deliveries))
            .map_err(Error::Load)?;
        self.write_back(GAS_ENTRIES_KEY, &report, || gas_entries_to_json(&gas_entries))
            .map_err(Error::Load)?;

        if report.is_clean() {
            tracing::debug!(
                "Loaded {} deliveries and {} gas entries",
                deliveries.len(),
                gas_entries.len()
            );
        } else {
            tracing::warn!(
                "Loaded records with {} repairs and {} unrepairable records",
                report.repairs.len(),
                report.unrepairable.len()
            );
        }

        self.deliveries = deliveries;
        self.gas_entries = gas_entries;
        self.integrity_report = report;

        Ok(())
    }

    /// Set aside the unrepairable records of `collection`, then write the
    /// repaired collection back if anything in it changed.
    fn write_back(
        &mut self,
        collection: &str,
        report: &IntegrityReport,
        to_json: impl FnOnce() -> Result<String, PersistenceError>,
    ) -> Result<(), PersistenceError> {
        let unrepairable = report.unrepairable_in(collection);
        let was_repaired = report
            .repairs
            .iter()
            .any(|repair| repair.collection == collection);

        if !unrepairable.is_empty() {
            let key = format!("{collection}{UNREPAIRABLE_SUFFIX}");
            let mut quarantined = match self.storage.get(&key)? {
                Some(json) => previously_quarantined(&key, json),
                None => Vec::new(),
            };
            quarantined.extend(unrepairable.iter().cloned());

            let json = serde_json::to_string(&quarantined)
                .map_err(|error| PersistenceError::Serialization(error.to_string()))?;
            save_verified(&mut self.storage, &key, &json)?;

            tracing::warn!(
                "Moved {} unrepairable records to \"{key}\"",
                unrepairable.len()
            );
        }

        if was_repaired || !unrepairable.is_empty() {
            save_verified(&mut self.storage, collection, &to_json()?)?;
        }

        Ok(())
    }
}

/// The records already set aside under `key`.
///
/// A stored value that is not a JSON array is kept as a single raw entry.
fn previously_quarantined(key: &str, json: String) -> Vec<serde_json::Value> {
    match serde_json::from_str(&json) {
        Ok(serde_json::Value::Array(records)) => records,
        _ => {
            tracing::warn!("Found non-array value in \"{key}\", keeping it as a raw entry");
            vec![serde_json::Value::String(json)]
        }
    }
}
