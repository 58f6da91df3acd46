//! Delivery ledger keeps the books of a delivery driver.
//!
//! Deliveries and the fees earned for them are recorded alongside fuel
//! expenses. From these the library derives profit, per-day and per-weekday
//! figures, trends and simple statistics. Records are validated before they
//! are stored, persisted as JSON in a string-keyed storage backend, and can be
//! exchanged with spreadsheets as CSV.
//!
//! The entry point is [Store], which owns the records and keeps them in sync
//! with a [Storage] backend such as [SqliteStorage].

#![warn(missing_docs)]

mod amount;
mod analytics;
mod csv_codec;
mod date;
mod delivery;
mod format;
mod gas;
mod integrity;
mod record_id;
mod storage;
mod store;
mod timezone;
mod validation;

#[cfg(test)]
mod test_utils;

pub use amount::{parse_amount, parse_amount_or_zero};
pub use analytics::{
    BestWorstDays, DashboardSummary, DaySummary, HalfComparison, ProfitPoint, Totals, Trend,
    TrendComparison, ValueRange, WEEKDAY_ORDER, WeekdayStats, best_and_worst_days,
    calculate_totals, compare_halves, cumulative_profit, group_by_date, group_by_weekday, mean,
    peak_weekday, pearson_correlation, percentage_change, sample_std_dev, value_range,
    weekday_fee_correlation,
};
pub use csv_codec::{
    CsvLayout, DecodedRecords, ImportError, ImportGate, ImportTicket, decode as decode_csv,
    encode as encode_csv, export_filename, import_file,
};
pub use date::{parse_date, to_display as format_date, weekday_label};
pub use delivery::{Delivery, DeliveryBuilder, DeliveryForm, DeliveryStatus};
pub use format::{format_currency, format_percentage};
pub use gas::{DEFAULT_GAS_DESCRIPTION, GasEntry, GasEntryBuilder, GasEntryForm};
pub use integrity::{IntegrityReport, Repair, UnrepairableRecord};
pub use record_id::RecordId;
pub use storage::{
    DELIVERIES_KEY, GAS_ENTRIES_KEY, MAX_SAVE_ATTEMPTS, MemoryStorage, PersistenceError,
    SqliteStorage, Storage, UNREPAIRABLE_SUFFIX, create_key_value_table, save_verified,
};
pub use store::{CsvExport, ImportSummary, Saved, Store, StoreEvent};
pub use timezone::{DEFAULT_TIMEZONE, get_local_offset, today_in};
pub use validation::{
    Candidate, FieldError, SUSPICIOUS_GAS_AMOUNT, ValidationContext, ValidationOptions,
    ValidationReport, validate,
};

/// The errors that may occur when changing, importing or exporting records.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The record failed validation and was not applied.
    #[error("invalid record: {0}")]
    Validation(ValidationReport),

    /// No record has the given ID.
    #[error("no record with the ID {0}")]
    NotFound(RecordId),

    /// A CSV file could not be imported. Nothing was applied.
    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    /// The change was applied in memory but could not be written to storage.
    ///
    /// Callers should tell the user that the change may be lost and offer to
    /// retry, e.g. by exporting the records.
    #[error("the change was applied but could not be saved: {0}")]
    NotSaved(PersistenceError),

    /// The stored records could not be read, or their repairs could not be
    /// written back.
    #[error("could not load records: {0}")]
    Load(PersistenceError),

    /// The records could not be encoded as CSV.
    #[error("could not export records: {0}")]
    Export(String),

    /// A canonical timezone name did not match a known timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}
