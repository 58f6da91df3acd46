//! Reading and writing the spreadsheet export.
//!
//! Files use Portuguese column names. Each row is either a delivery or a fuel
//! expense, told apart by the `Tipo` column. The extended layout adds the
//! columns needed to restore a backup exactly.

mod decode;
mod encode;

use std::{
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use time::Date;

use crate::date::to_iso;

pub use decode::{DecodedRecords, decode};
pub use encode::encode;

/// The date column, `DD/MM/YYYY` on export.
pub const DATE_HEADER: &str = "Data";
/// The record type column.
pub const TYPE_HEADER: &str = "Tipo";
/// The order number column, blank for fuel expenses.
pub const ORDER_NUMBER_HEADER: &str = "Número do Pedido";
/// The delivery fee column, blank for fuel expenses.
pub const FEE_HEADER: &str = "Valor Pedido";
/// The fuel expense column, blank for deliveries.
pub const GAS_AMOUNT_HEADER: &str = "Valor Gasolina";
/// The delivery status column, blank for fuel expenses.
pub const STATUS_HEADER: &str = "Status";
/// The record ID column of the extended layout.
pub const ID_HEADER: &str = "ID";
/// The receipt image column of the extended layout.
pub const IMAGE_HEADER: &str = "Imagem";
/// The fuel expense description column of the extended layout.
pub const DESCRIPTION_HEADER: &str = "Descrição";

/// The `Tipo` value of delivery rows.
pub const DELIVERY_TYPE: &str = "Entrega";
/// The `Tipo` value of fuel expense rows.
pub const GAS_TYPE: &str = "Gasolina";

const STANDARD_HEADERS: [&str; 6] = [
    DATE_HEADER,
    TYPE_HEADER,
    ORDER_NUMBER_HEADER,
    FEE_HEADER,
    GAS_AMOUNT_HEADER,
    STATUS_HEADER,
];

const EXTENDED_HEADERS: [&str; 9] = [
    DATE_HEADER,
    TYPE_HEADER,
    ORDER_NUMBER_HEADER,
    FEE_HEADER,
    GAS_AMOUNT_HEADER,
    STATUS_HEADER,
    ID_HEADER,
    IMAGE_HEADER,
    DESCRIPTION_HEADER,
];

/// Which columns an export contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvLayout {
    /// The columns a spreadsheet user needs.
    #[default]
    Standard,
    /// The standard columns plus IDs, images and descriptions.
    Extended,
}

impl CsvLayout {
    /// The header row of this layout.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Standard => &STANDARD_HEADERS,
            Self::Extended => &EXTENDED_HEADERS,
        }
    }
}

/// Errors that abort an import. Nothing is applied when one is returned.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ImportError {
    /// The file has no header or no data rows.
    #[error("the file is empty")]
    EmptyFile,

    /// The file does not have a `.csv` extension.
    #[error("{0} is not a CSV file")]
    UnsupportedFileType(String),

    /// Required columns are missing from the header row.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    /// One or more rows failed validation. Each message starts with
    /// `Row N:` where N is the line number in the file.
    #[error("{}", .0.join("\n"))]
    InvalidRows(Vec<String>),

    /// The file is not well-formed CSV.
    #[error("could not read CSV: {0}")]
    Csv(String),

    /// The file could not be read.
    #[error("could not read file: {0}")]
    Io(String),
}

impl From<csv::Error> for ImportError {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error.to_string())
    }
}

/// Read the CSV file at `path`.
///
/// # Errors
/// Returns [ImportError::UnsupportedFileType] unless the file name ends in
/// `.csv`, or [ImportError::Io] if the file cannot be read.
pub fn import_file(path: &Path) -> Result<String, ImportError> {
    let is_csv = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));

    if !is_csv {
        return Err(ImportError::UnsupportedFileType(path.display().to_string()));
    }

    std::fs::read_to_string(path).map_err(|error| ImportError::Io(error.to_string()))
}

/// The name of an export file, e.g. `entregas_2024-03-05_481516.csv`.
///
/// The six digit suffix is derived from `content`, so exports of different
/// data on the same day get different names.
pub fn export_filename(today: Date, content: &str) -> String {
    let hash_128 = md5::compute(content);
    let mut hash_64 = [0; 8];
    hash_64.copy_from_slice(&hash_128[0..8]);
    let suffix = u64::from_le_bytes(hash_64) % 1_000_000;

    format!("entregas_{}_{suffix:06}.csv", to_iso(today))
}

/// Hands out tickets for imports so that only the most recent one is applied.
///
/// Reading a file may finish after the user has already picked another one.
/// A decode whose ticket is no longer current is discarded rather than merged.
#[derive(Debug, Default)]
pub struct ImportGate {
    latest: AtomicU64,
}

/// Identifies one import started through an [ImportGate].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTicket(u64);

impl ImportGate {
    /// Create a gate with no imports started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an import, making every earlier ticket stale.
    pub fn begin(&self) -> ImportTicket {
        ImportTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the most recently started import.
    pub fn is_current(&self, ticket: ImportTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use time::macros::date;

    use crate::csv_codec::{ImportError, ImportGate, export_filename, import_file};

    #[test]
    fn export_filename_has_date_and_six_digit_suffix() {
        let filename = export_filename(date!(2024 - 03 - 05), "Data,Tipo\n");

        assert!(filename.starts_with("entregas_2024-03-05_"), "{filename}");
        assert!(filename.ends_with(".csv"));
        let suffix = &filename["entregas_2024-03-05_".len()..filename.len() - 4];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn export_filename_depends_on_content() {
        let today = date!(2024 - 03 - 05);

        assert_eq!(export_filename(today, "a"), export_filename(today, "a"));
        assert_ne!(export_filename(today, "a"), export_filename(today, "b"));
    }

    #[test]
    fn import_file_rejects_other_extensions() {
        let result = import_file(Path::new("entregas.xlsx"));

        assert_eq!(
            result,
            Err(ImportError::UnsupportedFileType("entregas.xlsx".to_owned()))
        );
    }

    #[test]
    fn import_file_reports_missing_file() {
        let result = import_file(Path::new("/this/file/does/not/exist.CSV"));

        assert!(matches!(result, Err(ImportError::Io(_))));
    }

    #[test]
    fn only_latest_ticket_is_current() {
        let gate = ImportGate::new();

        let first = gate.begin();
        assert!(gate.is_current(first));

        let second = gate.begin();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }
}
