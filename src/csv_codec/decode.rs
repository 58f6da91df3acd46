use csv::{ReaderBuilder, StringRecord};

use crate::{
    csv_codec::{
        DATE_HEADER, DELIVERY_TYPE, DESCRIPTION_HEADER, FEE_HEADER, GAS_AMOUNT_HEADER, GAS_TYPE,
        ID_HEADER, IMAGE_HEADER, ImportError, ORDER_NUMBER_HEADER, STATUS_HEADER, TYPE_HEADER,
    },
    date::{parse_date, to_iso},
    delivery::{Delivery, DeliveryForm},
    gas::{GasEntry, GasEntryForm},
    validation::{Candidate, ValidationContext, ValidationOptions, validate},
};

/// The records read from a CSV file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRecords {
    /// The delivery rows.
    pub deliveries: Vec<Delivery>,
    /// The fuel expense rows.
    pub gas_entries: Vec<GasEntry>,
}

impl DecodedRecords {
    /// The total number of records.
    pub fn len(&self) -> usize {
        self.deliveries.len() + self.gas_entries.len()
    }

    /// Whether no records were read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Column positions, found by header name.
struct Columns {
    date: usize,
    kind: usize,
    order_number: Option<usize>,
    fee: Option<usize>,
    gas_amount: Option<usize>,
    status: Option<usize>,
    id: Option<usize>,
    image: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, ImportError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };

        let date = find(DATE_HEADER);
        let kind = find(TYPE_HEADER);

        let (Some(date), Some(kind)) = (date, kind) else {
            let missing = [(DATE_HEADER, date), (TYPE_HEADER, kind)]
                .into_iter()
                .filter(|(_, position)| position.is_none())
                .map(|(name, _)| name.to_owned())
                .collect();

            return Err(ImportError::MissingHeaders(missing));
        };

        Ok(Self {
            date,
            kind,
            order_number: find(ORDER_NUMBER_HEADER),
            fee: find(FEE_HEADER),
            gas_amount: find(GAS_AMOUNT_HEADER),
            status: find(STATUS_HEADER),
            id: find(ID_HEADER),
            image: find(IMAGE_HEADER),
            description: find(DESCRIPTION_HEADER),
        })
    }
}

/// A row's fields, looked up by column.
struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a Columns,
}

impl Row<'_> {
    fn get(&self, column: usize) -> &str {
        self.record.get(column).unwrap_or_default().trim()
    }

    fn optional(&self, column: Option<usize>) -> Option<String> {
        column
            .map(|column| self.get(column))
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    /// The date column in `YYYY-MM-DD` form. Unreadable dates are passed on
    /// as written for validation to report.
    fn date(&self) -> String {
        let text = self.get(self.columns.date);

        parse_date(text).map_or_else(|| text.to_owned(), to_iso)
    }

    fn delivery_form(&self) -> DeliveryForm {
        DeliveryForm {
            id: self.optional(self.columns.id),
            order_number: self.optional(self.columns.order_number).unwrap_or_default(),
            date: self.date(),
            fee: self.optional(self.columns.fee),
            image: self.optional(self.columns.image),
            status: self.optional(self.columns.status),
        }
    }

    fn gas_form(&self) -> GasEntryForm {
        GasEntryForm {
            id: self.optional(self.columns.id),
            date: self.date(),
            amount: self.optional(self.columns.gas_amount).unwrap_or_default(),
            description: self.optional(self.columns.description),
            image: self.optional(self.columns.image),
        }
    }
}

/// Pick the delimiter used by the header line: `;`, then tab, then `,`.
///
/// Leading empty lines are skipped, as the reader skips them too.
fn detect_delimiter(text: &str) -> u8 {
    let header = text
        .lines()
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    if header.contains(';') {
        b';'
    } else if header.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

/// Read deliveries and fuel expenses from CSV text.
///
/// Every row is validated against the records in `context` and the rows
/// accepted before it, so a file cannot repeat an order that is already
/// recorded or that appears earlier in the same file. Blank lines are skipped.
///
/// # Errors
/// Returns an [ImportError] if the file is empty, lacks the `Data` or `Tipo`
/// column, is malformed, or if any row is invalid. In the last case every
/// invalid row is reported, not just the first.
pub fn decode(
    text: &str,
    context: &ValidationContext<'_>,
    options: ValidationOptions<'_>,
) -> Result<DecodedRecords, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if text.trim().is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = Columns::locate(&headers)?;

    let mut known_deliveries = context.deliveries.to_vec();
    let mut known_gas_entries = context.gas_entries.to_vec();
    let mut decoded = DecodedRecords::default();
    let mut row_errors = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map_or(index as u64 + 2, |position| position.line());

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let row = Row {
            record: &record,
            columns: &columns,
        };
        let context = ValidationContext {
            deliveries: &known_deliveries,
            gas_entries: &known_gas_entries,
        };
        let kind = row.get(columns.kind);

        if kind.eq_ignore_ascii_case(DELIVERY_TYPE) {
            let form = row.delivery_form();
            let report = validate(Candidate::Delivery(&form), &context, options);

            match form.to_builder() {
                Some(builder) if report.is_valid() => {
                    let delivery = builder.finalize().without_redundant_override();
                    known_deliveries.push(delivery.clone());
                    decoded.deliveries.push(delivery);
                }
                _ => row_errors.push(format!("Row {line}: {report}")),
            }
        } else if kind.eq_ignore_ascii_case(GAS_TYPE) {
            let form = row.gas_form();
            let report = validate(Candidate::Gas(&form), &context, options);

            match form.to_builder() {
                Some(builder) if report.is_valid() => {
                    let entry = builder.finalize();
                    known_gas_entries.push(entry.clone());
                    decoded.gas_entries.push(entry);
                }
                _ => row_errors.push(format!("Row {line}: {report}")),
            }
        } else if kind.is_empty() {
            row_errors.push(format!("Row {line}: {TYPE_HEADER} is required"));
        } else {
            row_errors.push(format!(
                "Row {line}: unknown type \"{kind}\", expected {DELIVERY_TYPE} or {GAS_TYPE}"
            ));
        }
    }

    if !row_errors.is_empty() {
        tracing::debug!("Rejected CSV import with {} invalid rows", row_errors.len());
        return Err(ImportError::InvalidRows(row_errors));
    }

    if decoded.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    tracing::debug!(
        "Decoded {} deliveries and {} gas entries from CSV",
        decoded.deliveries.len(),
        decoded.gas_entries.len()
    );

    Ok(decoded)
}
