use csv::{Terminator, WriterBuilder};

use crate::{
    Error,
    amount::to_plain_text,
    csv_codec::{CsvLayout, DELIVERY_TYPE, GAS_TYPE},
    date::to_display,
    delivery::Delivery,
    gas::GasEntry,
};

enum Row<'a> {
    Delivery(&'a Delivery),
    Gas(&'a GasEntry),
}

impl Row<'_> {
    fn fields(&self, layout: CsvLayout) -> Vec<String> {
        let mut fields = match self {
            Row::Delivery(delivery) => vec![
                to_display(delivery.date),
                DELIVERY_TYPE.to_owned(),
                delivery.order_number.clone(),
                delivery.fee.map(to_plain_text).unwrap_or_default(),
                String::new(),
                delivery.status().label().to_owned(),
            ],
            Row::Gas(entry) => vec![
                to_display(entry.date),
                GAS_TYPE.to_owned(),
                String::new(),
                String::new(),
                to_plain_text(entry.amount),
                String::new(),
            ],
        };

        if layout == CsvLayout::Extended {
            match self {
                Row::Delivery(delivery) => fields.extend([
                    delivery.id.to_string(),
                    delivery.image.clone().unwrap_or_default(),
                    String::new(),
                ]),
                Row::Gas(entry) => fields.extend([
                    entry.id.to_string(),
                    entry.image.clone().unwrap_or_default(),
                    entry.description.clone(),
                ]),
            }
        }

        fields
    }
}

/// Write deliveries and fuel expenses as CSV text.
///
/// Rows are in chronological order with deliveries before fuel expenses on
/// the same day. Records on the same day and of the same type keep the order
/// they were given in.
///
/// # Errors
/// Returns [Error::Export] if the CSV writer fails.
pub fn encode(
    deliveries: &[Delivery],
    gas_entries: &[GasEntry],
    layout: CsvLayout,
) -> Result<String, Error> {
    let mut rows: Vec<(time::Date, u8, Row<'_>)> = deliveries
        .iter()
        .map(|delivery| (delivery.date, 0, Row::Delivery(delivery)))
        .chain(
            gas_entries
                .iter()
                .map(|entry| (entry.date, 1, Row::Gas(entry))),
        )
        .collect();
    rows.sort_by_key(|(date, kind, _)| (*date, *kind));

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(layout.headers())
        .map_err(|error| Error::Export(error.to_string()))?;

    for (_, _, row) in &rows {
        writer
            .write_record(row.fields(layout))
            .map_err(|error| Error::Export(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Export(error.to_string()))?;

    tracing::debug!("Encoded {} rows as CSV", rows.len());

    String::from_utf8(bytes).map_err(|error| Error::Export(error.to_string()))
}
