//! Display formatting for the Brazilian Portuguese locale.
//!
//! Aggregations return plain numbers; these helpers are only applied when
//! values are shown to the user.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// Format `number` as Brazilian reais, e.g. `R$ 1.234,56` or `-R$ 8,00`.
pub fn format_currency(number: f64) -> String {
    static FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let formatter = FMT.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    let magnitude = number.abs();
    // Zero is hardcoded as "0" by numfmt
    let digits = match formatter {
        Some(formatter) if magnitude > 0.0 => {
            let formatted = formatter.fmt_string(magnitude);
            pad_decimals(formatted.trim_start_matches('$'))
        }
        _ => format!("{magnitude:.2}"),
    };

    let sign = if number < 0.0 && digits != "0.00" {
        "-"
    } else {
        ""
    };

    format!("{sign}R$ {}", swap_separators(&digits))
}

/// Format a percentage with no decimals, avoiding "-0%".
pub fn format_percentage(value: f64) -> String {
    let rounded = value.round();

    if rounded.abs() < 0.5 {
        "0%".to_owned()
    } else {
        format!("{rounded:.0}%")
    }
}

/// numfmt omits trailing zeros, e.g. "12.30" is rendered as "12.3".
fn pad_decimals(formatted: &str) -> String {
    match formatted.split_once('.') {
        None => format!("{formatted}.00"),
        Some((_, decimals)) if decimals.len() == 1 => format!("{formatted}0"),
        Some(_) => formatted.to_owned(),
    }
}

/// Turn `1,234.56` into `1.234,56`.
fn swap_separators(formatted: &str) -> String {
    formatted
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect()
}
