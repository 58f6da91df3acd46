//! Lenient parsing of currency amounts typed by users or read from CSV files.

/// Parse an amount such as `12.50`, `12,50`, `R$ 1.234,56` or ` 7 `.
///
/// When both `,` and `.` appear, whichever comes last is the decimal
/// separator and the other groups thousands, so `1.234,56` and `1,234.56`
/// both read as 1234.56. A lone comma is a decimal separator. Returns `None`
/// for empty or unparsable text, for ambiguous separators such as `1,2,3`,
/// and for non-finite numbers.
pub fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_prefix("R$").unwrap_or(text).trim();

    if text.is_empty() {
        return None;
    }

    let normalized = match (text.rfind(','), text.rfind('.')) {
        (Some(comma), Some(period)) if period > comma => {
            if text[period + 1..].contains(',') || !is_grouped(&text[..period], ',') {
                return None;
            }
            text.replace(',', "")
        }
        (Some(comma), Some(_)) => {
            if !is_grouped(&text[..comma], '.') {
                return None;
            }
            text.replace('.', "").replace(',', ".")
        }
        (Some(_), None) if text.matches(',').count() == 1 => text.replace(',', "."),
        (Some(_), None) => return None,
        _ => text.to_owned(),
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

/// Whether the integer part uses `separator` only between groups of three
/// digits, as in `1.234.567`.
fn is_grouped(integer_part: &str, separator: char) -> bool {
    let digits = integer_part.trim_start_matches(['-', '+']);
    let mut groups = digits.split(separator);

    let leading_ok = groups
        .next()
        .is_some_and(|group| (1..=3).contains(&group.len()));

    leading_ok && groups.all(|group| group.len() == 3)
}

/// Parse an amount, treating anything unparsable as zero.
pub fn parse_amount_or_zero(text: &str) -> f64 {
    parse_amount(text).unwrap_or(0.0)
}

/// Format an amount for storage in text form.
///
/// Uses two decimal places when that represents the value exactly and the
/// shortest exact representation otherwise, so reading the text back always
/// gives the same number.
pub fn to_plain_text(amount: f64) -> String {
    let fixed = format!("{amount:.2}");

    if fixed.parse::<f64>() == Ok(amount) {
        fixed
    } else {
        amount.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_amount, parse_amount_or_zero, to_plain_text};

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount("7"), Some(7.0));
        assert_eq!(parse_amount("-3.25"), Some(-3.25));
    }

    #[test]
    fn tolerates_whitespace_and_currency_prefix() {
        assert_eq!(parse_amount("  12.50 "), Some(12.5));
        assert_eq!(parse_amount("R$ 12,50"), Some(12.5));
        assert_eq!(parse_amount("R$1.234,56"), Some(1234.56));
    }

    #[test]
    fn comma_is_a_decimal_separator() {
        assert_eq!(parse_amount("8,75"), Some(8.75));
    }

    #[test]
    fn last_separator_is_the_decimal_point() {
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("R$ 1.234.567,89"), Some(1234567.89));
        assert_eq!(parse_amount("1,234,567.5"), Some(1234567.5));
    }

    #[test]
    fn misplaced_separators_are_none() {
        assert_eq!(parse_amount("1,2,3"), None);
        assert_eq!(parse_amount("12,34.5,6"), None);
        assert_eq!(parse_amount("1,23.45"), None);
        assert_eq!(parse_amount("12.34,5"), None);
    }

    #[test]
    fn unparsable_text_is_none() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn unparsable_text_defaults_to_zero() {
        assert_eq!(parse_amount_or_zero("abc"), 0.0);
        assert_eq!(parse_amount_or_zero(" 3 "), 3.0);
    }

    #[test]
    fn plain_text_uses_two_decimals_when_exact() {
        assert_eq!(to_plain_text(12.5), "12.50");
        assert_eq!(to_plain_text(0.0), "0.00");
        assert_eq!(to_plain_text(10.125), "10.125");
    }
}
