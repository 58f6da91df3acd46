//! Calendar date parsing, normalization and display.
//!
//! Records only ever carry a calendar day. Timestamps are reduced to their
//! calendar part as written, without any timezone conversion, so the same day
//! never shifts to its neighbour when it is parsed and written back.

use serde::Serializer;
use time::{Date, Weekday, format_description::BorrowedFormatItem, macros::format_description};

const ISO_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const DISPLAY_FORMAT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

/// Parse a calendar date written as `YYYY-MM-DD`, `DD/MM/YYYY`, or an ISO
/// timestamp such as `2024-03-05T23:30:00-03:00`.
///
/// Returns `None` if `text` is not a valid date in any of those forms.
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();

    if let Ok(date) = Date::parse(text, ISO_FORMAT) {
        return Some(date);
    }

    if let Ok(date) = Date::parse(text, DISPLAY_FORMAT) {
        return Some(date);
    }

    // Timestamps: keep the calendar part verbatim.
    let (calendar_part, rest) = text.split_at_checked(10)?;
    if rest.starts_with('T') || rest.starts_with(' ') {
        return Date::parse(calendar_part, ISO_FORMAT).ok();
    }

    None
}

/// Whether `text` is already in the canonical `YYYY-MM-DD` form.
pub fn is_canonical(text: &str) -> bool {
    Date::parse(text, ISO_FORMAT).is_ok()
}

/// Format a date in the canonical `YYYY-MM-DD` form.
pub fn to_iso(date: Date) -> String {
    date.to_string()
}

/// Format a date for display as `DD/MM/YYYY`.
pub fn to_display(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

/// The Portuguese name of a weekday.
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sunday => "Domingo",
        Weekday::Monday => "Segunda-feira",
        Weekday::Tuesday => "Terça-feira",
        Weekday::Wednesday => "Quarta-feira",
        Weekday::Thursday => "Quinta-feira",
        Weekday::Friday => "Sexta-feira",
        Weekday::Saturday => "Sábado",
    }
}

/// Serialize a date as `YYYY-MM-DD`, for use with `#[serde(serialize_with)]`.
pub fn serialize_iso<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(date)
}

#[cfg(test)]
mod tests {
    use time::{Weekday, macros::date};

    use super::{is_canonical, parse_date, to_display, to_iso, weekday_label};

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_date("2024-03-05"), Some(date!(2024 - 03 - 05)));
    }

    #[test]
    fn parses_display_date() {
        assert_eq!(parse_date("05/03/2024"), Some(date!(2024 - 03 - 05)));
    }

    #[test]
    fn parses_timestamp_without_shifting_the_day() {
        assert_eq!(
            parse_date("2024-03-05T23:30:00-03:00"),
            Some(date!(2024 - 03 - 05))
        );
        assert_eq!(
            parse_date("2024-03-05T00:10:00Z"),
            Some(date!(2024 - 03 - 05))
        );
        assert_eq!(parse_date("2024-03-05 08:00"), Some(date!(2024 - 03 - 05)));
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(parse_date("  2024-03-05 "), Some(date!(2024 - 03 - 05)));
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("31/02/2024"), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-03-05garbage"), None);
    }

    #[test]
    fn iso_round_trip_is_stable() {
        let date = date!(2024 - 12 - 31);

        assert_eq!(parse_date(&to_iso(date)), Some(date));
        assert_eq!(to_iso(date), "2024-12-31");
    }

    #[test]
    fn display_format_pads_day_and_month() {
        assert_eq!(to_display(date!(2024 - 01 - 07)), "07/01/2024");
    }

    #[test]
    fn canonical_check_only_accepts_iso() {
        assert!(is_canonical("2024-01-07"));
        assert!(!is_canonical("07/01/2024"));
        assert!(!is_canonical("2024-01-07T10:00:00"));
    }

    #[test]
    fn weekday_labels_are_portuguese() {
        assert_eq!(weekday_label(Weekday::Sunday), "Domingo");
        assert_eq!(weekday_label(Weekday::Saturday), "Sábado");
    }
}
