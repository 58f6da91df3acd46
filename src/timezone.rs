//! Resolving the current date in the user's timezone.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// The timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// Get the current UTC offset of a canonical timezone name such as
/// `America/Sao_Paulo`.
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`.
///
/// Returns `None` if the name is not a known timezone.
pub fn today_in(canonical_timezone: &str) -> Option<Date> {
    let offset = get_local_offset(canonical_timezone)?;

    Some(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use time::{OffsetDateTime, UtcOffset};

    use crate::timezone::{DEFAULT_TIMEZONE, get_local_offset, today_in};

    #[test]
    fn unknown_timezone_gives_none() {
        assert_eq!(get_local_offset("Not/A_Zone"), None);
        assert_eq!(today_in("Not/A_Zone"), None);
    }

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn default_timezone_is_three_hours_behind_utc() {
        assert_eq!(
            get_local_offset(DEFAULT_TIMEZONE),
            UtcOffset::from_hms(-3, 0, 0).ok()
        );
    }

    #[test]
    fn today_is_within_a_day_of_utc() {
        let today = today_in(DEFAULT_TIMEZONE).unwrap();
        let utc_today = OffsetDateTime::now_utc().date();

        assert!((utc_today - today).whole_days().abs() <= 1);
    }
}
