//! Date parsing and formatting helpers.
//!
//! Ledger dates are wall-clock timestamps (`NaiveDateTime`) in the
//! configured time zone. Input is accepted in several common shapes;
//! output for display is always `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Display format for dates crossing the presentation boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage format for timestamps. The fractional part is omitted when zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const DATETIME_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_ONLY_FORMATS: &[&str] = &[DATE_FORMAT, "%Y/%m/%d"];

/// Parse a free-form date or date/time string.
///
/// Accepts RFC 3339 (the offset is dropped, keeping the written wall-clock
/// time), `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`, `YYYY-MM-DD` and `YYYY/MM/DD`.
/// Date-only values resolve to midnight. Returns `None` when nothing matches.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    DATE_ONLY_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(start_of_day)
}

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable instant of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
}

/// Format a timestamp for storage.
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Format a timestamp as `YYYY-MM-DD` for display.
pub fn format_date(value: &NaiveDateTime) -> String {
    value.format(DATE_FORMAT).to_string()
}
