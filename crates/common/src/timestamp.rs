//! Parsing and formatting of human-entered timestamps.
//!
//! Token validity bounds are entered on the command line as
//! `HH:mm d-MMM-yyyy` (24-hour clock, e.g. `22:30 4-Sep-2026`). Parsing
//! tries that exact format first and falls back to a handful of common
//! alternatives, logging a warning when a fallback matched. Every
//! timestamp quoted in a diagnostic is rendered in the same format.

use crate::{ErrorSet, Validated};
use chrono::{DateTime, NaiveDateTime, Utc};

/// The format we document and expect, in its user-facing notation.
pub const EXPECTED_TIMESTAMP_FORMAT: &str = "HH:mm d-MMM-yyyy";

// chrono equivalent of EXPECTED_TIMESTAMP_FORMAT (parsing accepts
// unpadded day-of-month).
const PRIMARY_FORMAT: &str = "%H:%M %d-%b-%Y";

// Fallbacks tried, in order, when the input is not in the expected format.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%b-%Y %H:%M",
];

/// Parse a timestamp supplied by a user.
///
/// `name` identifies the field being parsed (e.g. `NotBefore`) so the
/// diagnostic names both the offending value and the expected format.
pub fn parse_timestamp(value: &str, name: &str) -> Validated<DateTime<Utc>> {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value.trim(), PRIMARY_FORMAT) {
        return Validated::ok(parsed.and_utc());
    }

    for format in FALLBACK_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value.trim(), format) {
            tracing::warn!(
                target: "common.timestamp",
                field = name,
                value,
                expected = EXPECTED_TIMESTAMP_FORMAT,
                "Timestamp was not in the expected format; accepted via fallback"
            );
            return Validated::ok(parsed.and_utc());
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value.trim()) {
        tracing::warn!(
            target: "common.timestamp",
            field = name,
            value,
            expected = EXPECTED_TIMESTAMP_FORMAT,
            "Timestamp was not in the expected format; accepted as RFC 3339"
        );
        return Validated::ok(parsed.with_timezone(&Utc));
    }

    Validated::Invalid(ErrorSet::of(format!(
        "Unable to parse {name} timestamp '{value}' (expected format '{EXPECTED_TIMESTAMP_FORMAT}')"
    )))
}

/// Render an instant in the expected format for use in diagnostics.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%H:%M %-d-%b-%Y").to_string()
}

/// Render a Unix timestamp (seconds) in the expected format.
///
/// Out-of-range values fall back to the raw number so a diagnostic can
/// always be produced.
#[must_use]
pub fn format_unix_timestamp(seconds: i64) -> String {
    match DateTime::from_timestamp(seconds, 0) {
        Some(instant) => format_timestamp(instant),
        None => seconds.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_expected_format() {
        let parsed = parse_timestamp("22:30 4-Sep-2026", "NotAfter")
            .into_result()
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 9, 4, 22, 30, 0).unwrap());
    }

    #[test]
    fn parses_expected_format_with_padded_day() {
        let parsed = parse_timestamp("09:05 04-Sep-2026", "NotAfter")
            .into_result()
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 9, 4, 9, 5, 0).unwrap());
    }

    #[test]
    fn parses_iso_fallback() {
        let parsed = parse_timestamp("2026-09-04 22:30:00", "NotBefore")
            .into_result()
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 9, 4, 22, 30, 0).unwrap());
    }

    #[test]
    fn failure_names_field_and_expected_format() {
        let errors = parse_timestamp("next tuesday", "NotBefore")
            .into_result()
            .unwrap_err();
        assert!(errors.any_contains("NotBefore"));
        assert!(errors.any_contains("next tuesday"));
        assert!(errors.any_contains(EXPECTED_TIMESTAMP_FORMAT));
    }

    #[test]
    fn format_round_trips_through_parse() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 3, 14, 30, 0).unwrap();
        let rendered = format_timestamp(instant);
        assert_eq!(rendered, "14:30 3-Jan-2026");
        let reparsed = parse_timestamp(&rendered, "NotAfter").into_result().unwrap();
        assert_eq!(reparsed, instant);
    }

    #[test]
    fn format_unix_timestamp_handles_epoch() {
        assert_eq!(format_unix_timestamp(0), "00:00 1-Jan-1970");
    }
}
