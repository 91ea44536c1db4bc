//! ISO-8601 instant parsing and UTC normalization.
//!
//! Storage always holds UTC instants with millisecond precision and a `Z`
//! suffix, the same shape a browser's `Date#toISOString` produces. Input is
//! more forgiving: offsets, missing seconds and bare dates are accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::{SchedirError, SchedirResult};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 string into a UTC instant.
///
/// Strings without an offset (or with a trailing `Z`) are read as UTC.
/// A bare `YYYY-MM-DD` is midnight UTC of that day. Anything finer than a
/// millisecond is truncated, so a parsed instant equals its stored form.
pub fn parse_instant(s: &str) -> SchedirResult<DateTime<Utc>> {
    parse_untruncated(s).map(|dt| dt.trunc_subsecs(3))
}

fn parse_untruncated(s: &str) -> SchedirResult<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SchedirError::Validation("empty date".into()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(dt.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(SchedirError::Validation(format!(
        "'{}' is not an ISO-8601 instant",
        s
    )))
}

/// Format an instant the way it is written to storage.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
