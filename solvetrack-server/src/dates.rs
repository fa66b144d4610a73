//! Calendar-day handling.
//!
//! Summaries and streaks work in server-local days: a problem solved at
//! 23:50 local time belongs to that local date even though its stored UTC
//! timestamp may already be on the next day.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::error::ApiError;

/// Parse a client-supplied day, either `YYYY-MM-DD` or a full RFC 3339
/// timestamp (interpreted in server-local time).
pub fn parse_day(raw: &str) -> Result<NaiveDate, ApiError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).date_naive())
        .map_err(|_| ApiError::validation(format!("Invalid date: {raw}")))
}

/// UTC instant at which the local calendar day starts.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST transition; fall back to UTC midnight.
        None => Utc.from_utc_datetime(&midnight),
    }
}

/// UTC instant just before the local calendar day ends.
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    let last_ms = date.and_hms_milli_opt(23, 59, 59, 999).unwrap_or_default();
    match Local.from_local_datetime(&last_ms).latest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&last_ms),
    }
}

/// Today in server-local time; the anchor for streaks and auto-calculation.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
