//! # Calendar Helpers
//!
//! Pure date-window calculations for billing ranges and dashboard rollups.
//!
//! All functions take their reference instant as an argument, so they stay
//! deterministic and testable; callers pass `Utc::now()` at the edge.
//!
//! Date-only inputs widen to UTC windows: a range `[start, end]` covers
//! `start 00:00:00.000` through `end 23:59:59.999`, so the end date is
//! inclusive of the entire calendar day.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

/// First instant of the given calendar date (00:00:00.000 UTC).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last instant of the given calendar date (23:59:59.999 UTC).
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    // and_hms_milli_opt only fails on out-of-range components; these are
    // constants.
    let eod = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    Utc.from_utc_datetime(&eod)
}

/// Midnight at the start of `now`'s calendar day.
pub fn start_of_today(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now.date_naive())
}

/// Midnight at the first day of `now`'s calendar month.
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let first = now
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive());
    start_of_day(first)
}
