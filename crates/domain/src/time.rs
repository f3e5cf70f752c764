//! Time-window arithmetic and output date formatting.
//!
//! Two deliberately separate policies live here:
//!
//! - **Window boundaries** are computed from naive wall-clock dates in the
//!   tenant's timezone, then converted to UTC instants. A human in the
//!   tenant's locale gets "their" month, even for invoices issued near
//!   midnight at a month boundary.
//! - **Output dates** are rendered by extracting UTC components from the
//!   stored timestamp, with no timezone conversion. A stored ISO date is
//!   shown at face value.
//!
//! Do not unify these: doing so changes which calendar month a boundary
//! invoice is attributed to.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{Result, SynclineError};

/// Half-open time window `[start, end)` in UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Whether `ts` falls inside the window (inclusive start, exclusive end).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Window covering one calendar month in the tenant's timezone.
pub fn month_window(tz: Tz, year: i32, month: u32) -> Result<TimeWindow> {
    let start = local_midnight(tz, year, month, 1)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = local_midnight(tz, next_year, next_month, 1)?;
    Ok(TimeWindow { start, end })
}

/// Window covering one calendar year in the tenant's timezone.
pub fn year_window(tz: Tz, year: i32) -> Result<TimeWindow> {
    let start = local_midnight(tz, year, 1, 1)?;
    let end = local_midnight(tz, year + 1, 1, 1)?;
    Ok(TimeWindow { start, end })
}

/// Year-to-date window: January 1 of `now`'s local year through `now`.
pub fn ytd_window(tz: Tz, now: DateTime<Utc>) -> Result<TimeWindow> {
    let local_year = now.with_timezone(&tz).year();
    let start = local_midnight(tz, local_year, 1, 1)?;
    Ok(TimeWindow { start, end: now })
}

/// Midnight of a local calendar date, converted to a UTC instant.
fn local_midnight(tz: Tz, year: i32, month: u32, day: u32) -> Result<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        SynclineError::InvalidInput(format!("invalid calendar date: {year}-{month:02}-{day:02}"))
    })?;
    let naive = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
        SynclineError::Internal(format!("could not derive midnight for {date}"))
    })?;

    // DST folds resolve to the earliest instant; a midnight that falls in a
    // DST gap slides forward to 01:00.
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| date.and_hms_opt(1, 0, 0).and_then(|n| tz.from_local_datetime(&n).earliest()))
        .ok_or_else(|| {
            SynclineError::InvalidInput(format!("unrepresentable local midnight: {naive} in {tz}"))
        })?;

    Ok(local.with_timezone(&Utc))
}

/// Parse a backend-native timestamp into a UTC instant.
///
/// Accepts RFC 3339 strings, bare `YYYY-MM-DD` dates (taken as UTC
/// midnight), and epoch strings (milliseconds when the magnitude says so,
/// seconds otherwise). Returns `None` for anything unparseable.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }

    if let Ok(epoch) = trimmed.parse::<i64>() {
        // Anything past ~5138 CE in seconds is an epoch-millisecond value.
        let millis = if epoch.abs() >= 100_000_000_000 { epoch } else { epoch.checked_mul(1000)? };
        return DateTime::from_timestamp_millis(millis);
    }

    None
}

/// Render a stored timestamp as `MM/DD/YYYY` from its UTC components.
///
/// Unparseable or missing input renders as an empty string; rows never
/// fail to build over a bad date.
pub fn format_mdy(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.format("%m/%d/%Y").to_string(),
        None => String::new(),
    }
}
