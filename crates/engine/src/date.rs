//! Calendar-date handling for budget fields.
//!
//! Budget dates are calendar days, not instants. They are stored as
//! [`NaiveDate`] and cross the wire as `YYYY-MM-DD`. Instants only appear at
//! the edges (a user picking "today" in their time zone, server timestamps),
//! and the helpers here are the only place where an instant becomes a date or
//! the other way round.
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::EngineError;

const WIRE_FORMAT: &str = "%Y-%m-%d";

/// Formats a calendar date as `YYYY-MM-DD`.
#[must_use]
pub fn format_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` wire date from its numeric components.
///
/// A trailing time part (`2024-01-01T00:00:00`) is ignored: only the calendar
/// components the server wrote are read, no time zone is ever applied.
pub fn parse_wire_date(value: &str) -> Result<NaiveDate, EngineError> {
    let invalid = || EngineError::InvalidDate(value.to_string());

    let day_part = value.trim().split(['T', ' ']).next().unwrap_or_default();
    let mut parts = day_part.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let day: u32 = day.parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Returns the calendar date of `at` as seen on a wall clock in its own zone.
#[must_use]
pub fn local_calendar_date<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDate {
    at.date_naive()
}

/// Returns noon of `date` in `tz`.
///
/// Noon is the safest instant to hand to components that only deal with
/// instants: any offset within ±12h maps it back to the same day.
#[must_use]
pub fn at_noon<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0)?;
    tz.from_local_datetime(&date.and_time(noon)).earliest()
}

/// Parses a server timestamp.
///
/// RFC 3339 values keep their offset; offset-less ISO values are taken as
/// UTC. Anything else yields `None`.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
