//! Reporting time windows.
//!
//! A window is a closed UTC interval, either a calendar month or an explicit
//! start/end date pair. The end is always clamped to "now" so queries over a
//! month in progress never ask Prometheus about the future.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self { start, end: end.min(now) }
    }

    /// Window length in whole seconds, floored at zero. Used as the range
    /// selector in `increase()` queries.
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }
}

/// Build the CLI's window from its mutually exclusive argument forms.
pub fn resolve_window(
    month: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TimeWindow> {
    match (month, start_date, end_date) {
        (Some(month), None, None) => window_from_month(month, now),
        (None, Some(start), Some(end)) => window_from_dates(start, end, now),
        _ => Err(Error::usage(
            "provide either --month YYYY-MM or both start_date and end_date (YYYY-MM-DD)",
        )),
    }
}

/// The calendar month `YYYY-MM`: first day 00:00:00 through last day
/// 23:59:59, UTC.
pub fn window_from_month(month: &str, now: DateTime<Utc>) -> Result<TimeWindow> {
    let parse_err = || Error::usage(format!("invalid month {month:?}, expected YYYY-MM"));

    let (year, month_num) = month.split_once('-').ok_or_else(parse_err)?;
    let year: i32 = year.parse().map_err(|_| parse_err())?;
    let month_num: u32 = month_num.parse().map_err(|_| parse_err())?;

    let first = NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(parse_err)?;
    let next_month = if month_num == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_num + 1, 1)
    }
    .ok_or_else(parse_err)?;
    let last = next_month.pred_opt().ok_or_else(parse_err)?;

    Ok(TimeWindow::new(day_start(first), day_end(last), now))
}

/// An explicit `YYYY-MM-DD` date pair, inclusive on both ends.
pub fn window_from_dates(start: &str, end: &str, now: DateTime<Utc>) -> Result<TimeWindow> {
    let parse = |raw: &str| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| Error::usage(format!("invalid date {raw:?}, expected YYYY-MM-DD")))
    };
    Ok(TimeWindow::new(day_start(parse(start)?), day_end(parse(end)?), now))
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    // 23:59:59 always exists
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(end_of_day))
}
