use crate::error::{BillingError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use std::time::Duration;

/// Returns the first instant of the month following `now`, at midnight in
/// `now`'s time zone. December rolls over to January 1st of the next year.
///
/// If midnight does not exist locally (a DST gap), the first valid instant of
/// that day's first hour is used instead.
pub fn next_billing_run<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<DateTime<Tz>> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    let midnight = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| out_of_range(year, month))?;

    let tz = now.timezone();
    resolve_local(&tz, midnight)
        .or_else(|| resolve_local(&tz, midnight + TimeDelta::hours(1)))
        .ok_or_else(|| out_of_range(year, month))
}

/// Time left until the next billing run, never negative.
pub fn delay_until_next_run<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<Duration> {
    let target = next_billing_run(now)?;
    Ok(target
        .signed_duration_since(now)
        .to_std()
        .unwrap_or(Duration::ZERO))
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local).earliest()
}

fn out_of_range(year: i32, month: u32) -> BillingError {
    BillingError::ValidationError(format!(
        "Billing date {}-{:02}-01 is out of range",
        year, month
    ))
}
