//! Subscription period rules.
//!
//! Periods cover whole calendar months: a subscription always ends on the
//! last day of its final month, whatever day it started on.

use chrono::{Datelike, Months, NaiveDate};
use service_core::error::AppError;

/// Default start day of month for subscriptions without an explicit start.
pub const BILLING_DAY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

/// The billing day of the month after `today`.
pub fn default_start_date(today: NaiveDate) -> Result<NaiveDate, AppError> {
    first_of_month(today)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.with_day(BILLING_DAY))
        .ok_or_else(|| out_of_range("start_date"))
}

/// Last calendar day of the month `duration_in_months` after the start month.
pub fn end_date(start_date: NaiveDate, duration_in_months: u32) -> Result<NaiveDate, AppError> {
    first_of_month(start_date)
        .and_then(|first| first.checked_add_months(Months::new(duration_in_months + 1)))
        .and_then(|after| after.pred_opt())
        .ok_or_else(|| out_of_range("end_date"))
}

pub fn is_active(end_date: NaiveDate, today: NaiveDate) -> bool {
    today <= end_date
}

pub fn resolve_period(
    explicit_start: Option<NaiveDate>,
    duration_in_months: u32,
    today: NaiveDate,
) -> Result<Period, AppError> {
    let start_date = match explicit_start {
        Some(date) => date,
        None => default_start_date(today)?,
    };
    let end_date = end_date(start_date, duration_in_months)?;

    Ok(Period {
        start_date,
        end_date,
        active: is_active(end_date, today),
    })
}

/// Parse an optional `YYYY-MM-DD` field. Blank counts as absent.
pub fn parse_date_field(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                AppError::validation(
                    field,
                    "invalid_date",
                    format!("{} must be a calendar date in YYYY-MM-DD format", field),
                )
            }),
    }
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

fn out_of_range(field: &'static str) -> AppError {
    AppError::validation(field, "out_of_range", format!("{} is out of range", field))
}
