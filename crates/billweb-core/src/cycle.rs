//! Credit card statement-cycle resolution
//!
//! An account describes its cycle with three day-of-month markers: the repay
//! day and the first and last day of the usage window that the statement
//! paid on that day covers. Given a reference date, [`resolve_cycle`] finds
//! the repay date in the reference month and the usage window that closes
//! on it.
//!
//! Month arithmetic normalizes out-of-range days the calendar way: day 31 of
//! June is July 1st and day 0 is the last day of the previous month. The
//! repay date is built this way without clamping. Both ends of the usage
//! window are clamped to the last day of their month instead.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::models::Account;

/// Why an account's cycle could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("{field} is not a day of month: {value:?}")]
    InvalidMarker { field: &'static str, value: String },

    #[error("cycle dates out of range for reference {reference}")]
    OutOfRange { reference: NaiveDate },
}

/// The three parsed day-of-month markers of a credit account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDays {
    pub repay_day: i32,
    pub use_day_from: i32,
    pub use_day_to: i32,
}

impl CycleDays {
    pub fn new(repay_day: i32, use_day_from: i32, use_day_to: i32) -> Self {
        Self {
            repay_day,
            use_day_from,
            use_day_to,
        }
    }

    /// Parse the textual markers; each must be a plain integer
    pub fn parse(repay_day: &str, use_day_from: &str, use_day_to: &str) -> Result<Self, CycleError> {
        Ok(Self {
            repay_day: parse_marker("repay-day", repay_day)?,
            use_day_from: parse_marker("use-day-from", use_day_from)?,
            use_day_to: parse_marker("use-day-to", use_day_to)?,
        })
    }

    pub fn from_account(account: &Account) -> Result<Self, CycleError> {
        Self::parse(&account.repay_day, &account.use_day_from, &account.use_day_to)
    }

    /// Month offsets of the usage window's start and end relative to the
    /// repay month. One of (-2,-1), (-2,-2), (-1,0) or (-1,-1).
    pub fn month_offsets(&self) -> (i32, i32) {
        let (mut start, mut end) = (-2, -1);
        if self.use_day_from < self.repay_day {
            start += 1;
            end += 1;
        }
        if self.use_day_from < self.use_day_to {
            end -= 1;
        }
        (start, end)
    }
}

fn parse_marker(field: &'static str, value: &str) -> Result<i32, CycleError> {
    value.parse::<i32>().map_err(|_| CycleError::InvalidMarker {
        field,
        value: value.to_string(),
    })
}

/// Resolved dates of one statement cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDates {
    /// Statement payment day, at midnight
    pub repay_date: NaiveDateTime,
    /// First instant of the usage window
    pub use_date_from: NaiveDateTime,
    /// Last second of the usage window
    pub use_date_to: NaiveDateTime,
}

/// Resolve the cycle whose repay date falls in `reference`'s month
pub fn resolve_cycle(days: CycleDays, reference: NaiveDate) -> Result<CycleDates, CycleError> {
    let out_of_range = || CycleError::OutOfRange { reference };

    let repay = normalized_date(reference.year(), reference.month() as i32, days.repay_day)
        .ok_or_else(out_of_range)?;
    let (start_offset, end_offset) = days.month_offsets();

    let from = clamped_date(repay.year(), repay.month() as i32 + start_offset, days.use_day_from)
        .ok_or_else(out_of_range)?;
    let to = clamped_date(repay.year(), repay.month() as i32 + end_offset, days.use_day_to)
        .ok_or_else(out_of_range)?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(out_of_range)?;

    Ok(CycleDates {
        repay_date: repay.and_time(NaiveTime::MIN),
        use_date_from: from.and_time(NaiveTime::MIN),
        use_date_to: to.and_time(end_of_day),
    })
}

/// Build a date from a possibly out-of-range month (1-based) and day
fn normalized_date(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let first = first_of_month(year, month)?;
    first.checked_add_signed(Duration::days(i64::from(day) - 1))
}

/// Like [`normalized_date`] but a day past the month's end becomes its last day
fn clamped_date(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let first = first_of_month(year, month)?;
    let last_day = last_day_of_month(first)? as i32;
    normalized_date(first.year(), first.month() as i32, day.min(last_day))
}

fn first_of_month(year: i32, month: i32) -> Option<NaiveDate> {
    let zero_based = month - 1;
    let year = year.checked_add(zero_based.div_euclid(12))?;
    let month = zero_based.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn last_day_of_month(first: NaiveDate) -> Option<u32> {
    let next = first_of_month(first.year(), first.month() as i32 + 1)?;
    next.pred_opt().map(|d| d.day())
}
