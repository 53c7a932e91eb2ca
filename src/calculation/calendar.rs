//! Calendar utilities.
//!
//! This module provides the day-type predicates used by the sandwich rule,
//! inclusive day-range iteration, and the month and quarter boundary helpers
//! the accrual runs are scheduled against.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Represents the type of a calendar day for leave counting.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::DayType;
///
/// let day_type = DayType::Weekend;
/// assert_eq!(format!("{:?}", day_type), "Weekend");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    /// Monday through Friday and not a holiday.
    Working,
    /// Saturday or Sunday.
    Weekend,
    /// A declared holiday falling on a weekday.
    Holiday,
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayType::Working => write!(f, "Working"),
            DayType::Weekend => write!(f, "Weekend"),
            DayType::Holiday => write!(f, "Holiday"),
        }
    }
}

/// Determines the day type for a date.
///
/// Weekends take precedence over holidays, so a holiday that falls on a
/// Saturday is reported as [`DayType::Weekend`].
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::{DayType, get_day_type};
/// use chrono::NaiveDate;
/// use std::collections::BTreeSet;
///
/// let holidays: BTreeSet<NaiveDate> = [NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()].into();
///
/// // 2025-12-25 is a Thursday
/// assert_eq!(get_day_type(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(), &holidays), DayType::Holiday);
/// // 2025-12-27 is a Saturday
/// assert_eq!(get_day_type(NaiveDate::from_ymd_opt(2025, 12, 27).unwrap(), &holidays), DayType::Weekend);
/// // 2025-12-29 is a Monday
/// assert_eq!(get_day_type(NaiveDate::from_ymd_opt(2025, 12, 29).unwrap(), &holidays), DayType::Working);
/// ```
pub fn get_day_type(date: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> DayType {
    if is_weekend(date) {
        DayType::Weekend
    } else if holidays.contains(&date) {
        DayType::Holiday
    } else {
        DayType::Working
    }
}

/// Returns true for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Returns true if `date` is a weekend or a holiday.
pub fn is_non_working_day(date: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> bool {
    get_day_type(date, holidays) != DayType::Working
}

/// Iterates over every date in `[from, to]`.
///
/// Yields nothing when `from > to`.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::days_inclusive;
/// use chrono::NaiveDate;
///
/// let from = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
/// let to = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
/// assert_eq!(days_inclusive(from, to).count(), 4);
/// assert_eq!(days_inclusive(to, from).count(), 0);
/// ```
pub fn days_inclusive(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |date| *date <= to)
}

/// Anchors a wall-clock time to a calendar day.
pub fn at_time(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// Returns the first day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Returns the last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date) + Months::new(1) - Days::new(1)
}

/// Returns January 1st of the year containing `date`.
pub fn year_start(date: NaiveDate) -> NaiveDate {
    month_start(date) - Months::new(date.month0())
}

/// Returns December 31st of the year containing `date`.
pub fn year_end(date: NaiveDate) -> NaiveDate {
    year_start(date) + Months::new(12) - Days::new(1)
}

/// Returns the calendar quarter (1 to 4) containing `date`.
pub fn quarter_of(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

/// Returns the first day of the quarter containing `date`.
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    month_start(date) - Months::new(date.month0() % 3)
}

/// Returns the last day of the quarter containing `date`.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::quarter_end;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
/// assert_eq!(quarter_end(date), NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
/// ```
pub fn quarter_end(date: NaiveDate) -> NaiveDate {
    quarter_start(date) + Months::new(3) - Days::new(1)
}

/// Returns true if `date` is the last day of a calendar quarter.
pub fn is_quarter_end(date: NaiveDate) -> bool {
    quarter_end(date) == date
}

/// Returns the first quarter end strictly after `date`.
pub fn next_quarter_end_after(date: NaiveDate) -> NaiveDate {
    let end = quarter_end(date);
    if end > date {
        end
    } else {
        quarter_end(date + Days::new(1))
    }
}
