//! Holiday reference data.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A declared holiday.
///
/// # Example
///
/// ```
/// use hr_policy_engine::models::{Holiday, holiday_dates};
/// use chrono::NaiveDate;
///
/// let holidays = vec![Holiday {
///     date: NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
///     name: "Christmas Day".to_string(),
/// }];
/// assert!(holiday_dates(&holidays).contains(&NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub name: String,
}

/// Collects the dates of `holidays` into an ordered set.
pub fn holiday_dates(holidays: &[Holiday]) -> BTreeSet<NaiveDate> {
    holidays.iter().map(|h| h.date).collect()
}
