//! Sandwich-day calculation for leave requests.
//!
//! Under the sandwich rule, weekends and holidays that fall inside or beside a
//! leave span are consumed along with the requested working days. This module
//! counts those days and estimates how many working days a request costs.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::AuditWarning;

use super::calendar::{days_inclusive, is_non_working_day};

/// Warning code attached when a working-day boundary touches a non-working run.
pub const AMBIGUOUS_SANDWICH_BOUNDARY: &str = "AMBIGUOUS_SANDWICH_BOUNDARY";

/// The estimate for one leave request after applying the sandwich rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandwichEstimate {
    /// First day the employee asked for.
    pub requested_from: NaiveDate,
    /// Last day the employee asked for.
    pub requested_to: NaiveDate,
    /// First day of the span after extension.
    pub extended_from: NaiveDate,
    /// Last day of the span after extension.
    pub extended_to: NaiveDate,
    /// Calendar days in the extended span.
    pub total_days: i64,
    /// Weekend and holiday days in the extended span.
    pub sandwich_days: i64,
    /// `total_days - sandwich_days`.
    pub effective_days: i64,
    /// Boundary situations the product rules do not settle yet.
    pub warnings: Vec<AuditWarning>,
}

/// Counts the weekend and holiday days in `[from, to]`.
///
/// Weekends are always Saturday and Sunday regardless of any policy.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::count_sandwich_days;
/// use chrono::NaiveDate;
/// use std::collections::BTreeSet;
///
/// // Friday 2025-01-10 to Monday 2025-01-13 spans one weekend
/// let from = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
/// let to = NaiveDate::from_ymd_opt(2025, 1, 13).unwrap();
/// assert_eq!(count_sandwich_days(from, to, &BTreeSet::new()), 2);
/// ```
pub fn count_sandwich_days(from: NaiveDate, to: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> i64 {
    days_inclusive(from, to)
        .filter(|date| is_non_working_day(*date, holidays))
        .count() as i64
}

/// Estimates the effective working days of a leave request.
///
/// The span is extended outward one day at a time while the boundary date
/// itself is a weekend or holiday. A request whose boundary is a working day is
/// not extended, even when a weekend sits right next to it (for example a
/// Friday request followed by a separate Monday request). That case is
/// reported with an [`AMBIGUOUS_SANDWICH_BOUNDARY`] warning and does not change
/// the counts.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDateRange`] when `from > to`.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::estimate_effective_days;
/// use chrono::NaiveDate;
/// use std::collections::BTreeSet;
///
/// // Monday 2025-01-06 to Wednesday 2025-01-08
/// let from = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
/// let to = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
/// let estimate = estimate_effective_days(from, to, &BTreeSet::new()).unwrap();
///
/// assert_eq!(estimate.total_days, 3);
/// assert_eq!(estimate.sandwich_days, 0);
/// assert_eq!(estimate.effective_days, 3);
/// ```
pub fn estimate_effective_days(
    from: NaiveDate,
    to: NaiveDate,
    holidays: &BTreeSet<NaiveDate>,
) -> EngineResult<SandwichEstimate> {
    if from > to {
        return Err(EngineError::InvalidDateRange { from, to });
    }

    let mut extended_from = from;
    while is_non_working_day(extended_from, holidays) {
        extended_from = extended_from - Days::new(1);
    }

    let mut extended_to = to;
    while is_non_working_day(extended_to, holidays) {
        extended_to = extended_to + Days::new(1);
    }

    let total_days = (extended_to - extended_from).num_days() + 1;
    let sandwich_days = count_sandwich_days(extended_from, extended_to, holidays);

    let mut warnings = Vec::new();
    if extended_from == from && is_non_working_day(from - Days::new(1), holidays) {
        warnings.push(boundary_warning(from, "starts", "after"));
    }
    if extended_to == to && is_non_working_day(to + Days::new(1), holidays) {
        warnings.push(boundary_warning(to, "ends", "before"));
    }

    Ok(SandwichEstimate {
        requested_from: from,
        requested_to: to,
        extended_from,
        extended_to,
        total_days,
        sandwich_days,
        effective_days: total_days - sandwich_days,
        warnings,
    })
}

fn boundary_warning(boundary: NaiveDate, verb: &str, relation: &str) -> AuditWarning {
    AuditWarning {
        code: AMBIGUOUS_SANDWICH_BOUNDARY.to_string(),
        message: format!(
            "Leave {} on working day {} directly {} a weekend or holiday; adjacent non-working days were not counted",
            verb, boundary, relation
        ),
        severity: "low".to_string(),
    }
}
