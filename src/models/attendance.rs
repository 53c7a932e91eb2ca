//! Attendance policy and record models.
//!
//! This module defines the [`AttendancePolicy`] configuration that attendance is
//! judged against, the per-day [`AttendanceRecord`], and the resulting
//! [`AttendanceStatus`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calculation::at_time;
use crate::error::{EngineError, EngineResult};

/// The status derived for one attendance record.
///
/// # Example
///
/// ```
/// use hr_policy_engine::models::AttendanceStatus;
///
/// let status: AttendanceStatus = serde_json::from_str("\"half_day\"").unwrap();
/// assert_eq!(status, AttendanceStatus::HalfDay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Worked a full day, on time.
    Present,
    /// Checked in after the late grace period.
    Late,
    /// Worked at least the half-day threshold but clearly short of a full day.
    HalfDay,
    /// Worked less than the half-day threshold.
    Absent,
    /// Left inside the hour before the end of the working day, past the grace cutoff.
    EarlyDeparture,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "present"),
            AttendanceStatus::Late => write!(f, "late"),
            AttendanceStatus::HalfDay => write!(f, "half_day"),
            AttendanceStatus::Absent => write!(f, "absent"),
            AttendanceStatus::EarlyDeparture => write!(f, "early_departure"),
        }
    }
}

/// One revision of an attendance policy.
///
/// Policies are immutable per revision and fully populated: every default is
/// resolved when the configuration is loaded, so nothing downstream has to
/// guess at a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePolicy {
    /// Unique identifier for the policy revision.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Start of the working day.
    pub work_start_time: NaiveTime,
    /// End of the working day.
    pub work_end_time: NaiveTime,
    /// Minutes after `work_start_time` during which a check-in is still on time.
    pub late_grace_period_minutes: i64,
    /// Minutes before `work_end_time` during which a check-out is not early.
    pub early_grace_period_minutes: i64,
    /// Whether late check-ins are flagged.
    pub enable_late_tracking: bool,
    /// Whether early check-outs are flagged.
    pub enable_early_tracking: bool,
    /// Whether break time counts as worked time.
    pub include_break_in_worked_time: bool,
    /// Minimum worked minutes for a half day.
    pub half_day_minutes: i64,
    /// Worked minutes making up a full day.
    pub full_day_minutes: i64,
    /// First day this revision applies (inclusive, `None` is unbounded).
    pub effective_from: Option<NaiveDate>,
    /// Last day this revision applies (inclusive, `None` is unbounded).
    pub effective_to: Option<NaiveDate>,
}

impl AttendancePolicy {
    /// Returns true if this revision is in force on `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_policy_engine::models::AttendancePolicy;
    /// use chrono::{NaiveDate, NaiveTime};
    ///
    /// let policy = AttendancePolicy {
    ///     id: "standard".to_string(),
    ///     name: "Standard".to_string(),
    ///     work_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    ///     work_end_time: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
    ///     late_grace_period_minutes: 15,
    ///     early_grace_period_minutes: 15,
    ///     enable_late_tracking: true,
    ///     enable_early_tracking: true,
    ///     include_break_in_worked_time: false,
    ///     half_day_minutes: 240,
    ///     full_day_minutes: 510,
    ///     effective_from: NaiveDate::from_ymd_opt(2025, 1, 1),
    ///     effective_to: None,
    /// };
    /// assert!(policy.is_effective_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    /// assert!(!policy.is_effective_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
    /// ```
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from.is_none_or(|from| date >= from)
            && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns the start of the working day anchored to `date`.
    pub fn work_start_on(&self, date: NaiveDate) -> NaiveDateTime {
        at_time(date, self.work_start_time)
    }

    /// Returns the end of the working day anchored to `date`.
    pub fn work_end_on(&self, date: NaiveDate) -> NaiveDateTime {
        at_time(date, self.work_end_time)
    }

    /// Checks the invariants every revision must satisfy.
    pub fn validate(&self) -> EngineResult<()> {
        if self.half_day_minutes >= self.full_day_minutes {
            return Err(EngineError::InvalidPolicy {
                policy_id: self.id.clone(),
                message: format!(
                    "half_day_minutes ({}) must be less than full_day_minutes ({})",
                    self.half_day_minutes, self.full_day_minutes
                ),
            });
        }
        if self.late_grace_period_minutes < 0 || self.early_grace_period_minutes < 0 {
            return Err(EngineError::InvalidPolicy {
                policy_id: self.id.clone(),
                message: "grace periods cannot be negative".to_string(),
            });
        }
        if let (Some(from), Some(to)) = (self.effective_from, self.effective_to) {
            if from > to {
                return Err(EngineError::InvalidPolicy {
                    policy_id: self.id.clone(),
                    message: format!("effective_from {} is after effective_to {}", from, to),
                });
            }
        }
        Ok(())
    }
}

/// A break taken during a working day. Either end may still be open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakInterval {
    /// When the break started.
    pub start: Option<NaiveDateTime>,
    /// When the break ended.
    pub end: Option<NaiveDateTime>,
}

impl BreakInterval {
    /// Returns the absolute length of the break in minutes, if both ends are known.
    pub fn duration_minutes(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((end - start).num_minutes().abs()),
            _ => None,
        }
    }
}

/// One employee's attendance on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The employee the record belongs to.
    pub employee_id: String,
    /// The calendar date the record is for.
    pub date: NaiveDate,
    /// The check-in timestamp, if one was captured.
    pub check_in: Option<NaiveDateTime>,
    /// The check-out timestamp, if one was captured.
    pub check_out: Option<NaiveDateTime>,
    /// Breaks in the order they were taken.
    #[serde(default)]
    pub breaks: Vec<BreakInterval>,
}
