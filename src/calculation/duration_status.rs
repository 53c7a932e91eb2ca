//! Duration-based attendance classification.
//!
//! Worked minutes are compared against the policy's half-day and full-day
//! thresholds. A day counts as full once it is within an hour of
//! `full_day_minutes`; a full day may still be an early departure when the
//! check-out lands in the last hour before the grace cutoff.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{AttendancePolicy, AttendanceStatus, AuditStep};

/// Minutes short of a full day that still count as a full day.
pub const FULL_DAY_TOLERANCE_MINUTES: i64 = 60;

/// The result of classifying a day by its worked duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationClassification {
    /// `Absent`, `HalfDay`, `EarlyDeparture` or `Present`.
    pub status: AttendanceStatus,
    /// The audit step recording this classification.
    pub audit_step: AuditStep,
}

/// Classifies a day by its worked minutes.
///
/// With `half = half_day_minutes` and `one_hour_short = full_day_minutes - 60`:
/// - `worked < half` is [`AttendanceStatus::Absent`]
/// - `half <= worked < one_hour_short` is [`AttendanceStatus::HalfDay`]
/// - otherwise [`AttendanceStatus::Present`], unless early tracking is on and
///   `work_end - 60min <= check_out < work_end - early_grace`, which is
///   [`AttendanceStatus::EarlyDeparture`]. A check-out exactly at the grace
///   cutoff is not early.
///
/// All boundaries are anchored to `date`, the record's own calendar day.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::classify_duration;
/// use hr_policy_engine::models::{AttendancePolicy, AttendanceStatus};
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
///     effective_from: None,
///     effective_to: None,
/// };
/// let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
///
/// let result = classify_duration(&policy, date, 240, date.and_hms_opt(13, 10, 0), 1);
/// assert_eq!(result.status, AttendanceStatus::HalfDay);
/// ```
pub fn classify_duration(
    policy: &AttendancePolicy,
    date: NaiveDate,
    worked_minutes: i64,
    check_out: Option<NaiveDateTime>,
    step_number: u32,
) -> DurationClassification {
    let half = policy.half_day_minutes;
    let one_hour_short = policy.full_day_minutes - FULL_DAY_TOLERANCE_MINUTES;

    let mut early_window = None;
    let (status, reasoning) = if worked_minutes < half {
        (
            AttendanceStatus::Absent,
            format!(
                "{} worked minutes is below the {} minute half-day threshold",
                worked_minutes, half
            ),
        )
    } else if worked_minutes < one_hour_short {
        (
            AttendanceStatus::HalfDay,
            format!(
                "{} worked minutes is at least {} but below the {} minute full-day threshold",
                worked_minutes, half, one_hour_short
            ),
        )
    } else {
        match check_out.filter(|_| policy.enable_early_tracking) {
            Some(check_out) => {
                let end = policy.work_end_on(date);
                let window_start = end - Duration::minutes(FULL_DAY_TOLERANCE_MINUTES);
                let window_end = end - Duration::minutes(policy.early_grace_period_minutes);
                early_window = Some((window_start, window_end));

                if window_start <= check_out && check_out < window_end {
                    (
                        AttendanceStatus::EarlyDeparture,
                        format!(
                            "Checked out at {} inside the early-departure window [{}, {})",
                            check_out.time(),
                            window_start.time(),
                            window_end.time()
                        ),
                    )
                } else {
                    (
                        AttendanceStatus::Present,
                        format!(
                            "{} worked minutes meets the full-day threshold and check-out at {} is outside [{}, {})",
                            worked_minutes,
                            check_out.time(),
                            window_start.time(),
                            window_end.time()
                        ),
                    )
                }
            }
            None => (
                AttendanceStatus::Present,
                format!(
                    "{} worked minutes meets the {} minute full-day threshold",
                    worked_minutes, one_hour_short
                ),
            ),
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "duration_classification".to_string(),
        rule_name: "Duration Classification".to_string(),
        policy_ref: policy.id.clone(),
        input: serde_json::json!({
            "worked_minutes": worked_minutes,
            "half_day_minutes": half,
            "full_day_minutes": policy.full_day_minutes,
            "check_out": check_out.map(|t| t.to_string()),
            "enable_early_tracking": policy.enable_early_tracking
        }),
        output: serde_json::json!({
            "status": status,
            "early_window": early_window.map(|(start, end)| [start.to_string(), end.to_string()])
        }),
        reasoning,
    };

    DurationClassification { status, audit_step }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn policy() -> AttendancePolicy {
        AttendancePolicy {
            id: "standard".to_string(),
            name: "Standard".to_string(),
            work_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end_time: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            late_grace_period_minutes: 15,
            early_grace_period_minutes: 15,
            enable_late_tracking: true,
            enable_early_tracking: true,
            include_break_in_worked_time: false,
            half_day_minutes: 240,
            full_day_minutes: 510,
            effective_from: None,
            effective_to: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    fn at(h: u32, m: u32) -> Option<NaiveDateTime> {
        date().and_hms_opt(h, m, 0)
    }

    // ==========================================================================
    // DC-001: thresholds
    // ==========================================================================
    #[test]
    fn test_dc_001_below_half_day_is_absent() {
        let result = classify_duration(&policy(), date(), 239, at(13, 0), 1);
        assert_eq!(result.status, AttendanceStatus::Absent);
    }

    #[test]
    fn test_dc_001_exactly_half_day_is_half_day() {
        let result = classify_duration(&policy(), date(), 240, at(13, 0), 1);
        assert_eq!(result.status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn test_dc_001_just_below_one_hour_short_is_half_day() {
        let result = classify_duration(&policy(), date(), 449, at(16, 29), 1);
        assert_eq!(result.status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn test_dc_001_one_hour_short_is_present() {
        let result = classify_duration(&policy(), date(), 450, at(18, 0), 1);
        assert_eq!(result.status, AttendanceStatus::Present);
    }

    // ==========================================================================
    // DC-002: early departure window [16:30, 17:15)
    // ==========================================================================
    #[test]
    fn test_dc_002_window_start_is_early_departure() {
        let result = classify_duration(&policy(), date(), 460, at(16, 30), 1);
        assert_eq!(result.status, AttendanceStatus::EarlyDeparture);
    }

    #[test]
    fn test_dc_002_inside_window_is_early_departure() {
        let result = classify_duration(&policy(), date(), 480, at(17, 0), 1);
        assert_eq!(result.status, AttendanceStatus::EarlyDeparture);
        assert!(result.audit_step.reasoning.contains("early-departure window"));
    }

    #[test]
    fn test_dc_002_grace_cutoff_is_present() {
        let result = classify_duration(&policy(), date(), 495, at(17, 15), 1);
        assert_eq!(result.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_dc_002_before_window_is_present() {
        // Enough minutes from an early start, leaving well before the window.
        let result = classify_duration(&policy(), date(), 470, at(16, 0), 1);
        assert_eq!(result.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_dc_002_early_tracking_disabled() {
        let mut policy = policy();
        policy.enable_early_tracking = false;
        let result = classify_duration(&policy, date(), 480, at(17, 0), 1);
        assert_eq!(result.status, AttendanceStatus::Present);
        assert!(result.audit_step.output["early_window"].is_null());
    }

    #[test]
    fn test_dc_002_without_check_out_is_present() {
        let result = classify_duration(&policy(), date(), 480, None, 1);
        assert_eq!(result.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_audit_step_records_status() {
        let result = classify_duration(&policy(), date(), 430, at(16, 20), 4);
        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.rule_id, "duration_classification");
        assert_eq!(result.audit_step.output["status"], "half_day");
    }
}
