//! Late check-in detection.
//!
//! A check-in is late when it falls strictly after the start of the working
//! day plus the policy's late grace period, both anchored to the record's own
//! date.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{AttendancePolicy, AttendanceRecord, AuditStep};

/// The result of late check-in detection for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatenessDetection {
    /// Whether the check-in counts as late.
    pub is_late: bool,
    /// The last on-time instant, when late tracking is enabled.
    pub allowed_until: Option<NaiveDateTime>,
    /// Minutes past `allowed_until`; zero when on time.
    pub minutes_late: i64,
    /// The audit step recording this detection.
    pub audit_step: AuditStep,
}

/// Detects whether the record's check-in is late under `policy`.
///
/// A check-in exactly at `work_start_time + late_grace_period_minutes` is on
/// time. When late tracking is disabled, or there is no check-in, nothing is
/// ever late.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::detect_late_check_in;
/// use hr_policy_engine::models::{AttendancePolicy, AttendanceRecord};
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
/// let record = AttendanceRecord {
///     employee_id: "emp_001".to_string(),
///     date,
///     check_in: date.and_hms_opt(9, 15, 0),
///     check_out: None,
///     breaks: vec![],
/// };
///
/// assert!(!detect_late_check_in(&policy, &record, 1).is_late);
/// ```
pub fn detect_late_check_in(
    policy: &AttendancePolicy,
    record: &AttendanceRecord,
    step_number: u32,
) -> LatenessDetection {
    let check_in = match record.check_in {
        Some(check_in) if policy.enable_late_tracking => check_in,
        _ => {
            let reasoning = if policy.enable_late_tracking {
                "No check-in recorded, lateness not evaluated".to_string()
            } else {
                "Late tracking is disabled for this policy".to_string()
            };
            return LatenessDetection {
                is_late: false,
                allowed_until: None,
                minutes_late: 0,
                audit_step: audit_step(policy, record, step_number, None, false, 0, reasoning),
            };
        }
    };

    let allowed_until = policy.work_start_on(record.date)
        + Duration::minutes(policy.late_grace_period_minutes);
    let is_late = check_in > allowed_until;
    let minutes_late = if is_late {
        (check_in - allowed_until).num_minutes()
    } else {
        0
    };

    let reasoning = if is_late {
        format!(
            "Checked in at {} which is after the grace boundary {}",
            check_in.time(),
            allowed_until.time()
        )
    } else {
        format!(
            "Checked in at {} which is within the grace boundary {}",
            check_in.time(),
            allowed_until.time()
        )
    };

    LatenessDetection {
        is_late,
        allowed_until: Some(allowed_until),
        minutes_late,
        audit_step: audit_step(
            policy,
            record,
            step_number,
            Some(allowed_until),
            is_late,
            minutes_late,
            reasoning,
        ),
    }
}

fn audit_step(
    policy: &AttendancePolicy,
    record: &AttendanceRecord,
    step_number: u32,
    allowed_until: Option<NaiveDateTime>,
    is_late: bool,
    minutes_late: i64,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "late_check_in".to_string(),
        rule_name: "Late Check-in Detection".to_string(),
        policy_ref: policy.id.clone(),
        input: serde_json::json!({
            "check_in": record.check_in.map(|t| t.to_string()),
            "work_start_time": policy.work_start_time.to_string(),
            "late_grace_period_minutes": policy.late_grace_period_minutes,
            "enable_late_tracking": policy.enable_late_tracking
        }),
        output: serde_json::json!({
            "allowed_until": allowed_until.map(|t| t.to_string()),
            "is_late": is_late,
            "minutes_late": minutes_late
        }),
        reasoning,
    }
}
