//! Worked-minutes calculation.
//!
//! This module computes the minutes an employee actually worked on one
//! attendance record, optionally excluding breaks.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{AttendancePolicy, AttendanceRecord, AuditStep, BreakInterval};

/// The result of the worked-minutes calculation for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedMinutesResult {
    /// Minutes between check-in and check-out.
    pub elapsed_minutes: i64,
    /// Minutes of closed breaks subtracted from the elapsed time.
    pub break_minutes: i64,
    /// Minutes counted as worked, never negative.
    pub worked_minutes: i64,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates worked minutes from a check-in/check-out pair.
///
/// The elapsed time is the absolute difference between the two timestamps.
/// When `include_breaks` is false, the absolute length of every break with both
/// ends recorded is subtracted. The result is clamped to zero.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::calculate_worked_minutes;
/// use hr_policy_engine::models::BreakInterval;
/// use chrono::NaiveDateTime;
///
/// let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
/// let breaks = vec![BreakInterval {
///     start: Some(at("2025-03-04 12:00:00")),
///     end: Some(at("2025-03-04 12:30:00")),
/// }];
///
/// let worked = calculate_worked_minutes(
///     at("2025-03-04 09:00:00"),
///     at("2025-03-04 17:30:00"),
///     &breaks,
///     false,
/// );
/// assert_eq!(worked, 480);
/// ```
pub fn calculate_worked_minutes(
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
    breaks: &[BreakInterval],
    include_breaks: bool,
) -> i64 {
    let elapsed = elapsed_minutes(check_in, check_out);
    if include_breaks {
        return elapsed;
    }
    (elapsed - break_minutes(breaks)).max(0)
}

fn elapsed_minutes(check_in: NaiveDateTime, check_out: NaiveDateTime) -> i64 {
    (check_out - check_in).num_minutes().abs()
}

fn break_minutes(breaks: &[BreakInterval]) -> i64 {
    breaks.iter().filter_map(BreakInterval::duration_minutes).sum()
}

/// Calculates worked minutes for a record under a policy, with an audit step.
///
/// Returns `None` when the record lacks a check-in or a check-out.
pub fn detect_worked_minutes(
    policy: &AttendancePolicy,
    record: &AttendanceRecord,
    step_number: u32,
) -> Option<WorkedMinutesResult> {
    let (check_in, check_out) = (record.check_in?, record.check_out?);

    let elapsed = elapsed_minutes(check_in, check_out);
    let breaks = if policy.include_break_in_worked_time {
        0
    } else {
        break_minutes(&record.breaks)
    };
    let worked = calculate_worked_minutes(
        check_in,
        check_out,
        &record.breaks,
        policy.include_break_in_worked_time,
    );

    let reasoning = if policy.include_break_in_worked_time {
        format!("{} elapsed minutes counted in full, breaks included", elapsed)
    } else {
        format!(
            "{} elapsed minutes less {} break minutes gives {} worked minutes",
            elapsed, breaks, worked
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "worked_minutes".to_string(),
        rule_name: "Worked Minutes".to_string(),
        policy_ref: policy.id.clone(),
        input: serde_json::json!({
            "check_in": check_in.to_string(),
            "check_out": check_out.to_string(),
            "breaks": record.breaks.len(),
            "include_break_in_worked_time": policy.include_break_in_worked_time
        }),
        output: serde_json::json!({
            "elapsed_minutes": elapsed,
            "break_minutes": breaks,
            "worked_minutes": worked
        }),
        reasoning,
    };

    Some(WorkedMinutesResult {
        elapsed_minutes: elapsed,
        break_minutes: breaks,
        worked_minutes: worked,
        audit_step,
    })
}
