//! Attendance classification.
//!
//! This module combines late check-in detection, worked minutes and duration
//! classification into one status per attendance record. Classification is a
//! pure function of (policy, record); the only date it ever looks at is the
//! record's own, so historical records keep the verdict of the policy revision
//! that was active on their day.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{AttendancePolicy, AttendanceRecord, AttendanceStatus, AuditStep};
use crate::providers::PolicyProvider;

use super::duration_status::classify_duration;
use super::lateness::detect_late_check_in;
use super::worked_minutes::detect_worked_minutes;

/// The full outcome of classifying one attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The employee the record belongs to.
    pub employee_id: String,
    /// The record's calendar date.
    pub date: NaiveDate,
    /// The final status.
    pub status: AttendanceStatus,
    /// Worked minutes, when both check-in and check-out were recorded.
    pub worked_minutes: Option<i64>,
    /// Whether the check-in was late, regardless of the final status.
    pub is_late: bool,
    /// The policy revision applied, if any.
    pub policy_id: Option<String>,
    /// Every rule decision taken, in order.
    pub audit_steps: Vec<AuditStep>,
}

/// Classifies one attendance record and returns only its status.
///
/// See [`evaluate_attendance`] for the rules.
///
/// # Example
///
/// ```
/// use hr_policy_engine::calculation::classify;
/// use hr_policy_engine::models::{AttendanceRecord, AttendanceStatus};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
/// let record = AttendanceRecord {
///     employee_id: "emp_001".to_string(),
///     date,
///     check_in: date.and_hms_opt(11, 0, 0),
///     check_out: None,
///     breaks: vec![],
/// };
///
/// // Without a policy attendance fails open.
/// assert_eq!(classify(None, &record), AttendanceStatus::Present);
/// ```
pub fn classify(policy: Option<&AttendancePolicy>, record: &AttendanceRecord) -> AttendanceStatus {
    evaluate_attendance(policy, record).status
}

/// Classifies one attendance record with a full audit trail.
///
/// 1. No policy, or a policy not effective on `record.date`, gives `Present`.
/// 2. No check-in gives `Present`.
/// 3. With late tracking on, a check-in after `work_start + grace` is late.
/// 4. With a check-out, worked minutes are classified by duration. `Absent` and
///    `HalfDay` win outright; otherwise an on-time employee gets the duration
///    result (`Present` or `EarlyDeparture`) and a late employee stays `Late`.
/// 5. Without a check-out the result is `Late` or `Present` from step 3.
pub fn evaluate_attendance(
    policy: Option<&AttendancePolicy>,
    record: &AttendanceRecord,
) -> ClassificationResult {
    let mut result = ClassificationResult {
        employee_id: record.employee_id.clone(),
        date: record.date,
        status: AttendanceStatus::Present,
        worked_minutes: None,
        is_late: false,
        policy_id: None,
        audit_steps: Vec::new(),
    };

    let policy = match policy.filter(|p| p.is_effective_on(record.date)) {
        Some(policy) => policy,
        None => {
            debug!(
                employee_id = %record.employee_id,
                date = %record.date,
                "No attendance policy effective on record date, defaulting to present"
            );
            return result;
        }
    };
    result.policy_id = Some(policy.id.clone());

    if record.check_in.is_none() {
        return result;
    }

    let lateness = detect_late_check_in(policy, record, 1);
    result.is_late = lateness.is_late;
    result.audit_steps.push(lateness.audit_step);
    let tentative = if lateness.is_late {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    };

    let Some(worked) = detect_worked_minutes(policy, record, 2) else {
        result.status = tentative;
        return result;
    };
    result.worked_minutes = Some(worked.worked_minutes);
    result.audit_steps.push(worked.audit_step);

    let duration = classify_duration(
        policy,
        record.date,
        worked.worked_minutes,
        record.check_out,
        3,
    );
    result.audit_steps.push(duration.audit_step);

    result.status = match duration.status {
        AttendanceStatus::Absent | AttendanceStatus::HalfDay => duration.status,
        status if !lateness.is_late => status,
        _ => AttendanceStatus::Late,
    };
    result
}

/// Resolves attendance policies through a [`PolicyProvider`] and classifies records.
pub struct AttendanceEvaluator<'a, P: PolicyProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: PolicyProvider + ?Sized> AttendanceEvaluator<'a, P> {
    /// Creates an evaluator backed by `provider`.
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Looks up the policy for the record's own date and classifies the record.
    ///
    /// A lookup failure is logged and treated like a missing policy, so the
    /// record is classified as present.
    pub fn evaluate(&self, record: &AttendanceRecord) -> ClassificationResult {
        let policy = match self
            .provider
            .active_attendance_policy(&record.employee_id, record.date)
        {
            Ok(policy) => policy,
            Err(err) => {
                warn!(
                    employee_id = %record.employee_id,
                    date = %record.date,
                    error = %err,
                    "Attendance policy lookup failed, defaulting to present"
                );
                None
            }
        };
        evaluate_attendance(policy.as_ref(), record)
    }

    /// Classifies every record in `records`.
    pub fn evaluate_all(&self, records: &[AttendanceRecord]) -> Vec<ClassificationResult> {
        records.iter().map(|r| self.evaluate(r)).collect()
    }
}

/// Status counts over a set of classified records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Number of records per status.
    pub counts: HashMap<AttendanceStatus, u32>,
    /// Records whose check-in was late, including those with a harsher final status.
    pub late_check_ins: u32,
    /// Sum of worked minutes over records with both timestamps.
    pub total_worked_minutes: i64,
}

impl AttendanceSummary {
    /// Returns the count for `status`.
    pub fn count(&self, status: AttendanceStatus) -> u32 {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Aggregates classification results into status counts.
pub fn summarize_attendance(results: &[ClassificationResult]) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();
    for result in results {
        *summary.counts.entry(result.status).or_insert(0) += 1;
        if result.is_late {
            summary.late_check_ins += 1;
        }
        summary.total_worked_minutes += result.worked_minutes.unwrap_or(0);
    }
    summary
}
