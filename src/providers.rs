//! Collaborator interfaces consumed by the engine.
//!
//! The engine never reaches for a database, a clock or a message queue on its
//! own. Policy lookup, attendance reads, holidays, employee assignments,
//! approved leave usage and notification delivery all come in through the
//! traits defined here, so every path stays synchronous and testable.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineResult;
use crate::models::{
    AttendancePolicy, AttendanceRecord, LeavePolicy, LeavePolicyFilter, PolicyAssignment,
};

/// Looks up the policy revisions in force.
pub trait PolicyProvider: Send + Sync {
    /// Returns the attendance policy in force for `employee_id` on `date`, if any.
    fn active_attendance_policy(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AttendancePolicy>>;

    /// Returns every active leave policy that passes `filter`.
    fn active_leave_policies(&self, filter: LeavePolicyFilter) -> EngineResult<Vec<LeavePolicy>>;
}

/// Read access to attendance records. Writes belong to the check-in/out handlers.
pub trait AttendanceStore: Send + Sync {
    /// Returns the record for `employee_id` on `date`, if one was created.
    fn record(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<AttendanceRecord>>;
}

/// Supplies holiday reference data.
pub trait HolidayProvider: Send + Sync {
    /// Returns the holiday dates of `year`.
    fn holidays(&self, year: i32) -> EngineResult<BTreeSet<NaiveDate>>;

    /// Returns the holiday dates of every year touched by `[from, to]`.
    fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> EngineResult<BTreeSet<NaiveDate>> {
        let mut dates = BTreeSet::new();
        for year in from.year()..=to.year() {
            dates.extend(self.holidays(year)?);
        }
        Ok(dates)
    }
}

/// Supplies the employees each leave policy is assigned to.
pub trait AssignmentProvider: Send + Sync {
    /// Returns the active assignments of `leave_policy_id` whose window contains `date`.
    fn active_assignments(
        &self,
        leave_policy_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<PolicyAssignment>>;
}

impl AssignmentProvider for Vec<PolicyAssignment> {
    fn active_assignments(
        &self,
        leave_policy_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<PolicyAssignment>> {
        Ok(self
            .iter()
            .filter(|a| a.leave_policy_id == leave_policy_id && a.covers(date))
            .cloned()
            .collect())
    }
}

/// Supplies approved leave usage from the leave-request workflow.
pub trait LeaveUsageProvider: Send + Sync {
    /// Returns the approved leave days taken in `[from, to]`.
    fn approved_leave_days(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Decimal>;
}

/// The decision that an employee should be warned about an upcoming reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetNotice {
    /// The employee to notify.
    pub employee_id: String,
    /// The leave policy about to reset.
    pub leave_policy_id: String,
    /// The policy name, for display.
    pub policy_name: String,
    /// The balance that is at risk.
    pub balance: Decimal,
    /// The quarter end on which the reset happens.
    pub reset_date: NaiveDate,
}

/// Delivers reset notices. Fire-and-forget from the engine's point of view.
pub trait NotificationSink: Send + Sync {
    /// Hands one notice to the delivery mechanism.
    fn notify(&self, notice: &ResetNotice);
}

/// A [`NotificationSink`] that only records notices in the trace log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notice: &ResetNotice) {
        info!(
            employee_id = %notice.employee_id,
            leave_policy_id = %notice.leave_policy_id,
            balance = %notice.balance,
            reset_date = %notice.reset_date,
            "Leave balance reset notice"
        );
    }
}
