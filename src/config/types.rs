//! Configuration types for policy loading.
//!
//! These structures mirror the YAML files one to one. Optional fields are
//! resolved into fully-populated model types when the file is loaded, so the
//! rest of the engine never sees a missing value.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::error::EngineResult;
use crate::models::{
    AttendancePolicy, Holiday, LeavePolicy, PolicyAssignment, ProrationRule, ResetFrequency,
};

/// Half-day threshold used when a policy does not set one.
pub const DEFAULT_HALF_DAY_MINUTES: i64 = 240;

/// Full-day threshold used when a policy does not set one.
pub const DEFAULT_FULL_DAY_MINUTES: i64 = 480;

/// One attendance policy revision as written in `attendance_policies.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendancePolicyConfig {
    /// Unique identifier for the revision.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Start of the working day, `HH:MM:SS`.
    pub work_start_time: NaiveTime,
    /// End of the working day, `HH:MM:SS`.
    pub work_end_time: NaiveTime,
    /// Defaults to 0.
    #[serde(default)]
    pub late_grace_period_minutes: Option<i64>,
    /// Defaults to 0.
    #[serde(default)]
    pub early_grace_period_minutes: Option<i64>,
    /// Defaults to `false`.
    #[serde(default)]
    pub enable_late_tracking: Option<bool>,
    /// Defaults to `false`.
    #[serde(default)]
    pub enable_early_tracking: Option<bool>,
    /// Defaults to `false`.
    #[serde(default)]
    pub include_break_in_worked_time: Option<bool>,
    /// Defaults to [`DEFAULT_HALF_DAY_MINUTES`].
    #[serde(default)]
    pub half_day_minutes: Option<i64>,
    /// Defaults to [`DEFAULT_FULL_DAY_MINUTES`].
    #[serde(default)]
    pub full_day_minutes: Option<i64>,
    /// First day the revision applies; unbounded when omitted.
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    /// Last day the revision applies; unbounded when omitted.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl AttendancePolicyConfig {
    /// Resolves defaults and validates the revision.
    pub fn resolve(self) -> EngineResult<AttendancePolicy> {
        let policy = AttendancePolicy {
            id: self.id,
            name: self.name,
            work_start_time: self.work_start_time,
            work_end_time: self.work_end_time,
            late_grace_period_minutes: self.late_grace_period_minutes.unwrap_or(0),
            early_grace_period_minutes: self.early_grace_period_minutes.unwrap_or(0),
            enable_late_tracking: self.enable_late_tracking.unwrap_or(false),
            enable_early_tracking: self.enable_early_tracking.unwrap_or(false),
            include_break_in_worked_time: self.include_break_in_worked_time.unwrap_or(false),
            half_day_minutes: self.half_day_minutes.unwrap_or(DEFAULT_HALF_DAY_MINUTES),
            full_day_minutes: self.full_day_minutes.unwrap_or(DEFAULT_FULL_DAY_MINUTES),
            effective_from: self.effective_from,
            effective_to: self.effective_to,
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// The `attendance_policies.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendancePoliciesFile {
    /// Every attendance policy revision.
    pub attendance_policies: Vec<AttendancePolicyConfig>,
}

/// One leave policy as written in `leave_policies.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeavePolicyConfig {
    /// Unique identifier for the policy.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Days granted per year.
    pub yearly_quota: Decimal,
    /// Defaults to `yearly_quota / 12`, rounded to two places.
    #[serde(default)]
    pub monthly_accrual_value: Option<Decimal>,
    /// Defaults to `true`.
    #[serde(default)]
    pub monthly_accrual_enabled: Option<bool>,
    /// Defaults to `yearly_quota`.
    #[serde(default)]
    pub annual_maximum: Option<Decimal>,
    /// Defaults to `false`.
    #[serde(default)]
    pub carry_forward_allowed: Option<bool>,
    /// Defaults to 0.
    #[serde(default)]
    pub carry_forward_max_per_quarter: Option<Decimal>,
    /// Defaults to `quarterly`.
    #[serde(default)]
    pub carry_forward_reset_frequency: Option<ResetFrequency>,
    /// Defaults to `NONE`.
    #[serde(default)]
    pub join_date_proration_rule: Option<ProrationRule>,
    /// Defaults to `false`.
    #[serde(default)]
    pub auto_reset_enabled: Option<bool>,
    /// Defaults to 0.
    #[serde(default)]
    pub reset_notice_days: Option<u32>,
    /// Defaults to `true`.
    #[serde(default)]
    pub active: Option<bool>,
}

impl LeavePolicyConfig {
    /// Resolves defaults and validates the policy.
    pub fn resolve(self) -> EngineResult<LeavePolicy> {
        let monthly_accrual_value = self.monthly_accrual_value.unwrap_or_else(|| {
            (self.yearly_quota / Decimal::from(12))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        });

        let policy = LeavePolicy {
            id: self.id,
            name: self.name,
            yearly_quota: self.yearly_quota,
            monthly_accrual_value,
            monthly_accrual_enabled: self.monthly_accrual_enabled.unwrap_or(true),
            annual_maximum: self.annual_maximum.unwrap_or(self.yearly_quota),
            carry_forward_allowed: self.carry_forward_allowed.unwrap_or(false),
            carry_forward_max_per_quarter: self
                .carry_forward_max_per_quarter
                .unwrap_or(Decimal::ZERO),
            carry_forward_reset_frequency: self
                .carry_forward_reset_frequency
                .unwrap_or(ResetFrequency::Quarterly),
            join_date_proration_rule: self
                .join_date_proration_rule
                .unwrap_or(ProrationRule::None),
            auto_reset_enabled: self.auto_reset_enabled.unwrap_or(false),
            reset_notice_days: self.reset_notice_days.unwrap_or(0),
            active: self.active.unwrap_or(true),
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// The `leave_policies.yaml` file.
#[derive(Debug, Clone, Deserialize)]
pub struct LeavePoliciesFile {
    /// Every leave policy.
    pub leave_policies: Vec<LeavePolicyConfig>,
}

/// One file under `holidays/`.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayFile {
    /// The declared holidays.
    pub holidays: Vec<Holiday>,
}

/// The optional `policy_assignments.yaml` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentsFile {
    /// Every employee to leave policy assignment.
    pub assignments: Vec<PolicyAssignment>,
}

/// The complete policy configuration loaded from a directory.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Attendance revisions, sorted by `effective_from` (unbounded first).
    attendance_policies: Vec<AttendancePolicy>,
    leave_policies: Vec<LeavePolicy>,
    /// Holidays grouped by year.
    holidays: BTreeMap<i32, Vec<Holiday>>,
    assignments: Vec<PolicyAssignment>,
}

impl PolicyConfig {
    /// Creates a new PolicyConfig from its component parts.
    pub fn new(
        attendance_policies: Vec<AttendancePolicy>,
        leave_policies: Vec<LeavePolicy>,
        holidays: Vec<Holiday>,
        assignments: Vec<PolicyAssignment>,
    ) -> Self {
        let mut sorted = attendance_policies;
        sorted.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));

        let mut by_year: BTreeMap<i32, Vec<Holiday>> = BTreeMap::new();
        for holiday in holidays {
            by_year.entry(holiday.date.year()).or_default().push(holiday);
        }
        for days in by_year.values_mut() {
            days.sort_by_key(|h| h.date);
        }

        Self {
            attendance_policies: sorted,
            leave_policies,
            holidays: by_year,
            assignments,
        }
    }

    /// Returns all attendance policy revisions.
    pub fn attendance_policies(&self) -> &[AttendancePolicy] {
        &self.attendance_policies
    }

    /// Returns all leave policies, including archived ones.
    pub fn leave_policies(&self) -> &[LeavePolicy] {
        &self.leave_policies
    }

    /// Returns the holidays declared for `year`.
    pub fn holidays(&self, year: i32) -> &[Holiday] {
        self.holidays.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns all policy assignments.
    pub fn assignments(&self) -> &[PolicyAssignment] {
        &self.assignments
    }
}
