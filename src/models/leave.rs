//! Leave policy and assignment models.
//!
//! A [`LeavePolicy`] describes how a kind of leave accrues, carries forward and
//! resets. A [`PolicyAssignment`] attaches a policy to one employee for a window
//! of time.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How often unused carry-forward balance is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetFrequency {
    /// Reset at every month end.
    Monthly,
    /// Reset at every calendar quarter end.
    Quarterly,
    /// Reset at the end of June and December.
    HalfYearly,
    /// Reset at year end.
    Yearly,
    /// Never reset.
    Never,
}

/// How accrual treats the month an employee joins in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProrationRule {
    /// Accrue in the join month like any other month.
    None,
    /// Skip the join month; the first accrual happens the month after joining.
    AccrueFromNextMonth,
}

/// A leave policy with every default already resolved.
///
/// # Example
///
/// ```
/// use hr_policy_engine::models::{LeavePolicy, ProrationRule, ResetFrequency};
/// use rust_decimal::Decimal;
///
/// let policy = LeavePolicy {
///     id: "casual".to_string(),
///     name: "Casual Leave".to_string(),
///     yearly_quota: Decimal::new(12, 0),
///     monthly_accrual_value: Decimal::new(1, 0),
///     monthly_accrual_enabled: true,
///     annual_maximum: Decimal::new(12, 0),
///     carry_forward_allowed: true,
///     carry_forward_max_per_quarter: Decimal::new(5, 0),
///     carry_forward_reset_frequency: ResetFrequency::Quarterly,
///     join_date_proration_rule: ProrationRule::AccrueFromNextMonth,
///     auto_reset_enabled: true,
///     reset_notice_days: 7,
///     active: true,
/// };
/// assert!(policy.processes_quarter_end());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeavePolicy {
    /// Unique identifier for the policy.
    pub id: String,
    /// Human-readable name shown next to balances.
    pub name: String,
    /// Days granted per year.
    pub yearly_quota: Decimal,
    /// Days credited by each monthly accrual run.
    pub monthly_accrual_value: Decimal,
    /// Whether the monthly accrual run credits this policy.
    pub monthly_accrual_enabled: bool,
    /// Ceiling on days accrued within one calendar year.
    pub annual_maximum: Decimal,
    /// Whether unused days may roll into the next quarter.
    pub carry_forward_allowed: bool,
    /// Cap on days carried out of one quarter.
    pub carry_forward_max_per_quarter: Decimal,
    /// How often carried balance resets.
    pub carry_forward_reset_frequency: ResetFrequency,
    /// Join-month accrual behaviour.
    pub join_date_proration_rule: ProrationRule,
    /// Whether employees are warned ahead of a reset.
    pub auto_reset_enabled: bool,
    /// Days before the reset that the warning goes out.
    pub reset_notice_days: u32,
    /// Archived policies stay readable but stop accruing.
    pub active: bool,
}

impl LeavePolicy {
    /// Returns true if the monthly accrual run should credit this policy.
    pub fn accrues_monthly(&self) -> bool {
        self.active && self.monthly_accrual_enabled && self.monthly_accrual_value > Decimal::ZERO
    }

    /// Returns true if the quarter-end run should carry forward and reset this policy.
    pub fn processes_quarter_end(&self) -> bool {
        self.active
            && self.carry_forward_allowed
            && self.carry_forward_reset_frequency == ResetFrequency::Quarterly
    }

    /// Returns true if employees should be warned before the next reset.
    pub fn sends_reset_notice(&self) -> bool {
        self.active && self.auto_reset_enabled && self.reset_notice_days > 0
    }

    /// Checks the invariants every policy must satisfy.
    pub fn validate(&self) -> EngineResult<()> {
        let negative = [
            ("yearly_quota", self.yearly_quota),
            ("monthly_accrual_value", self.monthly_accrual_value),
            ("annual_maximum", self.annual_maximum),
            (
                "carry_forward_max_per_quarter",
                self.carry_forward_max_per_quarter,
            ),
        ]
        .into_iter()
        .find(|(_, value)| *value < Decimal::ZERO);

        if let Some((field, value)) = negative {
            return Err(EngineError::InvalidPolicy {
                policy_id: self.id.clone(),
                message: format!("{} cannot be negative (got {})", field, value),
            });
        }
        Ok(())
    }
}

/// Narrows which leave policies a provider returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeavePolicyFilter {
    /// Only policies the monthly accrual run credits.
    pub monthly_accrual: bool,
    /// Only policies processed at quarter end.
    pub quarterly_carry_forward: bool,
    /// Only policies that send reset notices.
    pub reset_notice: bool,
}

impl LeavePolicyFilter {
    /// Returns true if `policy` is active and passes every enabled criterion.
    pub fn matches(&self, policy: &LeavePolicy) -> bool {
        policy.active
            && (!self.monthly_accrual || policy.accrues_monthly())
            && (!self.quarterly_carry_forward || policy.processes_quarter_end())
            && (!self.reset_notice || policy.sends_reset_notice())
    }
}

/// Attaches a leave policy to an employee for a window of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAssignment {
    /// The assigned employee.
    pub employee_id: String,
    /// The assigned leave policy.
    pub leave_policy_id: String,
    /// The employee's join date, used for proration.
    pub join_date: NaiveDate,
    /// First day of the assignment (inclusive).
    pub effective_from: NaiveDate,
    /// Last day of the assignment (inclusive, `None` is open-ended).
    pub effective_to: Option<NaiveDate>,
    /// Whether the assignment is in use.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl PolicyAssignment {
    /// Returns true if the assignment is active and its window contains `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active
            && date >= self.effective_from
            && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Returns true if the employee joined in the same month and year as `date`.
    pub fn joined_in_month_of(&self, date: NaiveDate) -> bool {
        self.join_date.year() == date.year() && self.join_date.month() == date.month()
    }
}
