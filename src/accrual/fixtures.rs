//! Shared collaborators for the accrual tests.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::ledger::{InMemoryLedgerStore, LedgerMutation, LedgerStore};
use crate::models::{
    AttendancePolicy, BalanceKey, LeaveBalance, LeaveLedgerEntry, LeavePolicy, LeavePolicyFilter,
    PolicyAssignment, ProrationRule, ResetFrequency,
};
use crate::providers::{LeaveUsageProvider, NotificationSink, PolicyProvider, ResetNotice};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn casual_policy() -> LeavePolicy {
    LeavePolicy {
        id: "casual".to_string(),
        name: "Casual Leave".to_string(),
        yearly_quota: dec("12"),
        monthly_accrual_value: dec("1"),
        monthly_accrual_enabled: true,
        annual_maximum: dec("12"),
        carry_forward_allowed: true,
        carry_forward_max_per_quarter: dec("5"),
        carry_forward_reset_frequency: ResetFrequency::Quarterly,
        join_date_proration_rule: ProrationRule::None,
        auto_reset_enabled: true,
        reset_notice_days: 7,
        active: true,
    }
}

pub fn assignment(employee_id: &str, join_date: NaiveDate) -> PolicyAssignment {
    PolicyAssignment {
        employee_id: employee_id.to_string(),
        leave_policy_id: "casual".to_string(),
        join_date,
        effective_from: join_date,
        effective_to: None,
        active: true,
    }
}

pub struct StaticPolicies(pub Vec<LeavePolicy>);

impl PolicyProvider for StaticPolicies {
    fn active_attendance_policy(
        &self,
        _employee_id: &str,
        _date: NaiveDate,
    ) -> EngineResult<Option<AttendancePolicy>> {
        Ok(None)
    }

    fn active_leave_policies(&self, filter: LeavePolicyFilter) -> EngineResult<Vec<LeavePolicy>> {
        Ok(self.0.iter().filter(|p| filter.matches(p)).cloned().collect())
    }
}

/// Approved usage per employee; employees listed in `failing` error out.
#[derive(Default)]
pub struct Usage {
    pub days: HashMap<String, Decimal>,
    pub failing: BTreeSet<String>,
}

impl LeaveUsageProvider for Usage {
    fn approved_leave_days(
        &self,
        employee_id: &str,
        _leave_policy_id: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> EngineResult<Decimal> {
        if self.failing.contains(employee_id) {
            return Err(EngineError::LedgerReadFailure {
                message: format!("usage unavailable for {}", employee_id),
            });
        }
        Ok(self.days.get(employee_id).copied().unwrap_or(Decimal::ZERO))
    }
}

/// A store that rejects every transaction touching one employee.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryLedgerStore,
    pub failing_employee: String,
}

impl LedgerStore for FlakyStore {
    fn load_balance(&self, key: &BalanceKey) -> EngineResult<Option<LeaveBalance>> {
        self.inner.load_balance(key)
    }

    fn balances_for_employee(&self, employee_id: &str) -> EngineResult<Vec<LeaveBalance>> {
        self.inner.balances_for_employee(employee_id)
    }

    fn entries(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<LeaveLedgerEntry>> {
        self.inner.entries(employee_id, leave_policy_id, from, to)
    }

    fn transact(
        &self,
        keys: &[BalanceKey],
        mutation: &mut LedgerMutation<'_>,
    ) -> EngineResult<Vec<LeaveBalance>> {
        if keys.iter().any(|k| k.employee_id == self.failing_employee) {
            return Err(EngineError::LedgerWriteFailure {
                message: "connection reset".to_string(),
            });
        }
        self.inner.transact(keys, mutation)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub notices: Mutex<Vec<ResetNotice>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<ResetNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notice: &ResetNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
