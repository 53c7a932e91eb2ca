//! Quarter-end carry-forward and reset.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::calculation::{is_quarter_end, quarter_start};
use crate::error::{EngineError, EngineResult};
use crate::ledger::LedgerStore;
use crate::models::{LeavePolicy, LeavePolicyFilter, PolicyAssignment};

use super::{AccrualEngine, BatchOperation, BatchReport, PairOutcome, SkipReason};

impl<S: LedgerStore> AccrualEngine<'_, S> {
    /// Closes the quarter ending on `quarter_end_date` for every quarterly
    /// carry-forward policy.
    ///
    /// Per (employee, policy) pair, the unused accrual of the quarter
    /// (`accrued - approved usage`, clamped to `[0, balance]`) is split into a
    /// carried part, capped at `carry_forward_max_per_quarter`, and a
    /// forfeited remainder. Both are written in a single ledger transaction
    /// tagged `quarter-end:<date>`. Pairs that already have close entries on
    /// `quarter_end_date` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPeriod`] if `quarter_end_date` is not the
    /// last day of a quarter.
    pub fn run_quarter_end_process(&self, quarter_end_date: NaiveDate) -> EngineResult<BatchReport> {
        if !is_quarter_end(quarter_end_date) {
            return Err(EngineError::InvalidPeriod {
                date: quarter_end_date,
                message: "quarter-end processing must run on the last day of a quarter"
                    .to_string(),
            });
        }

        let policies = self.policies.active_leave_policies(LeavePolicyFilter {
            quarterly_carry_forward: true,
            ..Default::default()
        })?;

        info!(
            quarter_end = %quarter_end_date,
            policies = policies.len(),
            "Starting quarter-end run"
        );

        let mut report = BatchReport::new(BatchOperation::QuarterEnd, quarter_end_date);
        self.for_each_pair(&policies, &mut report, |policy, assignment| {
            self.close_pair(policy, assignment, quarter_end_date)
        });

        info!(
            quarter_end = %quarter_end_date,
            closed = report.applied_count(),
            failures = report.failures.len(),
            "Quarter-end run finished"
        );
        Ok(report)
    }

    fn close_pair(
        &self,
        policy: &LeavePolicy,
        assignment: &PolicyAssignment,
        quarter_end_date: NaiveDate,
    ) -> EngineResult<PairOutcome> {
        let employee_id = assignment.employee_id.as_str();

        let already_closed = self
            .ledger
            .entries(employee_id, &policy.id, quarter_end_date, quarter_end_date)?
            .iter()
            .any(|e| e.entry_type.is_quarter_close());
        if already_closed {
            return Ok(PairOutcome::Skipped {
                reason: SkipReason::AlreadyProcessed,
            });
        }

        let from = quarter_start(quarter_end_date);
        let accrued = self
            .ledger
            .accrued_between(employee_id, &policy.id, from, quarter_end_date)?;
        let used = self
            .usage
            .approved_leave_days(employee_id, &policy.id, from, quarter_end_date)?;
        let balance = self
            .ledger
            .get_balance(employee_id, &policy.id, quarter_end_date.year())?
            .balance;

        let unused = (accrued - used)
            .max(Decimal::ZERO)
            .min(balance.max(Decimal::ZERO));
        if unused.is_zero() {
            return Ok(PairOutcome::Skipped {
                reason: SkipReason::NothingUnused,
            });
        }

        let carry = unused.min(policy.carry_forward_max_per_quarter);
        let reset = unused - carry;
        debug!(
            employee_id,
            leave_policy_id = %policy.id,
            accrued = %accrued,
            used = %used,
            carry = %carry,
            reset = %reset,
            "Closing quarter"
        );

        let close = self.ledger.close_quarter(
            employee_id,
            &policy.id,
            quarter_end_date,
            carry,
            reset,
            Some(format!("quarter-end:{}", quarter_end_date)),
        )?;
        Ok(PairOutcome::QuarterClosed {
            carried_forward: close.carried_forward,
            forfeited: close.forfeited,
        })
    }
}
