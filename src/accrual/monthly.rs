//! Monthly accrual.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::calculation::{month_end, month_start, year_end, year_start};
use crate::error::EngineResult;
use crate::ledger::LedgerStore;
use crate::models::{LeavePolicy, LeavePolicyFilter, LedgerEntryType, PolicyAssignment, ProrationRule};

use super::{AccrualEngine, BatchOperation, BatchReport, PairOutcome, SkipReason};

impl<S: LedgerStore> AccrualEngine<'_, S> {
    /// Credits one month of leave to every employee assigned to an accruing policy.
    ///
    /// Per (employee, policy) pair the run:
    /// 1. skips employees who joined in the run month under
    ///    [`ProrationRule::AccrueFromNextMonth`];
    /// 2. skips pairs already credited in the run month;
    /// 3. skips pairs whose accrual this year reached the annual maximum;
    /// 4. credits `min(monthly_accrual_value, annual_maximum - accrued)`.
    ///
    /// # Errors
    ///
    /// Fails only when the policy list cannot be read. Pair failures are
    /// collected in the returned report.
    pub fn run_monthly_accrual(&self, run_date: NaiveDate) -> EngineResult<BatchReport> {
        let policies = self.policies.active_leave_policies(LeavePolicyFilter {
            monthly_accrual: true,
            ..Default::default()
        })?;

        info!(
            run_date = %run_date,
            policies = policies.len(),
            "Starting monthly accrual run"
        );

        let mut report = BatchReport::new(BatchOperation::MonthlyAccrual, run_date);
        self.for_each_pair(&policies, &mut report, |policy, assignment| {
            self.accrue_pair(policy, assignment, run_date)
        });

        info!(
            run_date = %run_date,
            credited = report.applied_count(),
            total = %report.total_credited(),
            failures = report.failures.len(),
            "Monthly accrual run finished"
        );
        Ok(report)
    }

    fn accrue_pair(
        &self,
        policy: &LeavePolicy,
        assignment: &PolicyAssignment,
        run_date: NaiveDate,
    ) -> EngineResult<PairOutcome> {
        let employee_id = assignment.employee_id.as_str();

        if policy.join_date_proration_rule == ProrationRule::AccrueFromNextMonth
            && assignment.joined_in_month_of(run_date)
        {
            debug!(employee_id, leave_policy_id = %policy.id, "Joined this month, accrual deferred");
            return Ok(skipped(SkipReason::JoinedThisMonth));
        }

        let already_credited = self
            .ledger
            .entries(employee_id, &policy.id, month_start(run_date), month_end(run_date))?
            .iter()
            .any(|e| e.entry_type == LedgerEntryType::MonthlyAccrual);
        if already_credited {
            return Ok(skipped(SkipReason::AlreadyProcessed));
        }

        let accrued = self.ledger.accrued_between(
            employee_id,
            &policy.id,
            year_start(run_date),
            year_end(run_date),
        )?;
        let headroom = policy.annual_maximum - accrued;
        if headroom <= Decimal::ZERO {
            debug!(
                employee_id,
                leave_policy_id = %policy.id,
                accrued = %accrued,
                "Annual maximum reached"
            );
            return Ok(skipped(SkipReason::AnnualMaximumReached));
        }

        let amount = policy.monthly_accrual_value.min(headroom);
        self.ledger.credit(
            employee_id,
            &policy.id,
            run_date,
            amount,
            LedgerEntryType::MonthlyAccrual,
            Some(format!("Monthly accrual for {}", run_date.format("%Y-%m"))),
        )?;
        Ok(PairOutcome::Credited { amount })
    }
}

fn skipped(reason: SkipReason) -> PairOutcome {
    PairOutcome::Skipped { reason }
}
