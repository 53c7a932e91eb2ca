//! Leave accrual and carry-forward engine.
//!
//! The [`AccrualEngine`] runs the scheduled batch operations: the monthly
//! accrual, the quarter-end carry-forward and reset, and the decision to warn
//! employees before a reset. It changes balances only through the
//! [`LeaveLedger`], and every operation is safe to repeat for the same date.

mod monthly;
mod notifications;
mod quarter_end;
mod report;

#[cfg(test)]
mod fixtures;

pub use report::{
    BatchFailure, BatchOperation, BatchReport, PairOutcome, PairResult, SkipReason,
};

use tracing::warn;

use crate::error::EngineResult;
use crate::ledger::{LeaveLedger, LedgerStore};
use crate::models::{LeavePolicy, PolicyAssignment};
use crate::providers::{AssignmentProvider, LeaveUsageProvider, PolicyProvider};

/// Runs the scheduled leave operations against a ledger.
pub struct AccrualEngine<'a, S: LedgerStore> {
    ledger: &'a LeaveLedger<S>,
    policies: &'a dyn PolicyProvider,
    assignments: &'a dyn AssignmentProvider,
    usage: &'a dyn LeaveUsageProvider,
}

impl<'a, S: LedgerStore> AccrualEngine<'a, S> {
    /// Creates an engine over `ledger` and its collaborators.
    pub fn new(
        ledger: &'a LeaveLedger<S>,
        policies: &'a dyn PolicyProvider,
        assignments: &'a dyn AssignmentProvider,
        usage: &'a dyn LeaveUsageProvider,
    ) -> Self {
        Self {
            ledger,
            policies,
            assignments,
            usage,
        }
    }

    /// Returns the ledger the engine writes to.
    pub fn ledger(&self) -> &LeaveLedger<S> {
        self.ledger
    }

    /// Calls `process` for every active assignment of every policy, recording
    /// each outcome or failure in `report`.
    fn for_each_pair<F>(
        &self,
        policies: &[LeavePolicy],
        report: &mut BatchReport,
        mut process: F,
    ) where
        F: FnMut(&LeavePolicy, &PolicyAssignment) -> EngineResult<PairOutcome>,
    {
        let run_date = report.run_date;
        for policy in policies {
            let assignments = match self.assignments.active_assignments(&policy.id, run_date) {
                Ok(assignments) => assignments,
                Err(e) => {
                    warn!(
                        leave_policy_id = %policy.id,
                        error = %e,
                        "Could not read policy assignments"
                    );
                    report.fail(None, &policy.id, &e);
                    continue;
                }
            };

            for assignment in &assignments {
                match process(policy, assignment) {
                    Ok(outcome) => report.record(&assignment.employee_id, &policy.id, outcome),
                    Err(e) => {
                        warn!(
                            employee_id = %assignment.employee_id,
                            leave_policy_id = %policy.id,
                            operation = ?report.operation,
                            error = %e,
                            "Batch pair failed"
                        );
                        report.fail(Some(&assignment.employee_id), &policy.id, &e);
                    }
                }
            }
        }
    }
}

impl<S: LedgerStore> std::fmt::Debug for AccrualEngine<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccrualEngine").finish_non_exhaustive()
    }
}
