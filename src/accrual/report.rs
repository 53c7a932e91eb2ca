//! Batch run reports.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The batch operation a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperation {
    /// Monthly leave accrual.
    MonthlyAccrual,
    /// Quarter-end carry-forward and reset.
    QuarterEnd,
    /// Pre-reset notification decision.
    ResetNotification,
}

/// Why an (employee, policy) pair was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The employee joined in the run month and the policy accrues from the next one.
    JoinedThisMonth,
    /// The period was already processed by an earlier run.
    AlreadyProcessed,
    /// The annual maximum has been accrued.
    AnnualMaximumReached,
    /// No unused accrual is left to carry or reset.
    NothingUnused,
    /// The balance is empty so there is nothing to warn about.
    NoBalance,
}

/// What a batch run did for one (employee, policy) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PairOutcome {
    /// Days were credited.
    Credited {
        /// The amount credited.
        amount: Decimal,
    },
    /// The quarter was closed.
    QuarterClosed {
        /// Days moved into the carry-forward bucket.
        carried_forward: Decimal,
        /// Days forfeited.
        forfeited: Decimal,
    },
    /// A reset notice was handed to the sink.
    Notified {
        /// The balance the notice warned about.
        balance: Decimal,
    },
    /// Nothing was changed.
    Skipped {
        /// Why.
        reason: SkipReason,
    },
}

/// The outcome of one successfully processed pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResult {
    /// The employee processed.
    pub employee_id: String,
    /// The leave policy processed.
    pub leave_policy_id: String,
    /// What happened.
    #[serde(flatten)]
    pub outcome: PairOutcome,
}

/// A pair, or a whole policy, that failed during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// The employee processed, or `None` when the policy's assignments could not be read.
    pub employee_id: Option<String>,
    /// The leave policy processed.
    pub leave_policy_id: String,
    /// The error message.
    pub message: String,
    /// Whether retrying the pair could succeed without operator action.
    pub recoverable: bool,
}

/// The result of one batch run.
///
/// A failing pair is recorded here and does not stop the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// The operation that ran.
    pub operation: BatchOperation,
    /// The date the run was made for.
    pub run_date: NaiveDate,
    /// Every pair that was processed without error.
    pub results: Vec<PairResult>,
    /// Every pair that failed.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Creates an empty report.
    pub fn new(operation: BatchOperation, run_date: NaiveDate) -> Self {
        Self {
            operation,
            run_date,
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, employee_id: &str, leave_policy_id: &str, outcome: PairOutcome) {
        self.results.push(PairResult {
            employee_id: employee_id.to_string(),
            leave_policy_id: leave_policy_id.to_string(),
            outcome,
        });
    }

    pub(crate) fn fail(
        &mut self,
        employee_id: Option<&str>,
        leave_policy_id: &str,
        error: &EngineError,
    ) {
        self.failures.push(BatchFailure {
            employee_id: employee_id.map(str::to_string),
            leave_policy_id: leave_policy_id.to_string(),
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
    }

    /// Returns the number of pairs that changed state or triggered a notice.
    pub fn applied_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !matches!(r.outcome, PairOutcome::Skipped { .. }))
            .count()
    }

    /// Returns the number of pairs skipped for `reason`.
    pub fn skipped_count(&self, reason: SkipReason) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == PairOutcome::Skipped { reason })
            .count()
    }

    /// Returns the total days credited by the run.
    pub fn total_credited(&self) -> Decimal {
        self.results
            .iter()
            .map(|r| match r.outcome {
                PairOutcome::Credited { amount } => amount,
                _ => Decimal::ZERO,
            })
            .sum()
    }

    /// Returns the outcome recorded for a pair, if it was processed successfully.
    pub fn outcome_for(&self, employee_id: &str, leave_policy_id: &str) -> Option<&PairOutcome> {
        self.results
            .iter()
            .find(|r| r.employee_id == employee_id && r.leave_policy_id == leave_policy_id)
            .map(|r| &r.outcome)
    }

    /// Returns true if no pair failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
