//! Pre-reset notifications.

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::calculation::next_quarter_end_after;
use crate::error::EngineResult;
use crate::ledger::LedgerStore;
use crate::models::LeavePolicyFilter;
use crate::providers::{NotificationSink, ResetNotice};

use super::{AccrualEngine, BatchOperation, BatchReport, PairOutcome, SkipReason};

impl<S: LedgerStore> AccrualEngine<'_, S> {
    /// Decides which employees to warn about the next quarter-end reset and
    /// hands each notice to `sink`.
    ///
    /// A policy fires only when `date` is exactly `reset_notice_days` before
    /// the next quarter end after `date`. Within a firing policy, employees
    /// with a positive balance for `date`'s year are notified.
    pub fn send_pre_reset_notifications(
        &self,
        date: NaiveDate,
        sink: &dyn NotificationSink,
    ) -> EngineResult<BatchReport> {
        let policies = self.policies.active_leave_policies(LeavePolicyFilter {
            reset_notice: true,
            ..Default::default()
        })?;

        let reset_date = next_quarter_end_after(date);
        let due: Vec<_> = policies
            .into_iter()
            .filter(|policy| {
                let notice_date =
                    reset_date.checked_sub_days(Days::new(u64::from(policy.reset_notice_days)));
                if notice_date != Some(date) {
                    debug!(
                        leave_policy_id = %policy.id,
                        reset_date = %reset_date,
                        "Not a notice date for policy"
                    );
                    return false;
                }
                true
            })
            .collect();

        let mut report = BatchReport::new(BatchOperation::ResetNotification, date);
        self.for_each_pair(&due, &mut report, |policy, assignment| {
            let balance = self
                .ledger
                .get_balance(&assignment.employee_id, &policy.id, date.year())?
                .balance;
            if balance <= Decimal::ZERO {
                return Ok(PairOutcome::Skipped {
                    reason: SkipReason::NoBalance,
                });
            }

            sink.notify(&ResetNotice {
                employee_id: assignment.employee_id.clone(),
                leave_policy_id: policy.id.clone(),
                policy_name: policy.name.clone(),
                balance,
                reset_date,
            });
            Ok(PairOutcome::Notified { balance })
        });

        info!(
            date = %date,
            reset_date = %reset_date,
            policies = due.len(),
            notified = report.applied_count(),
            "Reset notifications decided"
        );
        Ok(report)
    }
}
