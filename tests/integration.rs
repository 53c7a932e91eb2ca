//! End-to-end tests for the HR policy engine.
//!
//! This test suite drives the engine the way a scheduler and a kiosk would:
//! - Attendance classification against configured policy revisions
//! - Sandwich-day estimates against configured holidays
//! - Monthly accrual, reset notifications and quarter-end processing
//! - Leave request holds, confirmations and releases
//! - Ledger reconciliation after every flow

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Mutex;

use hr_policy_engine::accrual::{AccrualEngine, PairOutcome, SkipReason};
use hr_policy_engine::calculation::{
    AttendanceEvaluator, estimate_effective_days, month_end, summarize_attendance,
};
use hr_policy_engine::config::ConfigLoader;
use hr_policy_engine::error::{EngineError, EngineResult};
use hr_policy_engine::ledger::{InMemoryLedgerStore, LeaveLedger};
use hr_policy_engine::models::{AttendanceRecord, AttendanceStatus, LedgerEntryType};
use hr_policy_engine::providers::{
    HolidayProvider, LeaveUsageProvider, NotificationSink, ResetNotice,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/default").expect("Failed to load config")
}

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(value: Value) -> AttendanceRecord {
    serde_json::from_value(value).expect("Invalid attendance record")
}

fn day_record(employee_id: &str, day: &str, check_in: &str, check_out: Option<&str>) -> AttendanceRecord {
    record(json!({
        "employee_id": employee_id,
        "date": day,
        "check_in": format!("{}T{}", day, check_in),
        "check_out": check_out.map(|t| format!("{}T{}", day, t)),
        "breaks": []
    }))
}

/// Approved usage read back from the ledger's own deduction entries.
struct LedgerUsage<'a>(&'a LeaveLedger<InMemoryLedgerStore>);

impl LeaveUsageProvider for LedgerUsage<'_> {
    fn approved_leave_days(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Decimal> {
        let net: Decimal = self
            .0
            .entries(employee_id, leave_policy_id, from, to)?
            .iter()
            .filter(|e| {
                matches!(
                    e.entry_type,
                    LedgerEntryType::LeaveDeduction | LedgerEntryType::DeductionReversal
                )
            })
            .map(|e| e.quantity)
            .sum();
        Ok(-net)
    }
}

#[derive(Default)]
struct CollectingSink {
    notices: Mutex<Vec<ResetNotice>>,
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notice: &ResetNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

fn assert_consistent(ledger: &LeaveLedger<InMemoryLedgerStore>, employee_id: &str, policy: &str, year: i32) {
    let reconciliation = ledger.reconcile(employee_id, policy, year).unwrap();
    assert!(
        reconciliation.is_consistent(),
        "Ledger out of step for {}/{}/{}: {:?}",
        employee_id,
        policy,
        year,
        reconciliation
    );
}

// =============================================================================
// Attendance Classification
// =============================================================================

#[test]
fn test_short_day_is_half_day() {
    let config = load_config();
    let evaluator = AttendanceEvaluator::new(&config);

    let result = evaluator.evaluate(&day_record("emp_001", "2025-03-04", "09:10:00", Some("16:20:00")));

    assert_eq!(result.status, AttendanceStatus::HalfDay);
    assert_eq!(result.worked_minutes, Some(430));
    assert!(!result.is_late);
    assert_eq!(result.policy_id.as_deref(), Some("standard_2025"));
    assert_eq!(result.audit_steps.len(), 3);
}

#[test]
fn test_late_full_day_stays_late() {
    let config = load_config();
    let evaluator = AttendanceEvaluator::new(&config);

    let result = evaluator.evaluate(&day_record("emp_001", "2025-03-04", "09:20:00", Some("17:25:00")));

    assert_eq!(result.status, AttendanceStatus::Late);
    assert_eq!(result.worked_minutes, Some(485));
    assert!(result.is_late);
}

#[test]
fn test_historical_record_uses_revision_of_its_day() {
    // 09:12 is late under the 10-minute grace of 2024 but on time under 2025's 15.
    let config = load_config();
    let evaluator = AttendanceEvaluator::new(&config);

    let old = evaluator.evaluate(&day_record("emp_001", "2024-11-05", "09:12:00", None));
    let new = evaluator.evaluate(&day_record("emp_001", "2025-03-04", "09:12:00", None));

    assert_eq!(old.policy_id.as_deref(), Some("standard_2024"));
    assert_eq!(old.status, AttendanceStatus::Late);
    assert_eq!(new.status, AttendanceStatus::Present);
}

#[test]
fn test_breaks_are_excluded_from_worked_time() {
    let config = load_config();
    let evaluator = AttendanceEvaluator::new(&config);

    let result = evaluator.evaluate(&record(json!({
        "employee_id": "emp_001",
        "date": "2025-03-05",
        "check_in": "2025-03-05T09:00:00",
        "check_out": "2025-03-05T17:30:00",
        "breaks": [
            { "start": "2025-03-05T13:00:00", "end": "2025-03-05T13:45:00" },
            { "start": "2025-03-05T16:00:00", "end": null }
        ]
    })));

    assert_eq!(result.worked_minutes, Some(465));
    assert_eq!(result.status, AttendanceStatus::Present);
}

#[test]
fn test_week_summary() {
    let config = load_config();
    let evaluator = AttendanceEvaluator::new(&config);

    let records = vec![
        day_record("emp_001", "2025-03-03", "08:55:00", Some("17:35:00")),
        day_record("emp_001", "2025-03-04", "09:20:00", Some("17:25:00")),
        day_record("emp_001", "2025-03-05", "09:10:00", Some("16:20:00")),
        day_record("emp_001", "2025-03-06", "09:00:00", Some("12:00:00")),
        day_record("emp_001", "2025-03-07", "09:05:00", None),
    ];
    let summary = summarize_attendance(&evaluator.evaluate_all(&records));

    assert_eq!(summary.count(AttendanceStatus::Present), 2);
    assert_eq!(summary.count(AttendanceStatus::Late), 1);
    assert_eq!(summary.count(AttendanceStatus::HalfDay), 1);
    assert_eq!(summary.count(AttendanceStatus::Absent), 1);
    assert_eq!(summary.late_check_ins, 1);
    assert_eq!(summary.total_worked_minutes, 520 + 485 + 430 + 180);
}

// =============================================================================
// Sandwich Rule
// =============================================================================

#[test]
fn test_leave_around_holiday_weekend() {
    // Thursday 14 August to Monday 18 August 2025; Friday 15th is a holiday.
    let config = load_config();
    let holidays = config
        .holidays_between(date(2025, 8, 14), date(2025, 8, 18))
        .unwrap();

    let estimate = estimate_effective_days(date(2025, 8, 14), date(2025, 8, 18), &holidays).unwrap();

    assert_eq!(estimate.total_days, 5);
    assert_eq!(estimate.sandwich_days, 3);
    assert_eq!(estimate.effective_days, 2);
    assert!(estimate.warnings.is_empty());
}

#[test]
fn test_leave_starting_on_weekend_extends_back_over_holiday() {
    let config = load_config();
    let holidays = config.holidays(2025).unwrap();

    let estimate = estimate_effective_days(date(2025, 8, 16), date(2025, 8, 18), &holidays).unwrap();

    assert_eq!(estimate.extended_from, date(2025, 8, 14));
    assert_eq!(estimate.extended_to, date(2025, 8, 18));
    assert_eq!(estimate.effective_days, 2);
}

#[test]
fn test_reversed_leave_range_is_rejected() {
    let result = estimate_effective_days(date(2025, 8, 18), date(2025, 8, 14), &Default::default());
    assert!(matches!(result, Err(EngineError::InvalidDateRange { .. })));
}

// =============================================================================
// Leave Lifecycle
// =============================================================================

#[test]
fn test_first_quarter_lifecycle() {
    let config = load_config();
    let ledger = LeaveLedger::new(InMemoryLedgerStore::new());
    let usage = LedgerUsage(&ledger);
    let engine = AccrualEngine::new(&ledger, &config, &config, &usage);

    // January: emp_002 joined on the 20th and casual leave accrues from the next month.
    let january = engine.run_monthly_accrual(date(2025, 1, 31)).unwrap();
    assert!(january.is_clean());
    assert_eq!(
        january.outcome_for("emp_002", "casual"),
        Some(&PairOutcome::Skipped {
            reason: SkipReason::JoinedThisMonth
        })
    );
    assert_eq!(
        january.outcome_for("emp_001", "sick"),
        Some(&PairOutcome::Credited {
            amount: decimal("0.83")
        })
    );

    for month in [2, 3] {
        let report = engine.run_monthly_accrual(month_end(date(2025, month, 1))).unwrap();
        assert!(report.is_clean());
    }

    // A re-run of March changes nothing.
    let rerun = engine.run_monthly_accrual(date(2025, 3, 31)).unwrap();
    assert_eq!(rerun.applied_count(), 0);

    assert_eq!(ledger.get_balance("emp_001", "casual", 2025).unwrap().balance, decimal("3"));
    assert_eq!(ledger.get_balance("emp_002", "casual", 2025).unwrap().balance, decimal("2"));
    assert_eq!(ledger.get_balance("emp_001", "sick", 2025).unwrap().balance, decimal("2.49"));

    // One day of casual leave requested and approved in March.
    ledger
        .debit("emp_001", "casual", date(2025, 3, 10), decimal("1"), Some("req_100"))
        .unwrap();
    let confirmed = ledger
        .confirm_deduction("emp_001", "casual", 2025, decimal("1"))
        .unwrap();
    assert_eq!(confirmed.balance, decimal("2"));
    assert_eq!(confirmed.pending_deduction, Decimal::ZERO);

    // A week before the reset both casual holders are warned.
    let sink = CollectingSink::default();
    let notices = engine
        .send_pre_reset_notifications(date(2025, 3, 24), &sink)
        .unwrap();
    assert_eq!(notices.applied_count(), 2);
    let sent = sink.notices.lock().unwrap().clone();
    assert!(sent.iter().all(|n| n.leave_policy_id == "casual"));
    assert!(sent.iter().all(|n| n.reset_date == date(2025, 3, 31)));

    // Quarter end: unused accrual is below the cap of 5, so everything carries.
    let quarter = engine.run_quarter_end_process(date(2025, 3, 31)).unwrap();
    assert!(quarter.is_clean());
    assert_eq!(
        quarter.outcome_for("emp_001", "casual"),
        Some(&PairOutcome::QuarterClosed {
            carried_forward: decimal("2"),
            forfeited: Decimal::ZERO,
        })
    );
    assert_eq!(
        quarter.outcome_for("emp_002", "casual"),
        Some(&PairOutcome::QuarterClosed {
            carried_forward: decimal("2"),
            forfeited: Decimal::ZERO,
        })
    );

    let again = engine.run_quarter_end_process(date(2025, 3, 31)).unwrap();
    assert_eq!(again.skipped_count(SkipReason::AlreadyProcessed), 2);

    let balance = ledger.get_balance("emp_001", "casual", 2025).unwrap();
    assert_eq!(balance.balance, decimal("2"));
    assert_eq!(balance.carry_forward_balance, decimal("2"));

    for (employee, policy) in [("emp_001", "casual"), ("emp_002", "casual"), ("emp_001", "sick")] {
        assert_consistent(&ledger, employee, policy, 2025);
    }
}

#[test]
fn test_excess_accrual_is_reset_at_quarter_end() {
    let config = load_config();
    let ledger = LeaveLedger::new(InMemoryLedgerStore::new());
    ledger
        .credit(
            "emp_001",
            "casual",
            date(2025, 4, 1),
            decimal("4"),
            LedgerEntryType::ManualAdjustment,
            Some("Opening balance".to_string()),
        )
        .unwrap();
    for month in 4..=9 {
        let amount = if month <= 6 { "1" } else { "2" };
        ledger
            .credit(
                "emp_001",
                "casual",
                month_end(date(2025, month, 1)),
                decimal(amount),
                LedgerEntryType::MonthlyAccrual,
                None,
            )
            .unwrap();
    }

    let usage = LedgerUsage(&ledger);
    let engine = AccrualEngine::new(&ledger, &config, &config, &usage);

    // Q2 accrued 3, all carried. The opening balance is not accrual and never counts.
    let q2 = engine.run_quarter_end_process(date(2025, 6, 30)).unwrap();
    assert_eq!(
        q2.outcome_for("emp_001", "casual"),
        Some(&PairOutcome::QuarterClosed {
            carried_forward: decimal("3"),
            forfeited: Decimal::ZERO,
        })
    );

    // Q3 accrued 6 against a cap of 5.
    let q3 = engine.run_quarter_end_process(date(2025, 9, 30)).unwrap();
    assert_eq!(
        q3.outcome_for("emp_001", "casual"),
        Some(&PairOutcome::QuarterClosed {
            carried_forward: decimal("5"),
            forfeited: decimal("1"),
        })
    );

    let entries = ledger
        .entries("emp_001", "casual", date(2025, 9, 30), date(2025, 9, 30))
        .unwrap();
    let reset: Vec<_> = entries
        .iter()
        .filter(|e| e.entry_type == LedgerEntryType::QuarterReset)
        .collect();
    assert_eq!(reset.len(), 1);
    assert_eq!(reset[0].quantity, decimal("-1"));
    assert_eq!(reset[0].reference_id.as_deref(), Some("quarter-end:2025-09-30"));

    assert_eq!(ledger.get_balance("emp_001", "casual", 2025).unwrap().balance, decimal("12"));
    assert_consistent(&ledger, "emp_001", "casual", 2025);
}

#[test]
fn test_year_end_carry_forward_opens_next_year() {
    let config = load_config();
    let ledger = LeaveLedger::new(InMemoryLedgerStore::new());
    for month in 10..=12 {
        ledger
            .credit(
                "emp_001",
                "casual",
                month_end(date(2025, month, 1)),
                decimal("2"),
                LedgerEntryType::MonthlyAccrual,
                None,
            )
            .unwrap();
    }

    let usage = LedgerUsage(&ledger);
    let engine = AccrualEngine::new(&ledger, &config, &config, &usage);
    let report = engine.run_quarter_end_process(date(2025, 12, 31)).unwrap();

    assert_eq!(
        report.outcome_for("emp_001", "casual"),
        Some(&PairOutcome::QuarterClosed {
            carried_forward: decimal("5"),
            forfeited: decimal("1"),
        })
    );

    let next_year = ledger.get_balance("emp_001", "casual", 2026).unwrap();
    assert_eq!(next_year.balance, decimal("5"));
    assert_eq!(next_year.carry_forward_balance, decimal("5"));
    assert_eq!(next_year.year, 2026);
    assert!(ledger.get_balance("emp_001", "casual", 2025).unwrap().balance.is_zero());

    assert_consistent(&ledger, "emp_001", "casual", 2025);
    assert_consistent(&ledger, "emp_001", "casual", 2026);
}

#[test]
fn test_rejected_request_restores_balance() {
    let ledger = LeaveLedger::new(InMemoryLedgerStore::new());
    ledger
        .credit(
            "emp_001",
            "casual",
            date(2025, 1, 31),
            decimal("2"),
            LedgerEntryType::MonthlyAccrual,
            None,
        )
        .unwrap();

    ledger
        .debit("emp_001", "casual", date(2025, 2, 3), decimal("1.5"), Some("req_7"))
        .unwrap();
    let result = ledger.debit("emp_001", "casual", date(2025, 2, 4), decimal("1"), Some("req_8"));
    assert!(matches!(result, Err(EngineError::InsufficientBalance { .. })));
    assert!(result.unwrap_err().is_recoverable());

    let restored = ledger
        .release_deduction("emp_001", "casual", date(2025, 2, 5), decimal("1.5"), Some("req_7"))
        .unwrap();
    assert_eq!(restored.balance, decimal("2"));
    assert_eq!(restored.pending_deduction, Decimal::ZERO);
    assert_consistent(&ledger, "emp_001", "casual", 2025);
}

#[test]
fn test_employee_balances_report_policy_names() {
    let config = load_config();
    let ledger = LeaveLedger::new(InMemoryLedgerStore::new());
    let usage = LedgerUsage(&ledger);
    let engine = AccrualEngine::new(&ledger, &config, &config, &usage);
    engine.run_monthly_accrual(date(2025, 2, 28)).unwrap();

    let balances = ledger
        .get_balances_for_employee("emp_001", config.config().leave_policies())
        .unwrap();

    let names: Vec<_> = balances
        .iter()
        .map(|b| b.policy_name.as_deref().unwrap_or("?"))
        .collect();
    assert_eq!(names, vec!["Casual Leave", "Sick Leave"]);
}
