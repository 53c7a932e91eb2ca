//! Leave balance and ledger entry models.
//!
//! The [`LeaveLedgerEntry`] log is the source of truth for every balance number.
//! A [`LeaveBalance`] is a materialized projection of that log, kept in step by
//! the ledger in the same transaction as each append.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one balance row: an employee, a leave policy and a calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    /// The employee the balance belongs to.
    pub employee_id: String,
    /// The leave policy the balance belongs to.
    pub leave_policy_id: String,
    /// The calendar year of the balance.
    pub year: i32,
}

impl BalanceKey {
    /// Creates a key for the year containing `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_policy_engine::models::BalanceKey;
    /// use chrono::NaiveDate;
    ///
    /// let key = BalanceKey::for_date("emp_001", "casual", NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    /// assert_eq!(key.year, 2025);
    /// ```
    pub fn for_date(employee_id: &str, leave_policy_id: &str, date: NaiveDate) -> Self {
        Self::new(employee_id, leave_policy_id, date.year())
    }

    /// Creates a key for an explicit year.
    pub fn new(employee_id: &str, leave_policy_id: &str, year: i32) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            leave_policy_id: leave_policy_id.to_string(),
            year,
        }
    }
}

/// The spendable and bookkeeping balances for one [`BalanceKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// The employee the balance belongs to.
    pub employee_id: String,
    /// The leave policy the balance belongs to.
    pub leave_policy_id: String,
    /// The calendar year of the balance.
    pub year: i32,
    /// Days currently available to spend.
    pub balance: Decimal,
    /// Days accrued so far this year.
    pub accrued_this_year: Decimal,
    /// Days that were carried out of previous quarters.
    pub carry_forward_balance: Decimal,
    /// Days held by requests awaiting approval.
    pub pending_deduction: Decimal,
    /// Date of the most recent accrual credit.
    pub last_accrued_at: Option<NaiveDate>,
}

impl LeaveBalance {
    /// Returns the zero-valued balance a key has before anything was recorded.
    pub fn empty(key: &BalanceKey) -> Self {
        Self {
            employee_id: key.employee_id.clone(),
            leave_policy_id: key.leave_policy_id.clone(),
            year: key.year,
            balance: Decimal::ZERO,
            accrued_this_year: Decimal::ZERO,
            carry_forward_balance: Decimal::ZERO,
            pending_deduction: Decimal::ZERO,
            last_accrued_at: None,
        }
    }

    /// Returns the key this balance is stored under.
    pub fn key(&self) -> BalanceKey {
        BalanceKey::new(&self.employee_id, &self.leave_policy_id, self.year)
    }
}

/// The kind of event a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryType {
    /// Days credited by the monthly accrual run.
    MonthlyAccrual,
    /// Days carried into the carry-forward bucket at quarter end.
    CarryForward,
    /// Unused days forfeited at quarter end.
    QuarterReset,
    /// Days held for a leave request.
    LeaveDeduction,
    /// Days moved out of the regular pool when they are carried forward.
    CarryForwardDebit,
    /// Correction made to respect the annual maximum.
    MaximumAdjustment,
    /// A held deduction returned after a request was rejected or cancelled.
    DeductionReversal,
    /// Administrative correction.
    ManualAdjustment,
}

impl LedgerEntryType {
    /// Returns true for entries that count toward `accrued_this_year`.
    pub fn is_accrual(&self) -> bool {
        matches!(self, LedgerEntryType::MonthlyAccrual)
    }

    /// Returns true for entries written when a quarter is closed.
    pub fn is_quarter_close(&self) -> bool {
        matches!(
            self,
            LedgerEntryType::CarryForward
                | LedgerEntryType::CarryForwardDebit
                | LedgerEntryType::QuarterReset
        )
    }
}

impl std::fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LedgerEntryType::MonthlyAccrual => "MONTHLY_ACCRUAL",
            LedgerEntryType::CarryForward => "CARRY_FORWARD",
            LedgerEntryType::QuarterReset => "QUARTER_RESET",
            LedgerEntryType::LeaveDeduction => "LEAVE_DEDUCTION",
            LedgerEntryType::CarryForwardDebit => "CARRY_FORWARD_DEBIT",
            LedgerEntryType::MaximumAdjustment => "MAXIMUM_ADJUSTMENT",
            LedgerEntryType::DeductionReversal => "DEDUCTION_REVERSAL",
            LedgerEntryType::ManualAdjustment => "MANUAL_ADJUSTMENT",
        };
        write!(f, "{}", label)
    }
}

/// One immutable line of the leave ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveLedgerEntry {
    /// Unique identifier for the entry.
    pub id: Uuid,
    /// The employee the entry belongs to.
    pub employee_id: String,
    /// The leave policy the entry belongs to.
    pub leave_policy_id: String,
    /// The business date of the event.
    pub date: NaiveDate,
    /// Signed change in days; credits are positive, debits negative.
    pub quantity: Decimal,
    /// What kind of event this is.
    #[serde(rename = "type")]
    pub entry_type: LedgerEntryType,
    /// Free-form explanation.
    pub notes: Option<String>,
    /// External reference such as a leave request ID.
    pub reference_id: Option<String>,
}

impl LeaveLedgerEntry {
    /// Creates a new entry with a fresh ID for the balance identified by `key`.
    pub fn new(
        key: &BalanceKey,
        date: NaiveDate,
        quantity: Decimal,
        entry_type: LedgerEntryType,
        notes: Option<String>,
        reference_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: key.employee_id.clone(),
            leave_policy_id: key.leave_policy_id.clone(),
            date,
            quantity,
            entry_type,
            notes,
            reference_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_balance_is_zero() {
        let key = BalanceKey::new("emp_001", "casual", 2025);
        let balance = LeaveBalance::empty(&key);
        assert_eq!(balance.balance, Decimal::ZERO);
        assert_eq!(balance.pending_deduction, Decimal::ZERO);
        assert_eq!(balance.last_accrued_at, None);
        assert_eq!(balance.key(), key);
    }

    #[test]
    fn test_only_monthly_accrual_counts_as_accrual() {
        assert!(LedgerEntryType::MonthlyAccrual.is_accrual());
        assert!(!LedgerEntryType::CarryForward.is_accrual());
        assert!(!LedgerEntryType::ManualAdjustment.is_accrual());
    }

    #[test]
    fn test_entry_type_serializes_with_display_label() {
        for entry_type in [
            LedgerEntryType::MonthlyAccrual,
            LedgerEntryType::CarryForwardDebit,
            LedgerEntryType::QuarterReset,
        ] {
            let json = serde_json::to_string(&entry_type).unwrap();
            assert_eq!(json, format!("\"{}\"", entry_type));
        }
    }

    #[test]
    fn test_entry_serializes_type_field() {
        let key = BalanceKey::new("emp_001", "casual", 2025);
        let entry = LeaveLedgerEntry::new(
            &key,
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            Decimal::new(1, 0),
            LedgerEntryType::MonthlyAccrual,
            None,
            None,
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "MONTHLY_ACCRUAL");
        assert_eq!(json["quantity"], "1");
    }

    #[test]
    fn test_entries_get_distinct_ids() {
        let key = BalanceKey::new("emp_001", "casual", 2025);
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let a = LeaveLedgerEntry::new(&key, date, Decimal::ONE, LedgerEntryType::MonthlyAccrual, None, None);
        let b = LeaveLedgerEntry::new(&key, date, Decimal::ONE, LedgerEntryType::MonthlyAccrual, None, None);
        assert_ne!(a.id, b.id);
    }
}
