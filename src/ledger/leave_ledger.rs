//! Leave balance ledger operations.
//!
//! [`LeaveLedger`] is the only way balances change. Each operation runs as one
//! store transaction that updates the balance rows and appends the matching
//! ledger entries together, so a balance can always be reconciled against the
//! sum of its entries.

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BalanceKey, LeaveBalance, LeaveLedgerEntry, LeavePolicy, LedgerEntryType,
};

use super::store::LedgerStore;

/// One balance row joined with its policy name for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeBalance {
    /// The policy name, when the policy is known.
    pub policy_name: Option<String>,
    /// The balance row.
    pub balance: LeaveBalance,
}

/// The comparison of a balance row against the sum of its ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The balance row being checked.
    pub key: BalanceKey,
    /// The materialized spendable balance.
    pub balance: Decimal,
    /// Sum of every entry quantity dated in the row's year.
    pub ledger_total: Decimal,
    /// `balance - ledger_total`.
    pub difference: Decimal,
    /// Number of entries summed.
    pub entry_count: usize,
}

impl Reconciliation {
    /// Returns true when the balance matches its ledger exactly.
    pub fn is_consistent(&self) -> bool {
        self.difference.is_zero()
    }
}

/// What a quarter close did to one balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterClose {
    /// Days moved into the carry-forward bucket.
    pub carried_forward: Decimal,
    /// Days forfeited.
    pub forfeited: Decimal,
}

/// The leave balance ledger.
///
/// # Example
///
/// ```
/// use hr_policy_engine::ledger::{InMemoryLedgerStore, LeaveLedger};
/// use hr_policy_engine::models::LedgerEntryType;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let ledger = LeaveLedger::new(InMemoryLedgerStore::new());
/// let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
///
/// ledger
///     .credit("emp_001", "casual", date, Decimal::ONE, LedgerEntryType::MonthlyAccrual, None)
///     .unwrap();
/// let balance = ledger.get_balance("emp_001", "casual", 2025).unwrap();
/// assert_eq!(balance.balance, Decimal::ONE);
/// assert_eq!(balance.accrued_this_year, Decimal::ONE);
/// ```
#[derive(Debug)]
pub struct LeaveLedger<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> LeaveLedger<S> {
    /// Creates a ledger over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the balance for one employee, policy and year.
    ///
    /// A balance that was never written is returned zero-valued rather than as
    /// an error.
    pub fn get_balance(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        year: i32,
    ) -> EngineResult<LeaveBalance> {
        let key = BalanceKey::new(employee_id, leave_policy_id, year);
        Ok(self
            .store
            .load_balance(&key)?
            .unwrap_or_else(|| LeaveBalance::empty(&key)))
    }

    /// Adds `amount` days to the balance of the year containing `date`.
    ///
    /// Accrual-type credits also raise `accrued_this_year` and stamp
    /// `last_accrued_at`. Carry-forward credits also raise
    /// `carry_forward_balance`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidQuantity`] unless `amount > 0`, and
    /// propagates store failures. Nothing is written on error.
    pub fn credit(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        date: NaiveDate,
        amount: Decimal,
        entry_type: LedgerEntryType,
        notes: Option<String>,
    ) -> EngineResult<LeaveBalance> {
        require_positive(amount)?;
        let key = BalanceKey::for_date(employee_id, leave_policy_id, date);

        let balance = self.transact_one(&key, |row| {
            Ok(vec![apply_credit(
                row,
                date,
                amount,
                entry_type,
                notes.clone(),
                None,
            )])
        })?;

        debug!(
            employee_id,
            leave_policy_id,
            amount = %amount,
            entry_type = %entry_type,
            balance = %balance.balance,
            "Leave credited"
        );
        Ok(balance)
    }

    /// Places an immediate hold of `days` for a leave request.
    ///
    /// The days leave the spendable balance at once and are tracked in
    /// `pending_deduction` until the request is confirmed or released.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientBalance`] when the balance is below
    /// `days`; no mutation is performed in that case.
    pub fn debit(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        date: NaiveDate,
        days: Decimal,
        reference_id: Option<&str>,
    ) -> EngineResult<LeaveBalance> {
        require_positive(days)?;
        let key = BalanceKey::for_date(employee_id, leave_policy_id, date);

        let balance = self.transact_one(&key, |row| {
            if row.balance < days {
                return Err(EngineError::InsufficientBalance {
                    employee_id: employee_id.to_string(),
                    leave_policy_id: leave_policy_id.to_string(),
                    requested: days,
                    available: row.balance,
                });
            }
            row.pending_deduction += days;
            Ok(vec![apply_debit(
                row,
                date,
                days,
                LedgerEntryType::LeaveDeduction,
                None,
                reference_id.map(str::to_string),
            )])
        })?;

        info!(
            employee_id,
            leave_policy_id,
            days = %days,
            reference_id = reference_id.unwrap_or(""),
            "Leave deduction held"
        );
        Ok(balance)
    }

    /// Confirms a held deduction once the request is approved.
    ///
    /// Only `pending_deduction` shrinks (never below zero); the balance was
    /// already reduced by [`LeaveLedger::debit`] and is not charged again.
    pub fn confirm_deduction(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        year: i32,
        days: Decimal,
    ) -> EngineResult<LeaveBalance> {
        require_positive(days)?;
        let key = BalanceKey::new(employee_id, leave_policy_id, year);
        self.transact_one(&key, |row| {
            row.pending_deduction = (row.pending_deduction - days).max(Decimal::ZERO);
            Ok(Vec::new())
        })
    }

    /// Returns a held deduction to the balance after a request is rejected or
    /// cancelled.
    pub fn release_deduction(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        date: NaiveDate,
        days: Decimal,
        reference_id: Option<&str>,
    ) -> EngineResult<LeaveBalance> {
        require_positive(days)?;
        let key = BalanceKey::for_date(employee_id, leave_policy_id, date);
        self.transact_one(&key, |row| {
            row.pending_deduction = (row.pending_deduction - days).max(Decimal::ZERO);
            Ok(vec![apply_credit(
                row,
                date,
                days,
                LedgerEntryType::DeductionReversal,
                None,
                reference_id.map(str::to_string),
            )])
        })
    }

    /// Removes up to `amount` days without a leave request behind them.
    ///
    /// Forfeiture never fails on balance: it is clamped to what is available,
    /// and nothing is written when that is zero. Returns the new balance and the
    /// days actually forfeited.
    pub fn forfeit(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        date: NaiveDate,
        amount: Decimal,
        entry_type: LedgerEntryType,
        notes: Option<String>,
    ) -> EngineResult<(LeaveBalance, Decimal)> {
        require_positive(amount)?;
        let key = BalanceKey::for_date(employee_id, leave_policy_id, date);

        let mut forfeited = Decimal::ZERO;
        let balance = self.transact_one(&key, |row| {
            forfeited = amount.min(row.balance.max(Decimal::ZERO));
            if forfeited.is_zero() {
                return Ok(Vec::new());
            }
            Ok(vec![apply_debit(
                row,
                date,
                forfeited,
                entry_type,
                notes.clone(),
                None,
            )])
        })?;
        Ok((balance, forfeited))
    }

    /// Moves `amount` days into the carry-forward bucket.
    ///
    /// The days leave the pool of the period that closes on `closing_date`
    /// (a `CARRY_FORWARD_DEBIT`) and re-enter on the following day as a
    /// `CARRY_FORWARD` credit, so a transfer out of the last quarter of a year
    /// lands in the next year's balance. Both legs commit together.
    pub fn transfer_to_carry_forward(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        closing_date: NaiveDate,
        amount: Decimal,
        reference_id: Option<String>,
    ) -> EngineResult<LeaveBalance> {
        require_positive(amount)?;
        let close = self.close_quarter(
            employee_id,
            leave_policy_id,
            closing_date,
            amount,
            Decimal::ZERO,
            reference_id,
        )?;
        debug!(
            employee_id,
            leave_policy_id,
            carried_forward = %close.carried_forward,
            "Carry-forward transfer"
        );
        self.get_balance(
            employee_id,
            leave_policy_id,
            opening_date(closing_date)?.year(),
        )
    }

    /// Closes a period in one transaction: carries `carry` days forward and
    /// forfeits `reset` days as `QUARTER_RESET`.
    ///
    /// Both amounts are clamped so the closing balance never goes negative. The
    /// entries carry `reference_id` so a repeated close can be detected.
    pub fn close_quarter(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        closing_date: NaiveDate,
        carry: Decimal,
        reset: Decimal,
        reference_id: Option<String>,
    ) -> EngineResult<QuarterClose> {
        if carry < Decimal::ZERO || reset < Decimal::ZERO {
            return Err(EngineError::InvalidQuantity {
                quantity: carry.min(reset),
                message: "carry-forward and reset amounts cannot be negative".to_string(),
            });
        }

        let opening = opening_date(closing_date)?;
        let closing_key = BalanceKey::for_date(employee_id, leave_policy_id, closing_date);
        let opening_key = BalanceKey::for_date(employee_id, leave_policy_id, opening);
        let mut keys = vec![closing_key];
        if opening_key != keys[0] {
            keys.push(opening_key);
        }

        let mut close = QuarterClose {
            carried_forward: Decimal::ZERO,
            forfeited: Decimal::ZERO,
        };
        self.store.transact(&keys, &mut |rows| {
            let mut entries = Vec::new();
            let closing = rows.first_mut().ok_or_else(missing_row)?;

            let available = closing.balance.max(Decimal::ZERO);
            let carried = carry.min(available);
            let forfeited = reset.min(available - carried);

            if carried > Decimal::ZERO {
                entries.push(apply_debit(
                    closing,
                    closing_date,
                    carried,
                    LedgerEntryType::CarryForwardDebit,
                    Some("Closed into carry-forward".to_string()),
                    reference_id.clone(),
                ));
            }
            if forfeited > Decimal::ZERO {
                entries.push(apply_debit(
                    closing,
                    closing_date,
                    forfeited,
                    LedgerEntryType::QuarterReset,
                    Some("Unused leave above the carry-forward cap".to_string()),
                    reference_id.clone(),
                ));
            }
            if carried > Decimal::ZERO {
                let opening_row = rows.last_mut().ok_or_else(missing_row)?;
                entries.push(apply_credit(
                    opening_row,
                    opening,
                    carried,
                    LedgerEntryType::CarryForward,
                    Some(format!("Carried forward from period ending {}", closing_date)),
                    reference_id.clone(),
                ));
            }

            close = QuarterClose {
                carried_forward: carried,
                forfeited,
            };
            Ok(entries)
        })?;

        info!(
            employee_id,
            leave_policy_id,
            closing_date = %closing_date,
            carried_forward = %close.carried_forward,
            forfeited = %close.forfeited,
            "Quarter closed"
        );
        Ok(close)
    }

    /// Returns the entries of one employee and policy dated within `[from, to]`.
    pub fn entries(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<LeaveLedgerEntry>> {
        if from > to {
            return Err(EngineError::InvalidDateRange { from, to });
        }
        self.store.entries(employee_id, leave_policy_id, from, to)
    }

    /// Sums accrual-type credits dated within `[from, to]`.
    pub fn accrued_between(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Decimal> {
        Ok(self
            .entries(employee_id, leave_policy_id, from, to)?
            .iter()
            .filter(|e| e.entry_type.is_accrual())
            .map(|e| e.quantity)
            .sum())
    }

    /// Returns every balance row of an employee joined with its policy name.
    pub fn get_balances_for_employee(
        &self,
        employee_id: &str,
        policies: &[LeavePolicy],
    ) -> EngineResult<Vec<EmployeeBalance>> {
        let mut balances = self.store.balances_for_employee(employee_id)?;
        balances.sort_by(|a, b| {
            a.leave_policy_id
                .cmp(&b.leave_policy_id)
                .then(a.year.cmp(&b.year))
        });

        Ok(balances
            .into_iter()
            .map(|balance| EmployeeBalance {
                policy_name: policies
                    .iter()
                    .find(|p| p.id == balance.leave_policy_id)
                    .map(|p| p.name.clone()),
                balance,
            })
            .collect())
    }

    /// Compares a balance row against the sum of its ledger entries.
    pub fn reconcile(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        year: i32,
    ) -> EngineResult<Reconciliation> {
        let (from, to) = year_bounds(year)?;
        let balance = self.get_balance(employee_id, leave_policy_id, year)?;
        let entries = self.entries(employee_id, leave_policy_id, from, to)?;
        let ledger_total: Decimal = entries.iter().map(|e| e.quantity).sum();

        Ok(Reconciliation {
            key: balance.key(),
            balance: balance.balance,
            ledger_total,
            difference: balance.balance - ledger_total,
            entry_count: entries.len(),
        })
    }

    fn transact_one<F>(&self, key: &BalanceKey, mut mutation: F) -> EngineResult<LeaveBalance>
    where
        F: FnMut(&mut LeaveBalance) -> EngineResult<Vec<LeaveLedgerEntry>>,
    {
        let rows = self
            .store
            .transact(std::slice::from_ref(key), &mut |rows| {
                mutation(rows.first_mut().ok_or_else(missing_row)?)
            })?;
        rows.into_iter().next().ok_or_else(missing_row)
    }
}

fn apply_credit(
    row: &mut LeaveBalance,
    date: NaiveDate,
    amount: Decimal,
    entry_type: LedgerEntryType,
    notes: Option<String>,
    reference_id: Option<String>,
) -> LeaveLedgerEntry {
    row.balance += amount;
    if entry_type.is_accrual() {
        row.accrued_this_year += amount;
        row.last_accrued_at = Some(date);
    }
    if entry_type == LedgerEntryType::CarryForward {
        row.carry_forward_balance += amount;
    }
    LeaveLedgerEntry::new(&row.key(), date, amount, entry_type, notes, reference_id)
}

fn apply_debit(
    row: &mut LeaveBalance,
    date: NaiveDate,
    amount: Decimal,
    entry_type: LedgerEntryType,
    notes: Option<String>,
    reference_id: Option<String>,
) -> LeaveLedgerEntry {
    row.balance -= amount;
    LeaveLedgerEntry::new(&row.key(), date, -amount, entry_type, notes, reference_id)
}

fn require_positive(quantity: Decimal) -> EngineResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(EngineError::InvalidQuantity {
            quantity,
            message: "ledger quantities must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn missing_row() -> EngineError {
    EngineError::LedgerWriteFailure {
        message: "store returned fewer balance rows than requested".to_string(),
    }
}

fn opening_date(closing_date: NaiveDate) -> EngineResult<NaiveDate> {
    closing_date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| EngineError::InvalidPeriod {
            date: closing_date,
            message: "no following day to open the next period".to_string(),
        })
}

fn year_bounds(year: i32) -> EngineResult<(NaiveDate, NaiveDate)> {
    match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(EngineError::InvalidPeriod {
            date: NaiveDate::MIN,
            message: format!("year {} is out of range", year),
        }),
    }
}
