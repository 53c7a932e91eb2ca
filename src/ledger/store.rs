//! Ledger persistence.
//!
//! The [`LedgerStore`] trait is the only storage the engine writes to. A store
//! keeps the append-only entry log and the materialized balance rows, and must
//! commit both together: [`LedgerStore::transact`] either persists every row and
//! entry a mutation produced or nothing at all.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::error::{EngineError, EngineResult};
use crate::models::{BalanceKey, LeaveBalance, LeaveLedgerEntry};

/// A mutation applied inside one store transaction.
///
/// It receives one working copy per requested key, in the order the keys were
/// given, and returns the ledger entries to append. Returning an error aborts
/// the transaction.
pub type LedgerMutation<'a> =
    dyn FnMut(&mut [LeaveBalance]) -> EngineResult<Vec<LeaveLedgerEntry>> + 'a;

/// Persistence for leave balances and their ledger.
pub trait LedgerStore: Send + Sync {
    /// Returns the balance row for `key`, if one was ever written.
    fn load_balance(&self, key: &BalanceKey) -> EngineResult<Option<LeaveBalance>>;

    /// Returns every balance row of `employee_id`, across policies and years.
    fn balances_for_employee(&self, employee_id: &str) -> EngineResult<Vec<LeaveBalance>>;

    /// Returns the entries of one employee and policy dated within `[from, to]`,
    /// oldest first.
    fn entries(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<LeaveLedgerEntry>>;

    /// Runs `mutation` against the rows for `keys` under mutual exclusion and
    /// commits the changed rows together with the returned entries.
    ///
    /// Rows that do not exist yet are handed to the mutation zero-valued.
    /// Returns the committed rows in key order.
    fn transact(
        &self,
        keys: &[BalanceKey],
        mutation: &mut LedgerMutation<'_>,
    ) -> EngineResult<Vec<LeaveBalance>>;
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: BTreeMap<BalanceKey, LeaveBalance>,
    entries: Vec<LeaveLedgerEntry>,
}

/// A [`LedgerStore`] held in process memory.
///
/// A single mutex serializes every transaction, which gives the per-employee,
/// per-policy mutual exclusion the ledger requires.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry ever appended, in append order.
    pub fn all_entries(&self) -> EngineResult<Vec<LeaveLedgerEntry>> {
        Ok(self.read()?.entries.clone())
    }

    fn read(&self) -> EngineResult<MutexGuard<'_, LedgerState>> {
        self.state.lock().map_err(|e| EngineError::LedgerReadFailure {
            message: e.to_string(),
        })
    }

    fn write(&self) -> EngineResult<MutexGuard<'_, LedgerState>> {
        self.state.lock().map_err(|e| EngineError::LedgerWriteFailure {
            message: e.to_string(),
        })
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load_balance(&self, key: &BalanceKey) -> EngineResult<Option<LeaveBalance>> {
        Ok(self.read()?.balances.get(key).cloned())
    }

    fn balances_for_employee(&self, employee_id: &str) -> EngineResult<Vec<LeaveBalance>> {
        Ok(self
            .read()?
            .balances
            .values()
            .filter(|b| b.employee_id == employee_id)
            .cloned()
            .collect())
    }

    fn entries(
        &self,
        employee_id: &str,
        leave_policy_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<LeaveLedgerEntry>> {
        let mut entries: Vec<LeaveLedgerEntry> = self
            .read()?
            .entries
            .iter()
            .filter(|e| {
                e.employee_id == employee_id
                    && e.leave_policy_id == leave_policy_id
                    && e.date >= from
                    && e.date <= to
            })
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    fn transact(
        &self,
        keys: &[BalanceKey],
        mutation: &mut LedgerMutation<'_>,
    ) -> EngineResult<Vec<LeaveBalance>> {
        let mut state = self.write()?;

        let mut rows: Vec<LeaveBalance> = keys
            .iter()
            .map(|key| {
                state
                    .balances
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| LeaveBalance::empty(key))
            })
            .collect();

        // Mutations work on copies; nothing below runs unless they succeed.
        let new_entries = mutation(&mut rows)?;

        for row in &rows {
            state.balances.insert(row.key(), row.clone());
        }
        state.entries.extend(new_entries);
        Ok(rows)
    }
}
