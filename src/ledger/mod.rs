//! The leave balance ledger and its persistence.

mod leave_ledger;
mod store;

pub use leave_ledger::{EmployeeBalance, LeaveLedger, QuarterClose, Reconciliation};
pub use store::{InMemoryLedgerStore, LedgerMutation, LedgerStore};
