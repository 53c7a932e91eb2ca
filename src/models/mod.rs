//! Core data models for the HR policy engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod audit;
mod balance;
mod holiday;
mod leave;

pub use attendance::{AttendancePolicy, AttendanceRecord, AttendanceStatus, BreakInterval};
pub use audit::{AuditStep, AuditWarning};
pub use balance::{BalanceKey, LeaveBalance, LeaveLedgerEntry, LedgerEntryType};
pub use holiday::{Holiday, holiday_dates};
pub use leave::{LeavePolicy, LeavePolicyFilter, PolicyAssignment, ProrationRule, ResetFrequency};
