//! Error types for the HR policy engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while classifying attendance or
//! mutating leave balances.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the HR policy engine.
///
/// All fallible operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use hr_policy_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/leave_policies.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/leave_policies.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A policy definition violates one of its invariants.
    #[error("Invalid policy '{policy_id}': {message}")]
    InvalidPolicy {
        /// The ID of the offending policy.
        policy_id: String,
        /// A description of what made the policy invalid.
        message: String,
    },

    /// No policy is configured for the employee on the given date.
    #[error("No active policy for employee '{employee_id}' on {date}")]
    PolicyNotFound {
        /// The employee the lookup was made for.
        employee_id: String,
        /// The date of the lookup.
        date: NaiveDate,
    },

    /// The policy exists but is archived or outside its effective window.
    #[error("Policy '{policy_id}' is inactive")]
    PolicyInactive {
        /// The ID of the inactive policy.
        policy_id: String,
    },

    /// A debit was requested for more days than the spendable balance.
    #[error(
        "Insufficient balance for employee '{employee_id}' on policy '{leave_policy_id}': requested {requested}, available {available}"
    )]
    InsufficientBalance {
        /// The employee whose balance was checked.
        employee_id: String,
        /// The leave policy the balance belongs to.
        leave_policy_id: String,
        /// The number of days requested.
        requested: Decimal,
        /// The spendable balance at the time of the request.
        available: Decimal,
    },

    /// A ledger quantity was zero, negative or otherwise unusable.
    #[error("Invalid quantity {quantity}: {message}")]
    InvalidQuantity {
        /// The rejected quantity.
        quantity: Decimal,
        /// A description of the problem.
        message: String,
    },

    /// A date range was empty or reversed.
    #[error("Invalid date range {from} to {to}")]
    InvalidDateRange {
        /// The start of the range.
        from: NaiveDate,
        /// The end of the range.
        to: NaiveDate,
    },

    /// A batch run was invoked with a date that is not a valid period boundary.
    #[error("Invalid period boundary {date}: {message}")]
    InvalidPeriod {
        /// The date supplied by the caller.
        date: NaiveDate,
        /// A description of the problem.
        message: String,
    },

    /// The ledger store failed to persist a transaction. Nothing was written.
    #[error("Ledger write failed: {message}")]
    LedgerWriteFailure {
        /// A description of the storage failure.
        message: String,
    },

    /// The ledger store failed to answer a read.
    #[error("Ledger read failed: {message}")]
    LedgerReadFailure {
        /// A description of the storage failure.
        message: String,
    },
}

impl EngineError {
    /// Returns true for errors that should be reported back to the requester
    /// rather than treated as a fault of the engine or its storage.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_policy_engine::error::EngineError;
    /// use rust_decimal::Decimal;
    ///
    /// let error = EngineError::InsufficientBalance {
    ///     employee_id: "emp_001".to_string(),
    ///     leave_policy_id: "casual".to_string(),
    ///     requested: Decimal::new(3, 0),
    ///     available: Decimal::new(1, 0),
    /// };
    /// assert!(error.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientBalance { .. }
                | EngineError::InvalidQuantity { .. }
                | EngineError::InvalidDateRange { .. }
                | EngineError::PolicyNotFound { .. }
                | EngineError::PolicyInactive { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
