//! Audit models shared by the rule functions.
//!
//! Every rule decision can be recorded as an [`AuditStep`] so that a status or a
//! balance change can be explained after the fact. Non-fatal concerns are
//! reported as [`AuditWarning`]s.

use serde::{Deserialize, Serialize};

/// A single step in the audit trail recording a rule decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
///
/// # Example
///
/// ```
/// use hr_policy_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "late_check_in".to_string(),
///     rule_name: "Late Check-in Detection".to_string(),
///     policy_ref: "standard".to_string(),
///     input: serde_json::json!({"check_in": "2025-03-04T09:20:00"}),
///     output: serde_json::json!({"is_late": true}),
///     reasoning: "Checked in 5 minutes after the grace boundary".to_string(),
/// };
/// assert_eq!(step.output["is_late"], true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The policy whose configuration drove the decision.
    pub policy_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated while applying rules.
///
/// Warnings indicate potential issues that don't prevent a result
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}
