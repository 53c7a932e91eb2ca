//! Configuration loading for the HR policy engine.
//!
//! This module loads attendance policies, leave policies, holidays and policy
//! assignments from YAML files, resolving every optional field to its default
//! at load time.
//!
//! # Example
//!
//! ```no_run
//! use hr_policy_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded {} leave policies", config.config().leave_policies().len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AssignmentsFile, AttendancePoliciesFile, AttendancePolicyConfig, DEFAULT_FULL_DAY_MINUTES,
    DEFAULT_HALF_DAY_MINUTES, HolidayFile, LeavePoliciesFile, LeavePolicyConfig, PolicyConfig,
};
