//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading policy
//! configurations from YAML files.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendancePolicy, Holiday, LeavePolicy, LeavePolicyFilter, PolicyAssignment, holiday_dates,
};
use crate::providers::{AssignmentProvider, HolidayProvider, PolicyProvider};

use super::types::{
    AssignmentsFile, AttendancePoliciesFile, HolidayFile, LeavePoliciesFile, PolicyConfig,
};

/// Loads and provides access to policy configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory,
/// resolves every default, and serves the result through the
/// [`PolicyProvider`], [`HolidayProvider`] and [`AssignmentProvider`] traits.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── attendance_policies.yaml  # Attendance policy revisions
/// ├── leave_policies.yaml       # Leave policies
/// ├── policy_assignments.yaml   # Optional employee assignments
/// └── holidays/
///     └── 2025.yaml             # Holidays, any number of files
/// ```
///
/// # Example
///
/// ```no_run
/// use hr_policy_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
/// let policy = loader.attendance_policy_for("emp_001", date).unwrap();
/// println!("Attendance policy: {}", policy.name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PolicyConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `attendance_policies.yaml` or `leave_policies.yaml` is missing
    /// - Any file contains invalid YAML
    /// - Any policy violates its invariants or shares an id with another
    ///
    /// A missing `holidays/` directory or `policy_assignments.yaml` is not an
    /// error; the loader then has no holidays or assignments.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let attendance_policies = Self::load_yaml::<AttendancePoliciesFile>(
            &path.join("attendance_policies.yaml"),
        )?
        .attendance_policies
        .into_iter()
        .map(|p| p.resolve())
        .collect::<EngineResult<Vec<_>>>()?;
        Self::ensure_unique(attendance_policies.iter().map(|p| p.id.as_str()))?;

        let leave_policies = Self::load_yaml::<LeavePoliciesFile>(
            &path.join("leave_policies.yaml"),
        )?
        .leave_policies
        .into_iter()
        .map(|p| p.resolve())
        .collect::<EngineResult<Vec<_>>>()?;
        Self::ensure_unique(leave_policies.iter().map(|p| p.id.as_str()))?;

        let holidays = Self::load_holidays(&path.join("holidays"))?;

        let assignments_path = path.join("policy_assignments.yaml");
        let assignments = if assignments_path.exists() {
            Self::load_yaml::<AssignmentsFile>(&assignments_path)?.assignments
        } else {
            Vec::new()
        };

        info!(
            path = %path.display(),
            attendance_policies = attendance_policies.len(),
            leave_policies = leave_policies.len(),
            holidays = holidays.len(),
            assignments = assignments.len(),
            "Policy configuration loaded"
        );

        let config = PolicyConfig::new(attendance_policies, leave_policies, holidays, assignments);
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every holiday file from the holidays directory.
    fn load_holidays(holidays_dir: &Path) -> EngineResult<Vec<Holiday>> {
        let holidays_dir_str = holidays_dir.display().to_string();

        if !holidays_dir.exists() {
            debug!(path = %holidays_dir_str, "No holidays directory");
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(holidays_dir).map_err(|_| EngineError::ConfigNotFound {
            path: holidays_dir_str.clone(),
        })?;

        let mut holidays = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: holidays_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                holidays.extend(Self::load_yaml::<HolidayFile>(&path)?.holidays);
            }
        }

        Ok(holidays)
    }

    fn ensure_unique<'a>(ids: impl Iterator<Item = &'a str>) -> EngineResult<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                return Err(EngineError::InvalidPolicy {
                    policy_id: id.to_string(),
                    message: "policy id is defined more than once".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the underlying policy configuration.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Gets the attendance policy revision in force for an employee on `date`.
    ///
    /// One set of revisions applies to every employee. When several revisions
    /// cover the date, the one that became effective most recently wins.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PolicyNotFound`] if no revision covers `date`.
    pub fn attendance_policy_for(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<&AttendancePolicy> {
        self.config
            .attendance_policies()
            .iter()
            .rev()
            .find(|p| p.is_effective_on(date))
            .ok_or_else(|| EngineError::PolicyNotFound {
                employee_id: employee_id.to_string(),
                date,
            })
    }

    /// Gets a leave policy by id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPolicy`] for an unknown id and
    /// [`EngineError::PolicyInactive`] for an archived policy.
    pub fn leave_policy(&self, id: &str) -> EngineResult<&LeavePolicy> {
        let policy = self
            .config
            .leave_policies()
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::InvalidPolicy {
                policy_id: id.to_string(),
                message: "unknown leave policy".to_string(),
            })?;

        if !policy.active {
            return Err(EngineError::PolicyInactive {
                policy_id: id.to_string(),
            });
        }
        Ok(policy)
    }
}

impl PolicyProvider for ConfigLoader {
    fn active_attendance_policy(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AttendancePolicy>> {
        match self.attendance_policy_for(employee_id, date) {
            Ok(policy) => Ok(Some(policy.clone())),
            Err(EngineError::PolicyNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn active_leave_policies(&self, filter: LeavePolicyFilter) -> EngineResult<Vec<LeavePolicy>> {
        Ok(self
            .config
            .leave_policies()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }
}

impl HolidayProvider for ConfigLoader {
    fn holidays(&self, year: i32) -> EngineResult<BTreeSet<NaiveDate>> {
        Ok(holiday_dates(self.config.holidays(year)))
    }
}

impl AssignmentProvider for ConfigLoader {
    fn active_assignments(
        &self,
        leave_policy_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<PolicyAssignment>> {
        Ok(self
            .config
            .assignments()
            .iter()
            .filter(|a| a.leave_policy_id == leave_policy_id && a.covers(date))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().attendance_policies().len(), 2);
        assert_eq!(loader.config().leave_policies().len(), 4);
        assert_eq!(loader.config().assignments().len(), 4);
    }

    #[test]
    fn test_attendance_policy_revision_by_date() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let old = loader.attendance_policy_for("emp_001", date(2024, 12, 31)).unwrap();
        assert_eq!(old.id, "standard_2024");

        let current = loader.attendance_policy_for("emp_001", date(2025, 1, 1)).unwrap();
        assert_eq!(current.id, "standard_2025");
        assert_eq!(current.late_grace_period_minutes, 15);
    }

    #[test]
    fn test_provider_returns_policy_for_record_date() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let policy = loader
            .active_attendance_policy("emp_001", date(2024, 6, 3))
            .unwrap()
            .unwrap();
        assert_eq!(policy.id, "standard_2024");
    }

    #[test]
    fn test_leave_policy_defaults_resolved() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let sick = loader.leave_policy("sick").unwrap();
        assert_eq!(sick.monthly_accrual_value, dec("0.83"));
        assert_eq!(sick.annual_maximum, dec("10"));
        assert!(!sick.carry_forward_allowed);

        let earned = loader.leave_policy("earned").unwrap();
        assert_eq!(earned.monthly_accrual_value, dec("1.25"));
    }

    #[test]
    fn test_leave_policy_unknown_and_inactive() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        match loader.leave_policy("unknown") {
            Err(EngineError::InvalidPolicy { policy_id, .. }) => assert_eq!(policy_id, "unknown"),
            other => panic!("Expected InvalidPolicy error, got {:?}", other),
        }
        match loader.leave_policy("comp_off") {
            Err(EngineError::PolicyInactive { policy_id }) => assert_eq!(policy_id, "comp_off"),
            other => panic!("Expected PolicyInactive error, got {:?}", other),
        }
    }

    #[test]
    fn test_leave_policy_filters() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let accruing = loader
            .active_leave_policies(LeavePolicyFilter {
                monthly_accrual: true,
                ..Default::default()
            })
            .unwrap();
        let ids: Vec<_> = accruing.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["casual", "sick", "earned"]);

        let quarterly = loader
            .active_leave_policies(LeavePolicyFilter {
                quarterly_carry_forward: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(quarterly.len(), 1);
        assert_eq!(quarterly[0].id, "casual");
    }

    #[test]
    fn test_holidays_loaded_per_year() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let holidays = loader.holidays(2025).unwrap();
        assert_eq!(holidays.len(), 5);
        assert!(holidays.contains(&date(2025, 8, 15)));
        assert!(loader.holidays(2030).unwrap().is_empty());

        let span = loader
            .holidays_between(date(2025, 12, 1), date(2026, 1, 31))
            .unwrap();
        assert!(span.contains(&date(2025, 12, 25)));
        assert!(span.contains(&date(2026, 1, 26)));
    }

    #[test]
    fn test_assignments_filtered_by_window() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let casual = loader.active_assignments("casual", date(2025, 1, 31)).unwrap();
        let employees: Vec<_> = casual.iter().map(|a| a.employee_id.as_str()).collect();
        assert_eq!(employees, vec!["emp_001", "emp_002"]);
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        assert!(result.is_err());

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("attendance_policies.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }
}
