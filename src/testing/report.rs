//! Scenario results

use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one assertion
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// 1-based step number
    pub step: usize,
    pub step_name: Option<String>,
    pub description: String,
    pub passed: bool,
    /// Observed state when the check failed
    pub detail: Option<String>,
    /// Page captured when the check failed
    pub screenshot: Option<PathBuf>,
}

/// A file written while the scenario ran
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Step name (or `step-N`) the file was captured for
    pub tag: String,
    pub path: PathBuf,
}

/// Result of a scenario run
#[derive(Debug, Clone, Default)]
pub struct ScenarioResult {
    pub name: String,
    pub checks: Vec<CheckOutcome>,
    pub artifacts: Vec<Artifact>,
    pub steps_run: usize,
    pub steps_total: usize,
    /// Error that aborted the scenario
    pub error: Option<String>,
    /// Short label of the aborting error (`TIMEOUT`, `LAUNCH_ERROR`, ...)
    pub error_kind: Option<&'static str>,
    pub duration: Duration,
}

impl ScenarioResult {
    pub fn new(name: &str, steps_total: usize) -> Self {
        Self {
            name: name.to_string(),
            steps_total,
            ..Default::default()
        }
    }

    /// True when no step aborted and every check passed
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Artifact captured for a step tag
    pub fn artifact(&self, tag: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(passed: bool) -> CheckOutcome {
        CheckOutcome {
            step: 1,
            step_name: None,
            description: "text=\"x\" is visible".into(),
            passed,
            detail: None,
            screenshot: None,
        }
    }

    #[test]
    fn test_passed_requires_all_checks_and_no_error() {
        let mut result = ScenarioResult::new("s", 3);
        assert!(result.passed());

        result.checks.push(check(true));
        assert!(result.passed());

        result.checks.push(check(false));
        assert!(!result.passed());
        assert_eq!(result.failed_checks().count(), 1);

        let mut aborted = ScenarioResult::new("s", 3);
        aborted.error = Some("Timed out".into());
        assert!(!aborted.passed());
    }
}
