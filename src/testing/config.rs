//! Scenario file types
//!
//! Defines the data structures for deserializing YAML scenarios.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::browser::{Locator, WaitState};
use crate::common::config::Viewport;
use crate::common::{Error, Result};
use crate::fixture::{Fixture, FixtureAction, FixtureResponse, UrlPattern};

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Name of the scenario, also used for its artifact directory
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Base URL for relative navigation (overrides the config file)
    pub base_url: Option<String>,
    /// Browser overrides for this scenario
    #[serde(default)]
    pub browser: BrowserOverrides,
    /// Timeout overrides for this scenario
    #[serde(default)]
    pub timeouts: TimeoutOverrides,
    /// Scripts evaluated in every document before the page's own scripts
    #[serde(default)]
    pub init_scripts: Vec<String>,
    /// Log browser console output (overrides the config file)
    pub capture_console: Option<bool>,
    /// Abort on the first failed assertion
    #[serde(default)]
    pub fail_fast: bool,
    /// Fixtures registered before the first step
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    /// The sequence of steps to execute
    pub steps: Vec<Step>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct BrowserOverrides {
    pub headless: Option<bool>,
    pub viewport: Option<Viewport>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TimeoutOverrides {
    pub navigation_secs: Option<u64>,
    pub wait_ms: Option<u64>,
    pub assert_ms: Option<u64>,
}

/// A route fixture as written in a scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    /// URL glob, e.g. `**/api/tickets?organization_id=*`
    pub pattern: String,
    /// Only intercept this HTTP method
    pub method: Option<String>,
    /// Let matching requests reach the network
    #[serde(default)]
    pub passthrough: bool,
    /// Synthetic response for matching requests
    pub respond: Option<FixtureResponse>,
}

impl RouteSpec {
    /// Build and validate the fixture this route describes
    pub fn to_fixture(&self) -> Result<Fixture> {
        if self.pattern.trim().is_empty() {
            return Err(Error::InvalidPattern {
                pattern: self.pattern.clone(),
                reason: "pattern is empty".to_string(),
            });
        }
        let action = match (&self.respond, self.passthrough) {
            (Some(response), false) => FixtureAction::Fulfill(response.clone()),
            (None, true) => FixtureAction::Passthrough,
            (Some(_), true) => {
                return Err(Error::invalid_fixture(
                    &self.pattern,
                    "'respond' and 'passthrough' are mutually exclusive",
                ))
            }
            (None, false) => {
                return Err(Error::invalid_fixture(
                    &self.pattern,
                    "route needs 'respond' or 'passthrough: true'",
                ))
            }
        };
        let fixture = Fixture {
            pattern: UrlPattern::new(&self.pattern),
            method: self.method.as_ref().map(|m| m.to_ascii_uppercase()),
            action,
        };
        fixture.validate()?;
        Ok(fixture)
    }
}

/// One step; `name` tags log lines and artifacts
#[derive(Deserialize, Debug, Clone)]
pub struct Step {
    pub name: Option<String>,
    #[serde(flatten)]
    pub action: StepAction,
}

fn default_true() -> bool {
    true
}

/// A single step in the execution flow
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Navigate to a URL (relative URLs join the base URL)
    Navigate {
        url: String,
        timeout_ms: Option<u64>,
    },
    /// Reload the current page
    Reload { timeout_ms: Option<u64> },
    /// Wait until an element reaches a state
    WaitFor {
        locator: Locator,
        #[serde(default)]
        state: WaitState,
        timeout_ms: Option<u64>,
    },
    Click { locator: Locator },
    Fill { locator: Locator, value: String },
    /// Mouse click at viewport coordinates
    ClickAt { x: f64, y: f64 },
    /// Check that an element is (or is not) visible
    AssertVisible {
        locator: Locator,
        #[serde(default = "default_true")]
        expected: bool,
        timeout_ms: Option<u64>,
    },
    /// Check the number of attached matches
    AssertCount {
        locator: Locator,
        count: usize,
        timeout_ms: Option<u64>,
    },
    /// Save a PNG; the file is named after the step unless `path` is given
    Screenshot { path: Option<PathBuf> },
    /// Register a fixture (replacing older ones for matching requests)
    Route { fixture: RouteSpec },
    /// Remove every fixture registered under a pattern
    Unroute { pattern: String },
    /// Evaluate a script in the page
    Evaluate { script: String },
}

impl StepAction {
    /// Short human-readable description for output lines
    pub fn describe(&self) -> String {
        match self {
            StepAction::Navigate { url, .. } => format!("navigate {}", url),
            StepAction::Reload { .. } => "reload".to_string(),
            StepAction::WaitFor { locator, state, .. } => {
                format!("wait for {} to be {}", locator, state)
            }
            StepAction::Click { locator } => format!("click {}", locator),
            StepAction::Fill { locator, value } => format!("fill {} with {:?}", locator, value),
            StepAction::ClickAt { x, y } => format!("click at ({}, {})", x, y),
            StepAction::AssertVisible {
                locator, expected, ..
            } => {
                if *expected {
                    format!("{} is visible", locator)
                } else {
                    format!("{} is not visible", locator)
                }
            }
            StepAction::AssertCount { locator, count, .. } => {
                format!("{} has {} match(es)", locator, count)
            }
            StepAction::Screenshot { path } => match path {
                Some(p) => format!("screenshot {}", p.display()),
                None => "screenshot".to_string(),
            },
            StepAction::Route { fixture } => match &fixture.method {
                Some(method) => format!("route {} {}", method.to_ascii_uppercase(), fixture.pattern),
                None => format!("route {}", fixture.pattern),
            },
            StepAction::Unroute { pattern } => format!("unroute {}", pattern),
            StepAction::Evaluate { script } => {
                let first = script.lines().next().unwrap_or_default();
                format!("evaluate {}", first)
            }
        }
    }
}

/// Keys a step action takes besides `name` and `action`
fn step_fields(action: &str) -> Option<&'static [&'static str]> {
    let fields: &'static [&'static str] = match action {
        "navigate" => &["url", "timeout_ms"],
        "reload" => &["timeout_ms"],
        "wait_for" => &["locator", "state", "timeout_ms"],
        "click" => &["locator"],
        "fill" => &["locator", "value"],
        "click_at" => &["x", "y"],
        "assert_visible" => &["locator", "expected", "timeout_ms"],
        "assert_count" => &["locator", "count", "timeout_ms"],
        "screenshot" => &["path"],
        "route" => &["fixture"],
        "unroute" => &["pattern"],
        "evaluate" => &["script"],
        _ => return None,
    };
    Some(fields)
}

/// Reject step keys the step's action does not take
///
/// `Step` flattens its action, which makes serde ignore unknown keys there.
fn check_step_keys(doc: &serde_yaml::Value) -> Result<()> {
    let Some(steps) = doc.get("steps").and_then(|s| s.as_sequence()) else {
        return Ok(());
    };
    for (i, step) in steps.iter().enumerate() {
        let Some(map) = step.as_mapping() else {
            continue;
        };
        // Unknown or missing actions are reported by the typed parse
        let Some(action) = map.get("action").and_then(|a| a.as_str()) else {
            continue;
        };
        let Some(fields) = step_fields(action) else {
            continue;
        };
        for key in map.keys() {
            match key.as_str() {
                Some("name" | "action") => {}
                Some(k) if fields.contains(&k) => {}
                other => {
                    let key = other.map_or_else(|| format!("{:?}", key), str::to_string);
                    return Err(Error::Scenario(format!(
                        "step {}: unknown key '{}' for action '{}'",
                        i + 1,
                        key,
                        action
                    )));
                }
            }
        }
    }
    Ok(())
}

impl Scenario {
    /// Parse a scenario from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let parse_error = |e: serde_yaml::Error| {
            Error::Scenario(format!("Failed to parse scenario: {}", e))
        };
        let doc: serde_yaml::Value = serde_yaml::from_str(content).map_err(parse_error)?;
        check_step_keys(&doc)?;
        serde_yaml::from_str(content).map_err(parse_error)
    }

    /// Load and parse a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            Error::Scenario(msg) => Error::Scenario(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Check everything that can be checked without a browser
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Scenario("scenario name is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(Error::Scenario(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        if let Some(url) = &self.base_url {
            url::Url::parse(url)
                .map_err(|e| Error::Scenario(format!("invalid base_url '{}': {}", url, e)))?;
        }
        if let Some(viewport) = &self.browser.viewport {
            if viewport.width == 0 || viewport.height == 0 {
                return Err(Error::Scenario("viewport must be non-zero".to_string()));
            }
        }
        for route in &self.routes {
            route.to_fixture()?;
        }

        for (i, step) in self.steps.iter().enumerate() {
            let step_num = i + 1;
            let invalid = |reason: &str| {
                Err(Error::Scenario(format!("step {}: {}", step_num, reason)))
            };
            match &step.action {
                StepAction::Navigate { url, .. } if url.trim().is_empty() => {
                    return invalid("navigate needs a url")
                }
                StepAction::Route { fixture } => {
                    fixture.to_fixture().map_err(|e| {
                        Error::Scenario(format!("step {}: {}", step_num, e))
                    })?;
                }
                StepAction::Unroute { pattern } if pattern.trim().is_empty() => {
                    return invalid("unroute needs a pattern")
                }
                StepAction::Evaluate { script } if script.trim().is_empty() => {
                    return invalid("evaluate needs a script")
                }
                StepAction::ClickAt { x, y }
                    if !x.is_finite() || !y.is_finite() || *x < 0.0 || *y < 0.0 =>
                {
                    return invalid("click_at needs non-negative coordinates")
                }
                _ => {}
            }
        }
        Ok(())
    }
}
