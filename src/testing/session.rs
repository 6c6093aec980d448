//! One scenario's live browser session
//!
//! Owns the page, the fixture table shared with the request interceptor and
//! the result being built. Every wait and assertion polls the page until its
//! condition holds or its budget runs out; nothing here sleeps for a fixed
//! time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::browser::{BrowserPage, Locator, Probe, WaitState};
use crate::common::paths::{ensure_parent_dir, slugify};
use crate::common::{resolve_url, Error, Result};
use crate::fixture::{Fixture, FixtureTable};

use super::report::{Artifact, CheckOutcome, ScenarioResult};

/// Delay between two probes of the same condition
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Budget of a diagnostic screenshot taken after a failure
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Effective settings of one scenario run
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub base_url: String,
    pub navigation_timeout: Duration,
    pub wait_timeout: Duration,
    pub assert_timeout: Duration,
    /// Directory receiving this scenario's screenshots
    pub artifact_dir: PathBuf,
    /// Raise on the first failed assertion instead of recording it
    pub fail_fast: bool,
}

/// Element interaction
#[derive(Debug, Clone, Copy)]
pub enum Interaction<'a> {
    Click,
    Fill(&'a str),
}

/// Condition checked by an assertion
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Visible(Locator),
    Hidden(Locator),
    Count(Locator, usize),
}

impl Predicate {
    pub fn locator(&self) -> &Locator {
        match self {
            Predicate::Visible(l) | Predicate::Hidden(l) | Predicate::Count(l, _) => l,
        }
    }

    pub fn holds(&self, probe: Probe) -> bool {
        match self {
            Predicate::Visible(_) => probe.visible > 0,
            Predicate::Hidden(_) => probe.visible == 0,
            Predicate::Count(_, n) => probe.count == *n,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Visible(l) => write!(f, "{} is visible", l),
            Predicate::Hidden(l) => write!(f, "{} is not visible", l),
            Predicate::Count(l, n) => write!(f, "{} has {} match(es)", l, n),
        }
    }
}

/// Live session for one scenario
pub struct Session<P: BrowserPage> {
    page: P,
    table: Arc<FixtureTable>,
    settings: SessionSettings,
    result: ScenarioResult,
    step: usize,
    step_name: Option<String>,
    closed: bool,
}

impl<P: BrowserPage> Session<P> {
    /// Wrap an already running page
    pub fn new(
        page: P,
        table: Arc<FixtureTable>,
        settings: SessionSettings,
        result: ScenarioResult,
    ) -> Self {
        Self {
            page,
            table,
            settings,
            result,
            step: 0,
            step_name: None,
            closed: false,
        }
    }

    pub fn result(&self) -> &ScenarioResult {
        &self.result
    }

    pub fn into_result(self) -> ScenarioResult {
        self.result
    }

    /// Mark the start of a step; later checks and artifacts are tagged with it
    pub fn begin_step(&mut self, step: usize, name: Option<&str>) {
        self.step = step;
        self.step_name = name.map(str::to_string);
        self.result.steps_run = step;
    }

    /// Tag for the current step: its name, or `step-N`
    pub fn step_tag(&self) -> String {
        match &self.step_name {
            Some(name) => name.clone(),
            None => format!("step-{}", self.step),
        }
    }

    /// Register a fixture; all later matching requests are answered by it
    pub fn register_route(&self, fixture: Fixture) -> u64 {
        let pattern = fixture.pattern.to_string();
        let method = fixture.method.clone();
        let version = self.table.register(fixture);
        tracing::info!(%pattern, ?method, version, "Route registered");
        version
    }

    /// Remove every fixture registered under `pattern`
    pub fn unregister_route(&self, pattern: &str) -> usize {
        let removed = self.table.unregister(pattern);
        if removed == 0 {
            tracing::warn!(pattern, "Unroute matched no registered fixture");
        } else {
            tracing::info!(pattern, removed, "Route removed");
        }
        removed
    }

    /// Navigate to `target`, joined onto the base URL when relative
    pub async fn goto(&mut self, target: &str, timeout: Option<Duration>) -> Result<()> {
        let url = resolve_url(&self.settings.base_url, target)?;
        let timeout = timeout.unwrap_or(self.settings.navigation_timeout);
        tracing::info!(%url, "Navigating");
        self.page.goto(&url, timeout).await
    }

    pub async fn reload(&mut self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(self.settings.navigation_timeout);
        tracing::info!("Reloading page");
        self.page.reload(timeout).await
    }

    /// Wait until `locator` reaches `state`
    pub async fn wait_for(
        &mut self,
        locator: &Locator,
        state: WaitState,
        timeout: Option<Duration>,
    ) -> Result<Probe> {
        let timeout = timeout.unwrap_or(self.settings.wait_timeout);
        let (reached, probe) = self
            .poll_until(locator, timeout, |p| state.is_reached(p))
            .await?;
        if reached {
            tracing::debug!(%locator, %state, count = probe.count, "Wait satisfied");
            Ok(probe)
        } else {
            Err(Error::WaitTimeout {
                locator: locator.to_string(),
                state: state.to_string(),
                timeout_ms: duration_ms(timeout),
            })
        }
    }

    /// Click or fill the single element `locator` resolves to
    ///
    /// Waits (up to the wait budget) for a visible match first.
    pub async fn interact(&mut self, interaction: Interaction<'_>, locator: &Locator) -> Result<()> {
        let timeout = self.settings.wait_timeout;
        let (ready, probe) = self.poll_until(locator, timeout, |p| p.visible > 0).await?;
        if !ready && probe.count == 1 {
            return Err(Error::WaitTimeout {
                locator: locator.to_string(),
                state: WaitState::Visible.to_string(),
                timeout_ms: duration_ms(timeout),
            });
        }
        if probe.count != 1 {
            return Err(Error::ElementNotFound {
                locator: locator.to_string(),
                count: probe.count,
            });
        }
        match interaction {
            Interaction::Click => self.page.click(locator).await,
            Interaction::Fill(value) => self.page.fill(locator, value).await,
        }
    }

    pub async fn click_at(&mut self, x: f64, y: f64) -> Result<()> {
        self.page.click_at(x, y).await
    }

    pub async fn current_url(&mut self) -> Result<String> {
        self.page.current_url().await
    }

    pub async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value> {
        self.page.evaluate(script).await
    }

    /// Check a predicate, retrying until it holds or the budget runs out
    ///
    /// The outcome is recorded either way. A failure is returned as
    /// `Error::AssertionFailed` only for fail-fast scenarios.
    pub async fn assert_state(
        &mut self,
        predicate: &Predicate,
        timeout: Option<Duration>,
    ) -> Result<bool> {
        let timeout = timeout.unwrap_or(self.settings.assert_timeout);
        let (passed, probe) = self
            .poll_until(predicate.locator(), timeout, |p| predicate.holds(p))
            .await?;

        let detail = (!passed).then(|| {
            format!(
                "found {} attached, {} visible after {}ms",
                probe.count,
                probe.visible,
                duration_ms(timeout)
            )
        });
        let screenshot = if passed {
            None
        } else {
            self.failed_check_screenshot().await
        };
        self.result.checks.push(CheckOutcome {
            step: self.step,
            step_name: self.step_name.clone(),
            description: predicate.to_string(),
            passed,
            detail: detail.clone(),
            screenshot,
        });

        if passed {
            tracing::debug!(step = self.step, %predicate, "Check passed");
        } else {
            tracing::warn!(step = self.step, %predicate, detail = ?detail, "Check failed");
            if self.settings.fail_fast {
                return Err(Error::AssertionFailed(format!(
                    "{} ({})",
                    predicate,
                    detail.unwrap_or_default()
                )));
            }
        }
        Ok(passed)
    }

    /// Save a screenshot for the current step
    ///
    /// Without `path` the file is `<artifact_dir>/<step tag>.png`; a relative
    /// `path` is taken inside the artifact directory.
    pub async fn screenshot(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let tag = self.step_tag();
        let path = match path {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => self.settings.artifact_dir.join(p),
            None => self.settings.artifact_dir.join(format!("{}.png", slugify(&tag))),
        };
        self.capture(tag, path).await
    }

    /// Best-effort diagnostic screenshot after a failed step
    pub async fn failure_screenshot(&mut self) -> Result<PathBuf> {
        let path = self.settings.artifact_dir.join("failure.png");
        self.bounded_capture("failure".to_string(), path).await
    }

    /// Capture `failed-<step tag>.png` for a failed check
    ///
    /// A capture error only logs; the check outcome is recorded regardless.
    async fn failed_check_screenshot(&mut self) -> Option<PathBuf> {
        let tag = format!("failed-{}", self.step_tag());
        let path = self
            .settings
            .artifact_dir
            .join(format!("{}.png", slugify(&tag)));
        match self.bounded_capture(tag, path).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(step = self.step, error = %e, "Could not capture failed check");
                None
            }
        }
    }

    async fn bounded_capture(&mut self, tag: String, path: PathBuf) -> Result<PathBuf> {
        let target = path.clone();
        tokio::time::timeout(CAPTURE_TIMEOUT, self.capture(tag, path))
            .await
            .map_err(|_| Error::screenshot(&target, "capture timed out"))?
    }

    async fn capture(&mut self, tag: String, path: PathBuf) -> Result<PathBuf> {
        let png = self
            .page
            .screenshot()
            .await
            .map_err(|e| Error::screenshot(&path, e))?;
        ensure_parent_dir(&path).map_err(|e| Error::screenshot(&path, e))?;
        tokio::fs::write(&path, png)
            .await
            .map_err(|e| Error::screenshot(&path, e))?;

        tracing::info!(path = %path.display(), %tag, "Screenshot saved");
        self.result.artifacts.push(Artifact {
            tag,
            path: path.clone(),
        });
        Ok(path)
    }

    /// Close the page and browser; later calls are no-ops
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.page.close().await
    }

    /// Probe until `done` holds or `timeout` elapses
    ///
    /// Never runs past the deadline, even when a probe itself stalls. Probe
    /// errors other than a closed session count as "not yet".
    async fn poll_until<F>(
        &mut self,
        locator: &Locator,
        timeout: Duration,
        done: F,
    ) -> Result<(bool, Probe)>
    where
        F: Fn(Probe) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut last = Probe::default();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, self.page.probe(locator)).await {
                Ok(Ok(probe)) => {
                    last = probe;
                    if done(probe) {
                        return Ok((true, probe));
                    }
                }
                Ok(Err(Error::SessionClosed)) => return Err(Error::SessionClosed),
                Ok(Err(e)) => {
                    tracing::debug!(%locator, error = %e, "Probe failed, retrying");
                }
                Err(_) => return Ok((false, last)),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok((false, last));
            }
            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
