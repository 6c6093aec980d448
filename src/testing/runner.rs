//! Scenario runner implementation
//!
//! Loads a scenario, launches a browser for it, executes its steps in order
//! and always closes the browser before returning the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::browser::chrome::{ChromePage, LaunchOptions};
use crate::browser::BrowserPage;
use crate::common::config::Config;
use crate::common::paths::scenario_artifact_dir;
use crate::common::{Error, Result};
use crate::fixture::FixtureTable;

use super::config::{Scenario, Step, StepAction};
use super::report::ScenarioResult;
use super::session::{Interaction, Predicate, Session, SessionSettings};

/// Command line settings that win over scenario and config values
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    /// Show the browser window
    pub headed: bool,
    /// Abort every scenario on its first failed assertion
    pub fail_fast: bool,
}

/// Launch options and session settings for one scenario
#[derive(Debug, Clone)]
pub struct ScenarioPlan {
    pub launch: LaunchOptions,
    pub session: SessionSettings,
}

/// Merge settings: command line, then scenario file, then config file
pub fn plan(config: &Config, scenario: &Scenario, overrides: &RunOverrides) -> ScenarioPlan {
    let base_url = overrides
        .base_url
        .clone()
        .or_else(|| scenario.base_url.clone())
        .unwrap_or_else(|| config.base_url.clone());

    let headless = !overrides.headed
        && scenario
            .browser
            .headless
            .unwrap_or(config.browser.headless);

    let output_root = overrides
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.screenshot_dir.clone());

    let timeouts = &scenario.timeouts;
    let navigation_secs = timeouts
        .navigation_secs
        .unwrap_or(config.timeouts.navigation_secs);
    let wait_ms = timeouts.wait_ms.unwrap_or(config.timeouts.wait_ms);
    let assert_ms = timeouts.assert_ms.unwrap_or(config.timeouts.assert_ms);

    ScenarioPlan {
        launch: LaunchOptions {
            headless,
            executable: config.browser.executable.clone(),
            no_sandbox: config.browser.no_sandbox,
            args: config.browser.args.clone(),
            viewport: scenario.browser.viewport.unwrap_or(config.browser.viewport),
            launch_timeout: Duration::from_secs(config.timeouts.launch_secs),
            init_scripts: scenario.init_scripts.clone(),
            capture_console: scenario
                .capture_console
                .unwrap_or(config.output.capture_console),
        },
        session: SessionSettings {
            base_url,
            navigation_timeout: Duration::from_secs(navigation_secs),
            wait_timeout: Duration::from_millis(wait_ms),
            assert_timeout: Duration::from_millis(assert_ms),
            artifact_dir: scenario_artifact_dir(&output_root, &scenario.name),
            fail_fast: overrides.fail_fast || scenario.fail_fast,
        },
    }
}

/// Load a scenario file and validate it without a browser
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let scenario = Scenario::load(path)?;
    scenario.validate().map_err(|e| match e {
        Error::Scenario(msg) => Error::Scenario(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;
    Ok(scenario)
}

/// Run a scenario from a YAML file against a freshly launched browser
///
/// Load and validation errors are returned as `Err`; everything that goes
/// wrong once the scenario started (including a failed launch) ends up in
/// the returned result.
pub async fn run_scenario(
    path: &Path,
    config: &Config,
    overrides: &RunOverrides,
) -> Result<ScenarioResult> {
    let scenario = load_scenario(path)?;
    print_header(&scenario);

    let mut plan = plan(config, &scenario, overrides);
    plan.launch.executable = config.browser_executable();

    let table = Arc::new(FixtureTable::new());

    println!("\n{}", "Launching browser...".cyan());
    if let Some(exe) = &plan.launch.executable {
        tracing::debug!(executable = %exe.display(), "Using browser executable");
    }
    let started = Instant::now();
    let page = match ChromePage::launch(&plan.launch, Arc::clone(&table)).await {
        Ok(page) => page,
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            let mut result = ScenarioResult::new(&scenario.name, scenario.steps.len());
            result.error_kind = Some(e.kind());
            result.error = Some(e.to_string());
            result.duration = started.elapsed();
            print_verdict(&result);
            return Ok(result);
        }
    };
    println!("  {} Browser started", "✓".green());

    Ok(run_with_page(&scenario, page, table, plan.session).await)
}

/// Execute a scenario on an already running page
///
/// The page is closed before this returns, on success and on failure.
pub async fn run_with_page<P: BrowserPage>(
    scenario: &Scenario,
    page: P,
    table: Arc<FixtureTable>,
    settings: SessionSettings,
) -> ScenarioResult {
    let started = Instant::now();
    let result = ScenarioResult::new(&scenario.name, scenario.steps.len());
    let mut session = Session::new(page, table, settings, result);
    let mut error = None;

    for route in &scenario.routes {
        match route.to_fixture() {
            Ok(fixture) => {
                session.register_route(fixture);
            }
            Err(e) => {
                println!("  {} Route {}: {}", "✗".red(), route.pattern, e);
                error = Some(e);
                break;
            }
        }
    }

    if error.is_none() {
        println!("\n{}", "Steps:".cyan());
        for (i, step) in scenario.steps.iter().enumerate() {
            let step_num = i + 1;
            session.begin_step(step_num, step.name.as_deref());

            if let Err(e) = execute_step(&mut session, step, step_num).await {
                report_failure(&mut session, step, step_num, &e).await;
                error = Some(e);
                break;
            }
        }
    }

    // Cleanup: release the browser on every path
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Failed to close browser");
    }

    let mut result = session.into_result();
    result.duration = started.elapsed();
    if let Some(e) = error {
        result.error_kind = Some(e.kind());
        result.error = Some(e.to_string());
    }
    print_verdict(&result);
    result
}

fn step_label(step_num: usize, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("Step {} ({})", step_num, name),
        None => format!("Step {}", step_num),
    }
}

/// Execute a single step
async fn execute_step<P: BrowserPage>(
    session: &mut Session<P>,
    step: &Step,
    step_num: usize,
) -> Result<()> {
    let label = step_label(step_num, step.name.as_deref());
    tracing::debug!(step = step_num, action = %step.action.describe(), "Executing step");

    match &step.action {
        StepAction::Navigate { url, timeout_ms } => {
            session.goto(url, timeout_ms.map(Duration::from_millis)).await?;
        }
        StepAction::Reload { timeout_ms } => {
            session.reload(timeout_ms.map(Duration::from_millis)).await?;
        }
        StepAction::WaitFor {
            locator,
            state,
            timeout_ms,
        } => {
            session
                .wait_for(locator, *state, timeout_ms.map(Duration::from_millis))
                .await?;
        }
        StepAction::Click { locator } => {
            session.interact(Interaction::Click, locator).await?;
        }
        StepAction::Fill { locator, value } => {
            session.interact(Interaction::Fill(value), locator).await?;
        }
        StepAction::ClickAt { x, y } => {
            session.click_at(*x, *y).await?;
        }
        StepAction::AssertVisible {
            locator,
            expected,
            timeout_ms,
        } => {
            let predicate = if *expected {
                Predicate::Visible(locator.clone())
            } else {
                Predicate::Hidden(locator.clone())
            };
            return execute_check(session, &label, &predicate, *timeout_ms).await;
        }
        StepAction::AssertCount {
            locator,
            count,
            timeout_ms,
        } => {
            let predicate = Predicate::Count(locator.clone(), *count);
            return execute_check(session, &label, &predicate, *timeout_ms).await;
        }
        StepAction::Screenshot { path } => {
            let saved = session.screenshot(path.as_deref()).await?;
            println!(
                "  {} {}: screenshot {}",
                "✓".green(),
                label,
                saved.display().to_string().dimmed()
            );
            return Ok(());
        }
        StepAction::Route { fixture } => {
            session.register_route(fixture.to_fixture()?);
        }
        StepAction::Unroute { pattern } => {
            session.unregister_route(pattern);
        }
        StepAction::Evaluate { script } => {
            let value = session.evaluate(script).await?;
            tracing::debug!(step = step_num, %value, "Script evaluated");
        }
    }

    println!(
        "  {} {}: {}",
        "✓".green(),
        label,
        step.action.describe().dimmed()
    );
    Ok(())
}

/// Execute an assertion step; a failed check is printed and recorded
async fn execute_check<P: BrowserPage>(
    session: &mut Session<P>,
    label: &str,
    predicate: &Predicate,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let passed = session
        .assert_state(predicate, timeout_ms.map(Duration::from_millis))
        .await?;

    if passed {
        println!("  {} {}: {}", "✓".green(), label, predicate);
    } else {
        let last = session.result().checks.last();
        let detail = last.and_then(|c| c.detail.clone()).unwrap_or_default();
        let screenshot = last.and_then(|c| c.screenshot.clone());
        println!(
            "  {} {}: {} ({})",
            "✗".red(),
            label,
            predicate,
            detail.dimmed()
        );
        print_screenshot(screenshot.as_deref());
    }
    Ok(())
}

fn print_screenshot(path: Option<&Path>) {
    if let Some(path) = path {
        println!(
            "    {} {}",
            "Screenshot:".dimmed(),
            path.display().to_string().dimmed()
        );
    }
}

async fn report_failure<P: BrowserPage>(
    session: &mut Session<P>,
    step: &Step,
    step_num: usize,
    error: &Error,
) {
    let label = step_label(step_num, step.name.as_deref());
    println!("  {} {}: {}", "✗".red(), label, error);
    tracing::error!(
        step = step_num,
        name = step.name.as_deref().unwrap_or(""),
        action = %step.action.describe(),
        "Step failed: {}",
        error
    );

    if matches!(error, Error::SessionClosed) {
        return;
    }
    if let Ok(url) = session.current_url().await {
        tracing::info!(%url, "Page at failure");
    }
    // A failed fail-fast check already captured the page
    if matches!(error, Error::AssertionFailed(_)) {
        let captured = session
            .result()
            .checks
            .last()
            .filter(|c| !c.passed && c.step == step_num)
            .and_then(|c| c.screenshot.clone());
        if captured.is_some() {
            print_screenshot(captured.as_deref());
            return;
        }
    }
    match session.failure_screenshot().await {
        Ok(path) => print_screenshot(Some(&path)),
        Err(e) => tracing::warn!(error = %e, "Could not capture failure screenshot"),
    }
}

fn print_header(scenario: &Scenario) {
    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }
}

fn print_verdict(result: &ScenarioResult) {
    if result.passed() {
        println!(
            "\n{} {}\n",
            "✓".green().bold(),
            "Scenario Passed".green().bold()
        );
        return;
    }

    println!("\n{} {}", "✗".red().bold(), "Scenario Failed".red().bold());
    let failed = result.failed_checks().count();
    if failed > 0 {
        println!("  {} of {} checks failed", failed, result.checks.len());
    }
    if let Some(error) = &result.error {
        println!(
            "  Aborted at step {}/{}: {}",
            result.steps_run, result.steps_total, error
        );
    }
    println!();
}
