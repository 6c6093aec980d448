//! CLI command handling
//!
//! Runs or checks scenario files and prints a summary over all of them.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::testing::{self, RunOverrides, ScenarioResult};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Run {
            files,
            base_url,
            output_dir,
            headed,
            fail_fast,
        } => {
            let config = Config::load(config_path)?;
            let overrides = RunOverrides {
                base_url,
                output_dir,
                headed,
                fail_fast,
            };
            run_files(&files, &config, &overrides).await
        }

        Commands::Check { files } => check_files(&files),
    }
}

/// Run each scenario file in turn; one failing file does not stop the rest
async fn run_files(files: &[PathBuf], config: &Config, overrides: &RunOverrides) -> Result<()> {
    let started = Instant::now();
    let mut summary = RunSummary::default();

    for path in files {
        match testing::run_scenario(path, config, overrides).await {
            Ok(result) => summary.record(&result),
            Err(e) => {
                println!("\n{} {}: {}", "✗".red().bold(), path.display(), e);
                tracing::error!(path = %path.display(), error = %e, "Scenario could not be loaded");
                summary.record_error(path, &e);
            }
        }
    }

    summary.duration = started.elapsed();
    summary.print();
    summary.into_result()
}

fn check_files(files: &[PathBuf]) -> Result<()> {
    let mut invalid = 0;
    for path in files {
        match testing::load_scenario(path) {
            Ok(scenario) => println!(
                "{} {} {}",
                "✓".green(),
                path.display(),
                format!(
                    "({}: {} routes, {} steps)",
                    scenario.name,
                    scenario.routes.len(),
                    scenario.steps.len()
                )
                .dimmed()
            ),
            Err(e) => {
                invalid += 1;
                println!("{} {}", "✗".red(), e);
            }
        }
    }

    if invalid > 0 {
        return Err(Error::Scenario(format!(
            "{} of {} scenario files are invalid",
            invalid,
            files.len()
        )));
    }
    Ok(())
}

/// Totals over one `run` invocation
#[derive(Debug, Default)]
struct RunSummary {
    passed: Vec<String>,
    /// Scenario (or file) name and the reason it failed
    failed: Vec<(String, String)>,
    screenshots: usize,
    duration: Duration,
}

impl RunSummary {
    fn record(&mut self, result: &ScenarioResult) {
        self.screenshots += result.artifacts.len();
        if result.passed() {
            self.passed.push(result.name.clone());
            return;
        }
        let reason = match (&result.error, result.error_kind) {
            (Some(error), Some(kind)) => format!("{}: {}", kind, error),
            (Some(error), None) => error.clone(),
            _ => format!("{} failed check(s)", result.failed_checks().count()),
        };
        self.failed.push((result.name.clone(), reason));
    }

    fn record_error(&mut self, path: &Path, error: &Error) {
        self.failed
            .push((path.display().to_string(), format!("{}: {}", error.kind(), error)));
    }

    fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    fn print(&self) {
        println!("{}", "Summary:".cyan().bold());
        for (name, reason) in &self.failed {
            println!("  {} {} {}", "✗".red(), name, format!("({})", reason).dimmed());
        }
        let passed = format!("{} passed", self.passed.len());
        let failed = format!("{} failed", self.failed.len());
        println!(
            "  {}, {}, {} total ({} screenshots, {:.1}s)",
            if self.passed.is_empty() { passed.normal() } else { passed.green() },
            if self.failed.is_empty() { failed.normal() } else { failed.red() },
            self.total(),
            self.screenshots,
            self.duration.as_secs_f64()
        );
    }

    fn into_result(self) -> Result<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Scenario(format!(
                "{} of {} scenarios failed",
                self.failed.len(),
                self.total()
            )))
        }
    }
}
