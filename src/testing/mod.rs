//! Scenario runner
//!
//! Reads declarative YAML scenarios (route fixtures plus an ordered list of
//! steps), drives a browser page through them and reports each check. The
//! page is reached only through [`crate::browser::BrowserPage`], so the whole
//! runner can be exercised against an in-memory page.

mod config;
mod report;
mod runner;
mod session;

pub use config::*;
pub use report::{Artifact, CheckOutcome, ScenarioResult};
pub use runner::{load_scenario, plan, run_scenario, run_with_page, RunOverrides, ScenarioPlan};
pub use session::{Interaction, Predicate, Session, SessionSettings, POLL_INTERVAL};
