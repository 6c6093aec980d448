//! CLI command definitions
//!
//! Defines the clap commands for the scenario runner CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenario files against a freshly launched browser
    Run {
        /// Scenario YAML files, run in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Application under test (overrides scenario and config)
        #[arg(long)]
        base_url: Option<String>,

        /// Root directory for screenshots (default: verification)
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Abort a scenario on its first failed assertion
        #[arg(long)]
        fail_fast: bool,
    },

    /// Parse and validate scenario files without launching a browser
    Check {
        /// Scenario YAML files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
