//! uiscenario - declarative API-mock and UI-assertion scenarios
//!
//! Runs YAML scenarios against a headless Chromium: network fixtures stand in
//! for the backend, steps drive the page and assertions check what renders.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use uiscenario::common::logging;
use uiscenario::{cli, commands};

#[derive(Parser)]
#[command(name = "uiscenario", about = "Browser scenarios with mocked APIs")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir, config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let guard = logging::init_cli(cli.verbose, cli.log_file.as_deref());

    let result = cli::dispatch(cli.command, cli.config.as_deref()).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        drop(guard);
        std::process::exit(1);
    }
}
