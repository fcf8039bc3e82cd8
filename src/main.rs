// src/main.rs

//! nb-runner
//!
//! Entry point for the nb-runner CLI.
//!
//! Responsibilities of this file:
//! - Load a local `.env` (for running outside CI)
//! - Parse CLI arguments and initialise logging
//! - Hand off execution to the runner
//! - Turn a failure into a workflow error annotation + non-zero exit
//!
//! There is intentionally *no business logic* here.

use clap::Parser;
use std::process::ExitCode;

use nb_runner::util::escape_workflow_data;
use nb_runner::{cli, logging, runner};

/// Program entry point.
///
/// Uses Tokio because the runner drives child processes and the
/// execute / watch tasks concurrently.
#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_level) {
        eprintln!("{:#}", e);
    }

    match runner::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("::error::{}", escape_workflow_data(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}
