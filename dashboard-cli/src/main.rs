//! Binary crate for the `country-dashboard` terminal tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive country selection and configuration
//! - Rendering the dashboard to the terminal

use clap::Parser;
use log::LevelFilter;
use std::process::ExitCode;

mod cli;
mod terminal;

fn init_log(verbose: bool) {
    let my_code_level = if verbose {
        LevelFilter::Debug
    } else if cfg!(debug_assertions) {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter(None, LevelFilter::Warn)
        .filter(Some("dashboard_core"), my_code_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), my_code_level)
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    init_log(cmd.verbose);
    cmd.run().await
}
