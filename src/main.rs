mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod manifest;
mod output;
mod providers;
mod substitutions;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use log::{debug, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    logging::init(cli.verbose);
    output::print_banner();

    info!("Starting gcbmgr {}", env!("CARGO_PKG_VERSION"));
    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Exiting after error: {e:#}");
            eprintln!("{} {e:#}", output::failure("Error:"));
            ExitCode::FAILURE
        }
    }
}
