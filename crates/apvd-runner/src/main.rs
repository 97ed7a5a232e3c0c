//! Main entry point for the Apvd batch approval runner.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use apvd_common::ApvdError;
use apvd_runner::{Cli, Configuration, Runner, startup};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let configuration = Configuration::load(&cli.global)?;

    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let runner = Runner::connect(&configuration)?;
    match runner.run(cli.command).await {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(e) => {
            match e.downcast_ref::<ApvdError>() {
                Some(apvd_error) => {
                    let code = apvd_error.error_code();
                    error!(code = code.code, kind = code.message, "Runner failed: {}", apvd_error);
                }
                None => error!("Runner failed: {:#}", e),
            }
            Err(e.into())
        }
    }
}
