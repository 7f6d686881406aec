//! # Billwise
//!
//! Binary entry point. All logic lives in `billwise_cli`.

use std::process::ExitCode;

use billwise_cli::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    billwise_cli::init_tracing();

    match billwise_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {}", err.message);
            err.exit_code()
        }
    }
}
