use clap::Parser;
use dotenv::dotenv;
use rolodex_bot::prelude::{AppError, SessionEnd, command::Cli, run_app};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    dotenv().ok();

    // Replies go to stdout, diagnostics to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run_app(cli) {
        Ok(SessionEnd::Saved) => ExitCode::SUCCESS,
        Ok(SessionEnd::Unsaved) => ExitCode::FAILURE,
        Err(e @ AppError::Persistence(_)) => {
            eprintln!("Could not open the address book: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
