mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, OutputFormat};
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ferrocast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(exit_code = error.exit_code(), "command failed");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let started = Instant::now();
    match commands::run(cli).await {
        Ok(envelope) => output::render(&envelope, cli.format, cli.pretty),
        Err(error) if cli.format == OutputFormat::Json => {
            let envelope = commands::failure(cli, &error, started)?;
            output::render(&envelope, cli.format, cli.pretty)?;
            Err(error)
        }
        Err(error) => Err(error),
    }
}
