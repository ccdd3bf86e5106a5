mod cli;
mod commands;
mod error;

use std::process::ExitCode;

use clap::Parser;
use paddock_core::Context;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, OutputFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = Context::from_env()?;

    let output = commands::run(&cli, ctx).await?;
    match cli.format {
        OutputFormat::Text => print!("{}", output.text),
        OutputFormat::Json if cli.pretty => {
            println!("{}", serde_json::to_string_pretty(&output.data)?)
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&output.data)?),
    }
    Ok(())
}
