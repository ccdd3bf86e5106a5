mod cache;
mod session;

use paddock_core::Context;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// What a command produced, in both renderings.
pub struct CommandOutput {
    pub data: Value,
    pub text: String,
}

impl CommandOutput {
    pub fn new(data: Value, text: impl Into<String>) -> Self {
        Self {
            data,
            text: text.into(),
        }
    }
}

pub async fn run(cli: &Cli, ctx: Context) -> Result<CommandOutput, CliError> {
    match &cli.command {
        Command::Load(args) => session::load(args, ctx).await,
        Command::Validate(args) => session::validate(args, ctx).await,
        Command::Drivers(args) => session::drivers(args, ctx).await,
        Command::Cache { command } => cache::run(command, &ctx),
    }
}
