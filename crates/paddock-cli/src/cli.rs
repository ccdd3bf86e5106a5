//! CLI argument definitions for paddock.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `load` | Load a session (cache first) and print a summary |
//! | `validate` | Load a session and print the diagnostic report |
//! | `drivers` | Print the reconciled driver map |
//! | `cache list` | List cached sessions |
//! | `cache clear` | Remove one cached session, or all of them |
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).
//!
//! # Examples
//!
//! ```bash
//! paddock load 2025 Japan --session R
//! paddock validate 2025 "Great Britain" --force
//! paddock drivers 2025 Japan --format json --pretty
//! paddock cache clear 2025 Japan --session Q
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use paddock_core::SessionType;

#[derive(Debug, Parser)]
#[command(
    name = "paddock",
    author,
    version,
    about = "Load, reconcile and cache motorsport session data"
)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a session and print what was loaded.
    Load(SessionArgs),
    /// Load a session and report row counts and missing columns.
    Validate(SessionArgs),
    /// Print the reconciled driver/team map.
    Drivers(SessionArgs),
    /// Manage the on-disk session cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Season year.
    pub year: u16,

    /// Event hint, e.g. "Japan" or "Great Britain".
    pub event: String,

    /// Session code: FP1, FP2, FP3, SQ, S, Q or R.
    #[arg(long, short, default_value = "R", value_parser = parse_session_type)]
    pub session: SessionType,

    /// Skip the cache and fetch again.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached sessions.
    List,
    /// Remove one cached session, or every cached session when no year is given.
    Clear(CacheClearArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CacheClearArgs {
    #[arg(requires = "event")]
    pub year: Option<u16>,

    pub event: Option<String>,

    #[arg(long, short, default_value = "R", value_parser = parse_session_type)]
    pub session: SessionType,
}

fn parse_session_type(value: &str) -> Result<SessionType, String> {
    value.parse().map_err(|error: paddock_core::ValidationError| error.to_string())
}
