use std::fmt::Write as _;

use paddock_core::{CacheStore, Context, SessionKey};
use serde_json::json;

use crate::cli::CacheCommand;
use crate::error::CliError;

use super::CommandOutput;

pub fn run(command: &CacheCommand, ctx: &Context) -> Result<CommandOutput, CliError> {
    let store = CacheStore::new(ctx.config.cache_dir.clone());
    match command {
        CacheCommand::List => list(&store),
        CacheCommand::Clear(args) => match (args.year, args.event.as_deref()) {
            (Some(year), Some(event)) => {
                let key = SessionKey::new(year, event, args.session)?;
                let removed = store.remove(&key)?;
                let text = if removed {
                    format!("removed {key}\n")
                } else {
                    format!("{key} was not cached\n")
                };
                Ok(CommandOutput::new(
                    json!({ "session": key, "removed": removed }),
                    text,
                ))
            }
            _ => {
                let removed = store.clear()?;
                Ok(CommandOutput::new(
                    json!({ "removed": removed }),
                    format!("removed {removed} cached sessions\n"),
                ))
            }
        },
    }
}

fn list(store: &CacheStore) -> Result<CommandOutput, CliError> {
    let files = store.list()?;
    let mut text = format!("{} ({} entries)\n", store.dir().display(), files.len());
    for file in &files {
        let _ = writeln!(text, "{:>10}  {}", file.size_bytes, file.file_name);
    }
    Ok(CommandOutput::new(
        json!({ "dir": store.dir(), "entries": files }),
        text,
    ))
}
