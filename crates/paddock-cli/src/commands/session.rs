use std::fmt::Write as _;

use paddock_core::{Context, DataAccess, HasLaps, HasRaceControl, HasWeather, Provenance};
use serde_json::json;

use crate::cli::SessionArgs;
use crate::error::CliError;

use super::CommandOutput;

async fn open(args: &SessionArgs, ctx: Context) -> Result<DataAccess, CliError> {
    let mut data = DataAccess::new(ctx);
    if data.load(args.year, &args.event, args.session, args.force).await {
        Ok(data)
    } else {
        Err(CliError::LoadFailed {
            session: format!("{} {} {}", args.year, args.event, args.session),
        })
    }
}

pub async fn load(args: &SessionArgs, ctx: Context) -> Result<CommandOutput, CliError> {
    let data = open(args, ctx).await?;
    let bundle = data.loaded_data()?;
    let outcome = data.last_outcome();
    let report = bundle.reconciliation;

    let payload = json!({
        "session": bundle.key,
        "metadata": bundle.metadata,
        "outcome": outcome,
        "reconciliation": report,
        "rows": {
            "results": bundle.results.len(),
            "laps": bundle.laps().map(<[_]>::len),
            "weather": bundle.weather().map(<[_]>::len),
            "track_status": bundle.track_status().map(<[_]>::len),
            "race_control_messages": bundle.race_control_messages().map(<[_]>::len),
            "car_data_drivers": bundle.car_data.len(),
            "pit_stops": bundle.live.pit_stops.len(),
        },
    });

    let mut text = String::new();
    let metadata = &bundle.metadata;
    let _ = writeln!(
        text,
        "{} ({}, {}) {}",
        metadata.event_name, metadata.location, metadata.date, bundle.key.session_type()
    );
    if let Some(outcome) = outcome {
        let chain: Vec<&str> = outcome.source_chain.iter().map(|p| p.as_str()).collect();
        let _ = writeln!(
            text,
            "sources: {}{} in {} ms",
            chain.join(" -> "),
            if outcome.cache_hit { " (cache hit)" } else { "" },
            outcome.latency_ms
        );
        for warning in &outcome.warnings {
            let _ = writeln!(text, "warning: {warning}");
        }
    }
    let _ = writeln!(
        text,
        "drivers: {} both, {} batch-only, {} live-only, {} discrepant",
        report.both(),
        report.batch_only(),
        report.live_only(),
        report.discrepant()
    );

    Ok(CommandOutput::new(payload, text))
}

pub async fn validate(args: &SessionArgs, ctx: Context) -> Result<CommandOutput, CliError> {
    let data = open(args, ctx).await?;
    let report = data.validate();
    Ok(CommandOutput::new(serde_json::to_value(&report)?, report.to_string()))
}

pub async fn drivers(args: &SessionArgs, ctx: Context) -> Result<CommandOutput, CliError> {
    let data = open(args, ctx).await?;
    let bundle = data.loaded_data()?;

    let mut text = String::new();
    for (code, driver) in &bundle.reconciled_driver_map {
        let provenance = match driver.provenance {
            Provenance::Both => "both",
            Provenance::BatchOnly => "batch",
            Provenance::LiveOnly => "live",
        };
        let number = driver
            .car_number
            .map(|number| number.to_string())
            .unwrap_or_else(|| String::from("-"));
        let _ = write!(
            text,
            "{code:<4} {number:>3}  {:<24} {:<28} {provenance}",
            driver.full_name, driver.team_name_reconciled
        );
        if driver.has_discrepancy {
            let _ = write!(text, "  (live: {})", driver.team_name_live);
        }
        text.push('\n');
    }

    Ok(CommandOutput::new(
        serde_json::to_value(&bundle.reconciled_driver_map)?,
        text,
    ))
}
