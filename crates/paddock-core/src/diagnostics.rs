//! Read-only health report over a loaded session. Nothing here repairs data.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::domain::{HasLaps, HasRaceControl, HasResults, HasWeather, SessionBundle};

/// Lap columns consumers rely on; a column is missing when no row carries it.
pub const KEY_LAP_COLUMNS: [&str; 4] = ["LapTime", "LapNumber", "Compound", "TyreLife"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    Warning,
    Missing,
}

impl CheckStatus {
    const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl DiagnosticCheck {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }

    fn counted(name: &'static str, count: Option<usize>, unit: &str) -> Self {
        match count {
            None => Self::new(name, CheckStatus::Missing, "not available"),
            Some(0) => Self::new(name, CheckStatus::Warning, format!("0 {unit}")),
            Some(count) => Self::new(name, CheckStatus::Ok, format!("{count} {unit}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    pub checks: Vec<DiagnosticCheck>,
}

impl DiagnosticReport {
    pub fn not_loaded() -> Self {
        Self {
            checks: vec![DiagnosticCheck::new(
                "session",
                CheckStatus::Missing,
                "no session loaded",
            )],
        }
    }

    pub fn for_bundle(bundle: &SessionBundle) -> Self {
        let metadata = &bundle.metadata;
        let mut checks = vec![DiagnosticCheck::new(
            "metadata",
            if metadata.event_name.is_empty() {
                CheckStatus::Missing
            } else {
                CheckStatus::Ok
            },
            format!(
                "{} ({}, {}) {}",
                metadata.event_name, metadata.location, metadata.date, bundle.key.session_type()
            ),
        )];

        let results = bundle.results().len();
        checks.push(if results == 0 {
            DiagnosticCheck::new("results", CheckStatus::Missing, "no classified entrants")
        } else {
            DiagnosticCheck::new("results", CheckStatus::Ok, format!("{results} rows"))
        });

        checks.push(lap_check(bundle));
        checks.push(lap_column_check(bundle));
        checks.push(DiagnosticCheck::counted(
            "drivers_info",
            Some(bundle.drivers_info.len()),
            "drivers",
        ));
        checks.push(if bundle.car_data.is_empty() {
            DiagnosticCheck::new("car_data", CheckStatus::Missing, "no telemetry")
        } else {
            let samples: usize = bundle.car_data.values().map(Vec::len).sum();
            DiagnosticCheck::new(
                "car_data",
                CheckStatus::Ok,
                format!("{} drivers, {samples} samples", bundle.car_data.len()),
            )
        });
        checks.push(DiagnosticCheck::counted(
            "weather",
            bundle.weather().map(<[_]>::len),
            "samples",
        ));
        checks.push(DiagnosticCheck::counted(
            "track_status",
            bundle.track_status().map(<[_]>::len),
            "entries",
        ));
        checks.push(DiagnosticCheck::counted(
            "race_control_messages",
            bundle.race_control_messages().map(<[_]>::len),
            "messages",
        ));

        let report = &bundle.reconciliation;
        checks.push(DiagnosticCheck::new(
            "reconciliation",
            if report.discrepant() > 0 {
                CheckStatus::Warning
            } else {
                CheckStatus::Ok
            },
            format!(
                "both={} batch_only={} live_only={} discrepant={}",
                report.both(),
                report.batch_only(),
                report.live_only(),
                report.discrepant()
            ),
        ));

        Self { checks }
    }

    pub fn check(&self, name: &str) -> Option<&DiagnosticCheck> {
        self.checks.iter().find(|check| check.name == name)
    }

    /// True when no check is `Missing`.
    pub fn is_complete(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status != CheckStatus::Missing)
    }
}

fn lap_check(bundle: &SessionBundle) -> DiagnosticCheck {
    match bundle.laps() {
        None => DiagnosticCheck::new("laps", CheckStatus::Missing, "not available"),
        Some([]) => DiagnosticCheck::new("laps", CheckStatus::Warning, "0 rows"),
        Some(laps) => {
            let drivers: BTreeSet<&str> = laps.iter().map(|lap| lap.driver.as_str()).collect();
            DiagnosticCheck::new(
                "laps",
                CheckStatus::Ok,
                format!("{} rows, {} drivers", laps.len(), drivers.len()),
            )
        }
    }
}

fn lap_column_check(bundle: &SessionBundle) -> DiagnosticCheck {
    let Some(laps) = bundle.laps().filter(|laps| !laps.is_empty()) else {
        return DiagnosticCheck::new("lap_columns", CheckStatus::Missing, "no lap rows");
    };

    let present = [
        laps.iter().any(|lap| lap.lap_time_s.is_some()),
        true,
        laps.iter().any(|lap| lap.compound.is_some()),
        laps.iter().any(|lap| lap.tyre_life.is_some()),
    ];
    let missing: Vec<&str> = KEY_LAP_COLUMNS
        .iter()
        .zip(present)
        .filter(|(_, present)| !present)
        .map(|(column, _)| *column)
        .collect();

    if missing.is_empty() {
        DiagnosticCheck::new("lap_columns", CheckStatus::Ok, "all key columns present")
    } else {
        DiagnosticCheck::new(
            "lap_columns",
            CheckStatus::Warning,
            format!("missing: {}", missing.join(", ")),
        )
    }
}

impl Display for DiagnosticReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for check in &self.checks {
            writeln!(
                f,
                "{:<8} {:<22} {}",
                check.status.label(),
                check.name,
                check.detail
            )?;
        }
        Ok(())
    }
}
