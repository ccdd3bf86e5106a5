use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    BatchDriver, CarSample, DriverRecord, LapRow, PitStop, PositionSample, RaceControlMessage,
    ReconciliationReport, ResultRow, SessionKey, TrackStatusEntry, UtcDateTime, WeatherSample,
};

/// Session-level facts shared by every consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub year: u16,
    /// Canonical event name as published upstream (e.g. "Japanese Grand Prix").
    pub event_name: String,
    pub location: String,
    pub country: String,
    pub round: Option<u32>,
    /// ISO-8601 calendar date of the session.
    pub date: String,
    pub start_time: Option<UtcDateTime>,
    pub live_session_key: Option<i64>,
}

/// Best-effort facts pulled from the live API for the resolved session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSupplement {
    pub pit_stops: Vec<PitStop>,
    pub weather: Vec<WeatherSample>,
    pub positions: Vec<PositionSample>,
}

/// Unified view of one session: batch tables, reconciled drivers and live extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    pub key: SessionKey,
    pub metadata: SessionMetadata,
    pub results: Vec<ResultRow>,
    pub laps: Option<Vec<LapRow>>,
    pub weather_data: Option<Vec<WeatherSample>>,
    /// Car telemetry per driver abbreviation.
    pub car_data: BTreeMap<String, Vec<CarSample>>,
    pub track_status: Option<Vec<TrackStatusEntry>>,
    pub race_control_messages: Option<Vec<RaceControlMessage>>,
    pub drivers_info: BTreeMap<String, BatchDriver>,
    pub reconciled_driver_map: BTreeMap<String, DriverRecord>,
    pub reconciliation: ReconciliationReport,
    pub live: LiveSupplement,
}

impl SessionBundle {
    pub fn driver(&self, abbreviation: &str) -> Option<&DriverRecord> {
        self.reconciled_driver_map.get(abbreviation)
    }
}

/// Classification access.
pub trait HasResults {
    fn results(&self) -> &[ResultRow];

    /// Batch-side driver identities, one per classified abbreviation.
    ///
    /// Codes are trimmed. Rows with an empty code are skipped; the first row
    /// wins when a code repeats.
    fn batch_drivers(&self) -> Vec<BatchDriver> {
        let mut seen = std::collections::BTreeSet::new();
        self.results()
            .iter()
            .map(|row| (row.abbreviation.trim(), row))
            .filter(|(code, _)| !code.is_empty() && seen.insert(*code))
            .map(|(code, row)| BatchDriver {
                abbreviation: code.to_owned(),
                full_name: row.full_name.clone(),
                car_number: row.driver_number,
                team_name: row.team_name.clone(),
            })
            .collect()
    }
}

pub trait HasLaps {
    fn laps(&self) -> Option<&[LapRow]>;
}

pub trait HasWeather {
    fn weather(&self) -> Option<&[WeatherSample]>;
}

/// Track-status timeline and race-control log.
pub trait HasRaceControl {
    fn track_status(&self) -> Option<&[TrackStatusEntry]>;
    fn race_control_messages(&self) -> Option<&[RaceControlMessage]>;
}

impl HasResults for SessionBundle {
    fn results(&self) -> &[ResultRow] {
        &self.results
    }
}

impl HasLaps for SessionBundle {
    fn laps(&self) -> Option<&[LapRow]> {
        self.laps.as_deref()
    }
}

impl HasWeather for SessionBundle {
    fn weather(&self) -> Option<&[WeatherSample]> {
        self.weather_data.as_deref()
    }
}

impl HasRaceControl for SessionBundle {
    fn track_status(&self) -> Option<&[TrackStatusEntry]> {
        self.track_status.as_deref()
    }

    fn race_control_messages(&self) -> Option<&[RaceControlMessage]> {
        self.race_control_messages.as_deref()
    }
}
