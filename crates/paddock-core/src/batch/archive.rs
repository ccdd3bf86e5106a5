use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::batch::fetch_json;
use crate::data_source::SourceError;
use crate::domain::{parse_clock_seconds, LapRow, ResultRow, SessionMetadata, SessionType};
use crate::http_client::HttpClient;
use crate::provider_policy::ProviderPolicy;
use crate::UtcDateTime;

const LAP_PAGE_SIZE: usize = 100;
const MAX_LAP_PAGES: usize = 60;

/// One calendar entry of the results archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEvent {
    pub round: u32,
    pub race_name: String,
    pub circuit_name: String,
    pub locality: String,
    pub country: String,
    slots: BTreeMap<SessionType, (String, Option<String>)>,
}

impl ArchiveEvent {
    pub fn metadata(&self, year: u16, session_type: SessionType) -> SessionMetadata {
        let (date, time) = self
            .slots
            .get(&session_type)
            .or_else(|| self.slots.get(&SessionType::Race))
            .cloned()
            .unwrap_or_default();
        let start_time = time
            .as_deref()
            .and_then(|time| UtcDateTime::parse_assume_utc(&format!("{date}T{}", time.trim_end_matches('Z'))).ok());

        SessionMetadata {
            year,
            event_name: self.race_name.clone(),
            location: self.locality.clone(),
            country: self.country.clone(),
            round: Some(self.round),
            date,
            start_time,
            live_session_key: None,
        }
    }
}

/// Classification rows plus the archive's driver id → abbreviation map,
/// which the lap feed needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub rows: Vec<ResultRow>,
    pub driver_codes: BTreeMap<String, String>,
}

/// Client for the Ergast-compatible results archive.
#[derive(Clone)]
pub struct ResultsArchive {
    http: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
}

impl ResultsArchive {
    pub fn new(http: Arc<dyn HttpClient>, policy: ProviderPolicy) -> Self {
        Self { http, policy }
    }

    /// Resolves an event hint against the season calendar.
    pub async fn find_event(&self, year: u16, hint: &str) -> Result<ArchiveEvent, SourceError> {
        let envelope: MrEnvelope = fetch_json(
            self.http.as_ref(),
            &self.policy,
            &format!("{year}.json"),
            &[("limit", String::from("100"))],
        )
        .await?;

        let races = envelope.data.race_table.races;
        match_event(&races, hint).map(to_event).ok_or_else(|| {
            SourceError::session_not_found(format!(
                "no {year} event matches '{hint}' in the results archive"
            ))
        })
    }

    pub async fn classification(
        &self,
        year: u16,
        round: u32,
        session_type: SessionType,
    ) -> Result<Classification, SourceError> {
        let resource = match session_type {
            SessionType::Race => "results",
            SessionType::Sprint => "sprint",
            SessionType::Qualifying => "qualifying",
            other => {
                return Err(SourceError::session_not_found(format!(
                    "the results archive publishes no classification for {}",
                    other.display_name()
                )))
            }
        };

        let envelope: MrEnvelope = fetch_json(
            self.http.as_ref(),
            &self.policy,
            &format!("{year}/{round}/{resource}.json"),
            &[("limit", String::from("100"))],
        )
        .await?;

        let race = envelope.data.race_table.races.into_iter().next();
        let mut driver_codes = BTreeMap::new();
        let rows: Vec<ResultRow> = match race {
            Some(race) if session_type == SessionType::Qualifying => race
                .qualifying_results
                .into_iter()
                .map(|entry| {
                    driver_codes.insert(entry.driver.driver_id.clone(), entry.driver.code());
                    qualifying_row(entry)
                })
                .collect(),
            Some(race) => {
                let entries = if session_type == SessionType::Sprint {
                    race.sprint_results
                } else {
                    race.results
                };
                entries
                    .into_iter()
                    .map(|entry| {
                        driver_codes.insert(entry.driver.driver_id.clone(), entry.driver.code());
                        result_row(entry)
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        if rows.is_empty() {
            return Err(SourceError::session_not_found(format!(
                "{year} round {round} has no {} classification yet",
                session_type.display_name()
            )));
        }

        Ok(Classification { rows, driver_codes })
    }

    /// Lap-by-lap timings, walked page by page.
    pub async fn laps(
        &self,
        year: u16,
        round: u32,
        driver_codes: &BTreeMap<String, String>,
    ) -> Result<Vec<LapRow>, SourceError> {
        let path = format!("{year}/{round}/laps.json");
        let mut rows = Vec::new();
        let mut offset = 0;

        for _ in 0..MAX_LAP_PAGES {
            let envelope: MrEnvelope = fetch_json(
                self.http.as_ref(),
                &self.policy,
                &path,
                &[
                    ("limit", LAP_PAGE_SIZE.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;

            let total = envelope
                .data
                .total
                .as_deref()
                .and_then(|total| total.parse::<usize>().ok())
                .unwrap_or(0);
            let before = rows.len();
            for race in envelope.data.race_table.races {
                for lap in race.laps {
                    let Ok(lap_number) = lap.number.parse::<u32>() else {
                        continue;
                    };
                    rows.extend(lap.timings.into_iter().map(|timing| LapRow {
                        driver: driver_codes
                            .get(&timing.driver_id)
                            .cloned()
                            .unwrap_or_else(|| timing.driver_id.to_uppercase()),
                        lap_number,
                        lap_time_s: parse_clock_seconds(&timing.time).ok(),
                        position: parse_number(timing.position.as_deref()),
                        compound: None,
                        tyre_life: None,
                    }));
                }
            }

            offset += LAP_PAGE_SIZE;
            if rows.len() == before || offset >= total {
                break;
            }
        }

        debug!(year, round, rows = rows.len(), "fetched lap timings");
        Ok(rows)
    }
}

/// Race-name matches win over locality, country and circuit matches; within
/// a tier the earliest round is taken.
fn match_event<'a>(races: &'a [WireRace], hint: &str) -> Option<&'a WireRace> {
    let hint = hint.trim().to_lowercase();
    if hint.is_empty() {
        return None;
    }

    races
        .iter()
        .find(|race| race.race_name.to_lowercase().contains(&hint))
        .or_else(|| {
            races.iter().find(|race| {
                [
                    &race.circuit.location.locality,
                    &race.circuit.location.country,
                    &race.circuit.circuit_name,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&hint))
            })
        })
}

fn to_event(race: &WireRace) -> ArchiveEvent {
    let mut slots = BTreeMap::new();
    slots.insert(SessionType::Race, (race.date.clone(), race.time.clone()));
    let extra = [
        (SessionType::Practice1, &race.first_practice),
        (SessionType::Practice2, &race.second_practice),
        (SessionType::Practice3, &race.third_practice),
        (SessionType::Qualifying, &race.qualifying),
        (SessionType::Sprint, &race.sprint),
        (SessionType::SprintQualifying, &race.sprint_qualifying),
    ];
    for (session_type, slot) in extra {
        if let Some(slot) = slot {
            slots.insert(session_type, (slot.date.clone(), slot.time.clone()));
        }
    }

    ArchiveEvent {
        round: race.round.parse().unwrap_or_default(),
        race_name: race.race_name.clone(),
        circuit_name: race.circuit.circuit_name.clone(),
        locality: race.circuit.location.locality.clone(),
        country: race.circuit.location.country.clone(),
        slots,
    }
}

fn result_row(entry: WireResult) -> ResultRow {
    ResultRow {
        position: parse_number(entry.position.as_deref()),
        abbreviation: entry.driver.code(),
        driver_number: parse_number(entry.number.as_deref())
            .or_else(|| parse_number(entry.driver.permanent_number.as_deref())),
        full_name: entry.driver.full_name(),
        team_name: entry.constructor.map(|team| team.name).unwrap_or_default(),
        grid: parse_number(entry.grid.as_deref()),
        laps_completed: parse_number(entry.laps.as_deref()),
        status: entry.status.unwrap_or_default(),
        points: entry
            .points
            .as_deref()
            .and_then(|points| points.parse().ok())
            .unwrap_or(0.0),
        race_time_s: entry
            .time
            .and_then(|time| time.millis)
            .and_then(|millis| millis.parse::<f64>().ok())
            .map(|millis| millis / 1000.0),
        q1_s: None,
        q2_s: None,
        q3_s: None,
    }
}

fn qualifying_row(entry: WireQualifying) -> ResultRow {
    let lap = |value: Option<String>| value.and_then(|value| parse_clock_seconds(&value).ok());
    ResultRow {
        position: parse_number(entry.position.as_deref()),
        abbreviation: entry.driver.code(),
        driver_number: parse_number(entry.number.as_deref())
            .or_else(|| parse_number(entry.driver.permanent_number.as_deref())),
        full_name: entry.driver.full_name(),
        team_name: entry.constructor.map(|team| team.name).unwrap_or_default(),
        grid: None,
        laps_completed: None,
        status: String::new(),
        points: 0.0,
        race_time_s: None,
        q1_s: lap(entry.q1),
        q2_s: lap(entry.q2),
        q3_s: lap(entry.q3),
    }
}

fn parse_number(value: Option<&str>) -> Option<u32> {
    value.and_then(|value| value.trim().parse().ok())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MrEnvelope {
    #[serde(rename = "MRData")]
    data: MrData,
}

#[derive(Debug, Deserialize)]
struct MrData {
    #[serde(default)]
    total: Option<String>,
    #[serde(rename = "RaceTable")]
    race_table: WireRaceTable,
}

#[derive(Debug, Deserialize)]
struct WireRaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<WireRace>,
}

#[derive(Debug, Deserialize)]
struct WireRace {
    round: String,
    #[serde(rename = "raceName")]
    race_name: String,
    #[serde(rename = "Circuit")]
    circuit: WireCircuit,
    date: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(rename = "FirstPractice", default)]
    first_practice: Option<WireSlot>,
    #[serde(rename = "SecondPractice", default)]
    second_practice: Option<WireSlot>,
    #[serde(rename = "ThirdPractice", default)]
    third_practice: Option<WireSlot>,
    #[serde(rename = "Qualifying", default)]
    qualifying: Option<WireSlot>,
    #[serde(rename = "Sprint", default)]
    sprint: Option<WireSlot>,
    #[serde(rename = "SprintQualifying", alias = "SprintShootout", default)]
    sprint_qualifying: Option<WireSlot>,
    #[serde(rename = "Results", default)]
    results: Vec<WireResult>,
    #[serde(rename = "SprintResults", default)]
    sprint_results: Vec<WireResult>,
    #[serde(rename = "QualifyingResults", default)]
    qualifying_results: Vec<WireQualifying>,
    #[serde(rename = "Laps", default)]
    laps: Vec<WireLap>,
}

#[derive(Debug, Deserialize)]
struct WireCircuit {
    #[serde(rename = "circuitName", default)]
    circuit_name: String,
    #[serde(rename = "Location")]
    location: WireLocation,
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    #[serde(default)]
    locality: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct WireSlot {
    date: String,
    #[serde(default)]
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDriver {
    #[serde(rename = "driverId")]
    driver_id: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "permanentNumber", default)]
    permanent_number: Option<String>,
    #[serde(rename = "givenName", default)]
    given_name: String,
    #[serde(rename = "familyName", default)]
    family_name: String,
}

impl WireDriver {
    /// Three-letter code; pre-2014 entrants without one get a derived code.
    fn code(&self) -> String {
        match self.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_owned(),
            _ => self
                .family_name
                .chars()
                .filter(char::is_ascii_alphabetic)
                .take(3)
                .collect::<String>()
                .to_ascii_uppercase(),
        }
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
            .trim()
            .to_owned()
    }
}

#[derive(Debug, Deserialize)]
struct WireConstructor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireTime {
    #[serde(default)]
    millis: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    points: Option<String>,
    #[serde(rename = "Driver")]
    driver: WireDriver,
    #[serde(rename = "Constructor", default)]
    constructor: Option<WireConstructor>,
    #[serde(default)]
    grid: Option<String>,
    #[serde(default)]
    laps: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "Time", default)]
    time: Option<WireTime>,
}

#[derive(Debug, Deserialize)]
struct WireQualifying {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(rename = "Driver")]
    driver: WireDriver,
    #[serde(rename = "Constructor", default)]
    constructor: Option<WireConstructor>,
    #[serde(rename = "Q1", default)]
    q1: Option<String>,
    #[serde(rename = "Q2", default)]
    q2: Option<String>,
    #[serde(rename = "Q3", default)]
    q3: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireLap {
    number: String,
    #[serde(rename = "Timings", default)]
    timings: Vec<WireTiming>,
}

#[derive(Debug, Deserialize)]
struct WireTiming {
    #[serde(rename = "driverId")]
    driver_id: String,
    #[serde(default)]
    position: Option<String>,
    time: String,
}
