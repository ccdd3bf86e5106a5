use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::batch::{fetch_json, fetch_text};
use crate::data_source::SourceError;
use crate::domain::{
    parse_clock_seconds, RaceControlMessage, SessionType, TrackStatusEntry, WeatherSample,
};
use crate::http_client::HttpClient;
use crate::provider_policy::ProviderPolicy;
use crate::UtcDateTime;

/// Client for the static live-timing archive (`Index.json` plus `.jsonStream` feeds).
#[derive(Clone)]
pub struct TimingArchive {
    http: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
}

impl TimingArchive {
    pub fn new(http: Arc<dyn HttpClient>, policy: ProviderPolicy) -> Self {
        Self { http, policy }
    }

    /// Finds the archive folder of one session, e.g.
    /// `2025/2025-04-06_Japanese_Grand_Prix/2025-04-06_Race/`.
    pub async fn session_path(
        &self,
        year: u16,
        event_name: &str,
        location: &str,
        session_type: SessionType,
    ) -> Result<String, SourceError> {
        let index: WireIndex = fetch_json(
            self.http.as_ref(),
            &self.policy,
            &format!("{year}/Index.json"),
            &[],
        )
        .await?;

        let meeting = index
            .meetings
            .iter()
            .find(|meeting| meeting.name.eq_ignore_ascii_case(event_name))
            .or_else(|| {
                index
                    .meetings
                    .iter()
                    .find(|meeting| !location.is_empty() && meeting.location.eq_ignore_ascii_case(location))
            })
            .ok_or_else(|| {
                SourceError::session_not_found(format!(
                    "timing archive has no {year} meeting for '{event_name}'"
                ))
            })?;

        meeting
            .sessions
            .iter()
            .find(|session| session_matches(&session.name, session_type))
            .and_then(|session| session.path.clone())
            .ok_or_else(|| {
                SourceError::session_not_found(format!(
                    "timing archive has no {} for '{}'",
                    session_type.display_name(),
                    meeting.name
                ))
            })
    }

    pub async fn weather(&self, session_path: &str) -> Result<Vec<WeatherSample>, SourceError> {
        let body = self.stream(session_path, "WeatherData.jsonStream").await?;
        Ok(parse_weather_stream(&body))
    }

    pub async fn track_status(
        &self,
        session_path: &str,
    ) -> Result<Vec<TrackStatusEntry>, SourceError> {
        let body = self.stream(session_path, "TrackStatus.jsonStream").await?;
        Ok(parse_track_status_stream(&body))
    }

    pub async fn race_control(
        &self,
        session_path: &str,
    ) -> Result<Vec<RaceControlMessage>, SourceError> {
        let body = self.stream(session_path, "RaceControlMessages.jsonStream").await?;
        Ok(parse_race_control_stream(&body))
    }

    async fn stream(&self, session_path: &str, feed: &str) -> Result<String, SourceError> {
        let path = format!("{}/{feed}", session_path.trim_end_matches('/'));
        fetch_text(self.http.as_ref(), &self.policy, &path).await
    }
}

fn session_matches(name: &str, session_type: SessionType) -> bool {
    name.eq_ignore_ascii_case(session_type.display_name())
        || (session_type == SessionType::SprintQualifying
            && name.eq_ignore_ascii_case("Sprint Shootout"))
}

/// Splits `HH:MM:SS.mmm{json}` feed lines; lines that do not decode are skipped.
fn stream_entries<T: DeserializeOwned>(body: &str) -> Vec<(f64, T)> {
    let mut skipped = 0usize;
    let entries: Vec<(f64, T)> = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let decoded = line.find('{').and_then(|split| {
                let offset = parse_clock_seconds(&line[..split]).ok()?;
                let payload = serde_json::from_str(&line[split..]).ok()?;
                Some((offset, payload))
            });
            if decoded.is_none() {
                skipped += 1;
            }
            decoded
        })
        .collect();

    if skipped > 0 {
        debug!(skipped, "skipped undecodable timing feed lines");
    }
    entries
}

fn parse_weather_stream(body: &str) -> Vec<WeatherSample> {
    stream_entries::<WireWeather>(body)
        .into_iter()
        .map(|(offset, weather)| WeatherSample {
            session_time_s: Some(offset),
            timestamp: None,
            air_temp_c: number(weather.air_temp.as_deref()),
            track_temp_c: number(weather.track_temp.as_deref()),
            humidity_pct: number(weather.humidity.as_deref()),
            pressure_mbar: number(weather.pressure.as_deref()),
            rainfall: number(weather.rainfall.as_deref()).is_some_and(|value| value > 0.0),
            wind_speed_ms: number(weather.wind_speed.as_deref()),
            wind_direction_deg: number(weather.wind_direction.as_deref()),
        })
        .collect()
}

fn parse_track_status_stream(body: &str) -> Vec<TrackStatusEntry> {
    stream_entries::<WireTrackStatus>(body)
        .into_iter()
        .map(|(offset, entry)| TrackStatusEntry {
            session_time_s: offset,
            status: entry.status,
            message: entry.message,
        })
        .collect()
}

fn parse_race_control_stream(body: &str) -> Vec<RaceControlMessage> {
    stream_entries::<WireRaceControl>(body)
        .into_iter()
        .flat_map(|(offset, entry)| {
            let messages = match entry.messages {
                WireMessages::List(messages) => messages,
                WireMessages::Keyed(messages) => messages.into_values().collect(),
            };
            messages.into_iter().map(move |message| RaceControlMessage {
                timestamp: message
                    .utc
                    .as_deref()
                    .and_then(|utc| UtcDateTime::parse_assume_utc(utc).ok()),
                session_time_s: Some(offset),
                category: message.category,
                flag: message.flag,
                scope: message.scope,
                lap: message.lap,
                driver_number: message
                    .racing_number
                    .as_deref()
                    .and_then(|number| number.trim().parse().ok()),
                message: message.message,
            })
        })
        .collect()
}

fn number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireIndex {
    #[serde(rename = "Meetings", default)]
    meetings: Vec<WireMeeting>,
}

#[derive(Debug, Deserialize)]
struct WireMeeting {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(rename = "Sessions", default)]
    sessions: Vec<WireSession>,
}

#[derive(Debug, Deserialize)]
struct WireSession {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Path", default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireWeather {
    #[serde(default)]
    air_temp: Option<String>,
    #[serde(default)]
    track_temp: Option<String>,
    #[serde(default)]
    humidity: Option<String>,
    #[serde(default)]
    pressure: Option<String>,
    #[serde(default)]
    rainfall: Option<String>,
    #[serde(default)]
    wind_speed: Option<String>,
    #[serde(default)]
    wind_direction: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireTrackStatus {
    status: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireRaceControl {
    #[serde(rename = "Messages")]
    messages: WireMessages,
}

/// The first feed line carries a list; later lines key messages by sequence number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireMessages {
    List(Vec<WireMessage>),
    Keyed(BTreeMap<String, WireMessage>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireMessage {
    #[serde(default)]
    utc: Option<String>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    flag: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    lap: Option<u32>,
    #[serde(default)]
    racing_number: Option<String>,
    #[serde(default)]
    message: String,
}
