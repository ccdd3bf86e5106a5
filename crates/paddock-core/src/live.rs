//! Typed access to the live REST API.
//!
//! Every call is throttled and retried per [`ProviderPolicy`]. [`LiveApiClient::request`]
//! never fails: exhausted retries, an open circuit, unexpected statuses and
//! unparsable bodies all come back as an empty list. The typed wrappers keep
//! the [`SourceError`] so callers can record which endpoint degraded.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::context::Context;
use crate::data_source::{Endpoint, SourceError};
use crate::domain::{CarSample, LiveDriver, PitStop, PositionSample, SessionType, WeatherSample};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::retry::send_with_retry;
use crate::UtcDateTime;

/// One entry of the live API's `sessions` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSession {
    pub session_key: i64,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub session_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub date_start: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub meeting_key: Option<i64>,
}

impl LiveSession {
    /// Whether this entry is the given session of its weekend.
    pub fn is(&self, session_type: SessionType) -> bool {
        let name = self.session_name.trim();
        if name.is_empty() {
            return session_type == SessionType::Race && self.session_type.eq_ignore_ascii_case("Race");
        }
        name.eq_ignore_ascii_case(session_type.display_name())
            || (session_type == SessionType::SprintQualifying
                && name.eq_ignore_ascii_case("Sprint Shootout"))
    }
}

pub struct LiveApiClient {
    http: Arc<dyn HttpClient>,
    policy: ProviderPolicy,
    breaker: CircuitBreaker,
}

impl LiveApiClient {
    pub fn new(http: Arc<dyn HttpClient>, policy: ProviderPolicy) -> Self {
        Self {
            http,
            policy,
            breaker: CircuitBreaker::default(),
        }
    }

    pub fn from_context(ctx: &Context) -> Self {
        Self::new(ctx.http.clone(), ctx.config.live.clone())
    }

    /// Opens the circuit after `trip_after` consecutive exhausted requests.
    pub fn with_trip_after(mut self, trip_after: u32) -> Self {
        self.breaker = CircuitBreaker::new(trip_after);
        self
    }

    /// Forgets failures from an earlier load.
    pub fn reset_circuit(&self) {
        self.breaker.reset();
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Raw records of one endpoint; an empty list whenever the call fails.
    pub async fn request(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Vec<Value> {
        match self.fetch(endpoint, params).await {
            Ok(records) => records,
            Err(error) => {
                warn!(
                    endpoint = %endpoint,
                    code = error.code(),
                    error = %error,
                    "live request failed; continuing with an empty list"
                );
                Vec::new()
            }
        }
    }

    /// Raw records of one endpoint, keeping the failure.
    ///
    /// A 404 is the API's "no results" answer and yields `Ok(vec![])`.
    pub async fn fetch(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
    ) -> Result<Vec<Value>, SourceError> {
        if self.breaker.is_open() {
            return Err(SourceError::api_error(format!(
                "live circuit open; skipped '{endpoint}'"
            )));
        }

        let request = HttpRequest::with_query(&self.policy.base_url, endpoint.as_str(), params)
            .with_timeout(self.policy.timeout);
        let response =
            match send_with_retry(self.http.as_ref(), &request, &self.policy.retry, self.policy.provider_id)
                .await
            {
                Ok(response) => response,
                Err(error) => {
                    if self.breaker.record_exhausted() {
                        warn!(
                            endpoint = %endpoint,
                            exhausted = self.breaker.trip_after(),
                            "live API looks down; refusing further requests this load"
                        );
                    }
                    return Err(SourceError::from_live_transport(endpoint, &error));
                }
            };
        self.breaker.record_answered();

        if response.status == 404 {
            debug!(endpoint = %endpoint, "live API has no records");
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(SourceError::api_error(format!(
                "live endpoint '{endpoint}' returned status {}",
                response.status
            )));
        }

        serde_json::from_str::<Vec<Value>>(&response.body).map_err(|error| {
            SourceError::api_error(format!("live endpoint '{endpoint}' returned an unparsable body: {error}"))
        })
    }

    pub async fn sessions(&self, year: u16) -> Result<Vec<LiveSession>, SourceError> {
        let records = self
            .fetch(Endpoint::Sessions, &[("year", year.to_string())])
            .await?;
        Ok(decode(Endpoint::Sessions, records))
    }

    pub async fn drivers(&self, session_key: i64) -> Result<Vec<LiveDriver>, SourceError> {
        let records = self
            .fetch(Endpoint::Drivers, &session_params(session_key, None))
            .await?;
        Ok(decode::<WireDriver>(Endpoint::Drivers, records)
            .into_iter()
            .map(|driver| LiveDriver {
                driver_number: driver.driver_number,
                abbreviation: driver.name_acronym.unwrap_or_default().trim().to_owned(),
                full_name: driver.full_name.unwrap_or_default(),
                team_name: driver.team_name.unwrap_or_default(),
                team_color: driver.team_colour.unwrap_or_default(),
                country_code: driver.country_code.unwrap_or_default(),
            })
            .collect())
    }

    pub async fn pit_stops(&self, session_key: i64) -> Result<Vec<PitStop>, SourceError> {
        let records = self
            .fetch(Endpoint::Pit, &session_params(session_key, None))
            .await?;
        Ok(decode::<WirePit>(Endpoint::Pit, records)
            .into_iter()
            .map(|stop| PitStop {
                timestamp: timestamp(stop.date.as_deref()),
                driver_number: stop.driver_number,
                abbreviation: None,
                lap_number: stop.lap_number,
                pit_duration_s: stop.pit_duration,
            })
            .collect())
    }

    pub async fn weather(&self, session_key: i64) -> Result<Vec<WeatherSample>, SourceError> {
        let records = self
            .fetch(Endpoint::Weather, &session_params(session_key, None))
            .await?;
        Ok(decode::<WireWeather>(Endpoint::Weather, records)
            .into_iter()
            .map(|sample| WeatherSample {
                session_time_s: None,
                timestamp: timestamp(sample.date.as_deref()),
                air_temp_c: sample.air_temperature,
                track_temp_c: sample.track_temperature,
                humidity_pct: sample.humidity,
                pressure_mbar: sample.pressure,
                rainfall: sample.rainfall.is_some_and(|value| value > 0.0),
                wind_speed_ms: sample.wind_speed,
                wind_direction_deg: sample.wind_direction,
            })
            .collect())
    }

    /// Car telemetry grouped by driver number.
    pub async fn car_data(
        &self,
        session_key: i64,
        driver_number: Option<u32>,
    ) -> Result<BTreeMap<u32, Vec<CarSample>>, SourceError> {
        let records = self
            .fetch(Endpoint::CarData, &session_params(session_key, driver_number))
            .await?;
        let mut by_driver: BTreeMap<u32, Vec<CarSample>> = BTreeMap::new();
        for sample in decode::<WireCarData>(Endpoint::CarData, records) {
            by_driver
                .entry(sample.driver_number)
                .or_default()
                .push(CarSample {
                    timestamp: timestamp(sample.date.as_deref()),
                    session_time_s: None,
                    speed_kph: sample.speed,
                    rpm: sample.rpm,
                    gear: sample.n_gear,
                    throttle_pct: sample.throttle,
                    brake: sample.brake,
                    drs: sample.drs,
                });
        }
        Ok(by_driver)
    }

    pub async fn positions(
        &self,
        session_key: i64,
        driver_number: Option<u32>,
    ) -> Result<Vec<PositionSample>, SourceError> {
        let records = self
            .fetch(Endpoint::Position, &session_params(session_key, driver_number))
            .await?;
        Ok(decode::<WirePosition>(Endpoint::Position, records)
            .into_iter()
            .map(|sample| PositionSample {
                timestamp: timestamp(sample.date.as_deref()),
                driver_number: sample.driver_number,
                abbreviation: None,
                position: sample.position,
            })
            .collect())
    }
}

fn session_params(session_key: i64, driver_number: Option<u32>) -> Vec<(&'static str, String)> {
    let mut params = vec![("session_key", session_key.to_string())];
    if let Some(number) = driver_number {
        params.push(("driver_number", number.to_string()));
    }
    params
}

/// Keeps the records that match the expected shape.
fn decode<T: DeserializeOwned>(endpoint: Endpoint, records: Vec<Value>) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .filter_map(|record| serde_json::from_value(record).ok())
        .collect();
    if decoded.len() < total {
        debug!(
            endpoint = %endpoint,
            skipped = total - decoded.len(),
            "dropped live records with an unexpected shape"
        );
    }
    decoded
}

fn timestamp(value: Option<&str>) -> Option<UtcDateTime> {
    value.and_then(|value| UtcDateTime::parse_assume_utc(value).ok())
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct WireDriver {
    #[serde(default)]
    driver_number: Option<u32>,
    #[serde(default)]
    name_acronym: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    team_colour: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePit {
    #[serde(default)]
    date: Option<String>,
    driver_number: u32,
    #[serde(default)]
    lap_number: Option<u32>,
    #[serde(default)]
    pit_duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireWeather {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    air_temperature: Option<f64>,
    #[serde(default)]
    track_temperature: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    pressure: Option<f64>,
    #[serde(default)]
    rainfall: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    wind_direction: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireCarData {
    #[serde(default)]
    date: Option<String>,
    driver_number: u32,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    rpm: Option<f64>,
    #[serde(default)]
    n_gear: Option<u8>,
    #[serde(default)]
    throttle: Option<f64>,
    #[serde(default)]
    brake: Option<f64>,
    #[serde(default)]
    drs: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct WirePosition {
    #[serde(default)]
    date: Option<String>,
    driver_number: u32,
    position: u32,
}
