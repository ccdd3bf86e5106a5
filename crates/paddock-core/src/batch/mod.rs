//! # Batch Provider
//!
//! The mandatory primary source: classification, laps and the timing feeds
//! for one session, fetched in full.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BatchSource`] | Contract the facade loads from |
//! | [`HistoricalClient`] | Results archive plus timing archive |
//! | [`RawBatchSession`] | Unreconciled batch payload |

mod archive;
mod client;
mod timing;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;

use crate::data_source::SourceError;
use crate::domain::{
    CarSample, HasLaps, HasRaceControl, HasResults, HasWeather, LapRow, RaceControlMessage,
    ResultRow, SessionKey, SessionMetadata, TrackStatusEntry, WeatherSample,
};
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::retry::send_with_retry;

pub use archive::{ArchiveEvent, Classification, ResultsArchive};
pub use client::HistoricalClient;
pub use timing::TimingArchive;

/// Everything the batch provider knows about one session, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatchSession {
    pub metadata: SessionMetadata,
    pub results: Vec<ResultRow>,
    pub laps: Option<Vec<LapRow>>,
    pub weather: Option<Vec<WeatherSample>>,
    /// Telemetry per driver abbreviation; empty when the provider has none.
    pub car_data: BTreeMap<String, Vec<CarSample>>,
    pub track_status: Option<Vec<TrackStatusEntry>>,
    pub race_control_messages: Option<Vec<RaceControlMessage>>,
}

impl HasResults for RawBatchSession {
    fn results(&self) -> &[ResultRow] {
        &self.results
    }
}

impl HasLaps for RawBatchSession {
    fn laps(&self) -> Option<&[LapRow]> {
        self.laps.as_deref()
    }
}

impl HasWeather for RawBatchSession {
    fn weather(&self) -> Option<&[WeatherSample]> {
        self.weather.as_deref()
    }
}

impl HasRaceControl for RawBatchSession {
    fn track_status(&self) -> Option<&[TrackStatusEntry]> {
        self.track_status.as_deref()
    }

    fn race_control_messages(&self) -> Option<&[RaceControlMessage]> {
        self.race_control_messages.as_deref()
    }
}

/// Loads the full record set for one session.
///
/// Fails with `ProviderUnavailable` when the provider cannot be reached and
/// with `SessionNotFound` when the session does not exist upstream.
pub trait BatchSource: Send + Sync {
    fn load<'a>(
        &'a self,
        key: &'a SessionKey,
    ) -> Pin<Box<dyn Future<Output = Result<RawBatchSession, SourceError>> + Send + 'a>>;
}

/// GETs `path` under the policy's base URL and decodes the body.
///
/// A 404 maps to `SessionNotFound`; transport failures, other statuses and
/// undecodable bodies map to `ProviderUnavailable`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &dyn HttpClient,
    policy: &ProviderPolicy,
    path: &str,
    params: &[(&str, String)],
) -> Result<T, SourceError> {
    let request =
        HttpRequest::with_query(&policy.base_url, path, params).with_timeout(policy.timeout);
    let response = send_with_retry(http, &request, &policy.retry, policy.provider_id)
        .await
        .map_err(|error| {
            SourceError::provider_unavailable(format!("GET {} failed: {error}", request.url))
        })?;

    match response.status {
        200..=299 => {}
        404 => {
            return Err(SourceError::session_not_found(format!(
                "{} returned 404",
                request.url
            )))
        }
        status => {
            return Err(SourceError::provider_unavailable(format!(
                "{} returned status {status}",
                request.url
            )))
        }
    }

    // The timing archive prefixes its files with a UTF-8 byte order mark.
    let body = response.body.trim_start_matches('\u{feff}');
    serde_json::from_str(body).map_err(|error| {
        SourceError::provider_unavailable(format!("malformed response from {}: {error}", request.url))
    })
}

/// Like [`fetch_json`], returning the raw body for line-oriented feeds.
pub(crate) async fn fetch_text(
    http: &dyn HttpClient,
    policy: &ProviderPolicy,
    path: &str,
) -> Result<String, SourceError> {
    let request = HttpRequest::with_query(&policy.base_url, path, &[]).with_timeout(policy.timeout);
    let response = send_with_retry(http, &request, &policy.retry, policy.provider_id)
        .await
        .map_err(|error| {
            SourceError::provider_unavailable(format!("GET {} failed: {error}", request.url))
        })?;

    if response.status == 404 {
        return Err(SourceError::session_not_found(format!("{} returned 404", request.url)));
    }
    if !response.is_success() {
        return Err(SourceError::provider_unavailable(format!(
            "{} returned status {}",
            request.url, response.status
        )));
    }
    Ok(response.body.trim_start_matches('\u{feff}').to_owned())
}
