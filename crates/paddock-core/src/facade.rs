//! The object every consumer holds: load once, then read the unified bundle.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::batch::{BatchSource, HistoricalClient, RawBatchSession};
use crate::cache::CacheStore;
use crate::context::Context;
use crate::data_source::SourceError;
use crate::diagnostics::DiagnosticReport;
use crate::domain::{
    BatchDriver, CarSample, HasResults, LiveDriver, LiveSupplement, SessionBundle, SessionKey,
    SessionType,
};
use crate::live::{LiveApiClient, LiveSession};
use crate::locator::SessionLocator;
use crate::reconcile::ReconciliationEngine;
use crate::{CoreError, ProviderId};

/// How the last `load()` went, for auditing without reading logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub cache_hit: bool,
    /// Sources that contributed data, in the order they were consulted.
    pub source_chain: Vec<ProviderId>,
    /// One line per recoverable failure and the fallback taken.
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

pub struct DataAccess {
    ctx: Context,
    batch: Box<dyn BatchSource>,
    live: LiveApiClient,
    cache: CacheStore,
    engine: ReconciliationEngine,
    bundle: Option<SessionBundle>,
    last_outcome: Option<LoadOutcome>,
}

impl DataAccess {
    pub fn new(ctx: Context) -> Self {
        let batch = Box::new(HistoricalClient::from_context(&ctx));
        Self::with_batch_source(ctx, batch)
    }

    /// Uses `batch` instead of the archive-backed client.
    pub fn with_batch_source(ctx: Context, batch: Box<dyn BatchSource>) -> Self {
        Self {
            live: LiveApiClient::from_context(&ctx),
            cache: CacheStore::new(ctx.config.cache_dir.clone()),
            engine: ReconciliationEngine,
            bundle: None,
            last_outcome: None,
            batch,
            ctx,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Loads one session, from cache unless `force_reload`.
    ///
    /// Returns `false` only when the key is invalid or the batch provider
    /// fails; live-side trouble degrades to batch-only data. The held bundle
    /// is replaced on success and dropped on failure.
    pub async fn load(
        &mut self,
        year: u16,
        event: &str,
        session_type: SessionType,
        force_reload: bool,
    ) -> bool {
        let started = Instant::now();
        let key = match SessionKey::new(year, event, session_type) {
            Ok(key) => key,
            Err(error) => {
                warn!(year, event, error = %error, "rejected load request");
                self.finish(None, false, Vec::new(), vec![error.to_string()], started);
                return false;
            }
        };

        if force_reload {
            info!(session = %key, "forced reload; skipping cache");
        } else if let Some(bundle) = self.cache.load(&key) {
            info!(session = %key, "loaded session from cache");
            self.finish(Some(bundle), true, vec![ProviderId::Cache], Vec::new(), started);
            return true;
        }

        let mut warnings = Vec::new();
        let raw = match self.batch.load(&key).await {
            Ok(raw) => raw,
            Err(error) => {
                error!(
                    session = %key,
                    code = error.code(),
                    error = %error,
                    "batch provider failed; load aborted"
                );
                warnings.push(format!("batch: {error}"));
                self.finish(None, false, Vec::new(), warnings, started);
                return false;
            }
        };

        let mut source_chain = vec![ProviderId::Archive];
        let bundle = self.assemble(&key, raw, &mut source_chain, &mut warnings).await;

        if !self.cache.save(&key, &bundle) {
            warnings.push(String::from("cache: write failed; bundle kept in memory only"));
        }
        info!(
            session = %key,
            both = bundle.reconciliation.both(),
            batch_only = bundle.reconciliation.batch_only(),
            live_only = bundle.reconciliation.live_only(),
            discrepant = bundle.reconciliation.discrepant(),
            "session loaded"
        );
        self.finish(Some(bundle), false, source_chain, warnings, started);
        true
    }

    /// The bundle of the last successful `load()`.
    pub fn loaded_data(&self) -> Result<&SessionBundle, CoreError> {
        self.bundle.as_ref().ok_or(CoreError::NotLoaded)
    }

    pub fn validate(&self) -> DiagnosticReport {
        self.bundle
            .as_ref()
            .map_or_else(DiagnosticReport::not_loaded, DiagnosticReport::for_bundle)
    }

    pub fn last_outcome(&self) -> Option<&LoadOutcome> {
        self.last_outcome.as_ref()
    }

    async fn assemble(
        &self,
        key: &SessionKey,
        raw: RawBatchSession,
        source_chain: &mut Vec<ProviderId>,
        warnings: &mut Vec<String>,
    ) -> SessionBundle {
        self.live.reset_circuit();
        let locator = SessionLocator::new(&self.live, &self.ctx.aliases);
        let session = locator
            .resolve_session(key.year(), key.event_name(), key.session_type())
            .await;

        let batch_drivers = raw.batch_drivers();
        let (live_drivers, mut supplement, live_car_data) = match &session {
            Some(session) => {
                self.fetch_live(session, &batch_drivers, raw.car_data.is_empty(), warnings)
                    .await
            }
            None => {
                warnings.push(String::from(
                    "locator: no live session resolved; reconciled batch-only",
                ));
                (Vec::new(), LiveSupplement::default(), BTreeMap::new())
            }
        };
        let live_contributed = !live_drivers.is_empty()
            || !live_car_data.is_empty()
            || supplement != LiveSupplement::default();
        if live_contributed {
            source_chain.push(ProviderId::Live);
        }

        let (reconciled_driver_map, reconciliation) =
            self.engine.merge(&batch_drivers, &live_drivers);

        let mut abbreviations: BTreeMap<u32, String> = BTreeMap::new();
        for driver in &live_drivers {
            if let Some(number) = driver.driver_number.filter(|_| !driver.abbreviation.is_empty()) {
                abbreviations.entry(number).or_insert_with(|| driver.abbreviation.clone());
            }
        }
        for record in reconciled_driver_map.values() {
            if let Some(number) = record.car_number {
                abbreviations
                    .entry(number)
                    .or_insert_with(|| record.abbreviation.clone());
            }
        }
        for stop in &mut supplement.pit_stops {
            stop.abbreviation = abbreviations.get(&stop.driver_number).cloned();
        }
        for sample in &mut supplement.positions {
            sample.abbreviation = abbreviations.get(&sample.driver_number).cloned();
        }

        let car_data = if raw.car_data.is_empty() {
            live_car_data
                .into_iter()
                .map(|(number, samples)| {
                    let label = abbreviations
                        .get(&number)
                        .cloned()
                        .unwrap_or_else(|| number.to_string());
                    (label, samples)
                })
                .collect()
        } else {
            raw.car_data
        };

        let mut metadata = raw.metadata;
        metadata.live_session_key = session.as_ref().map(|session| session.session_key);

        SessionBundle {
            key: key.clone(),
            metadata,
            drivers_info: batch_drivers
                .into_iter()
                .map(|driver| (driver.abbreviation.clone(), driver))
                .collect(),
            results: raw.results,
            laps: raw.laps,
            weather_data: raw.weather,
            car_data,
            track_status: raw.track_status,
            race_control_messages: raw.race_control_messages,
            reconciled_driver_map,
            reconciliation,
            live: supplement,
        }
    }

    /// Sequential best-effort calls for the resolved session. Telemetry is
    /// only requested when the batch source had none.
    async fn fetch_live(
        &self,
        session: &LiveSession,
        batch_drivers: &[BatchDriver],
        want_car_data: bool,
        warnings: &mut Vec<String>,
    ) -> (Vec<LiveDriver>, LiveSupplement, BTreeMap<u32, Vec<CarSample>>) {
        let session_key = session.session_key;
        let drivers = degrade("drivers", self.live.drivers(session_key).await, warnings);
        let pit_stops = degrade("pit", self.live.pit_stops(session_key).await, warnings);
        let weather = degrade("weather", self.live.weather(session_key).await, warnings);
        let car_data = if want_car_data {
            let numbers: BTreeSet<u32> = batch_drivers
                .iter()
                .filter_map(|driver| driver.car_number)
                .chain(drivers.iter().filter_map(|driver| driver.driver_number))
                .collect();
            self.fetch_car_data(session_key, &numbers, warnings).await
        } else {
            BTreeMap::new()
        };
        let positions = degrade("position", self.live.positions(session_key, None).await, warnings);

        (
            drivers,
            LiveSupplement {
                pit_stops,
                weather,
                positions,
            },
            car_data,
        )
    }

    /// One `car_data` request per car number, keeping only the samples of the
    /// requested car. Failures are reported once; an open circuit ends the walk.
    async fn fetch_car_data(
        &self,
        session_key: i64,
        numbers: &BTreeSet<u32>,
        warnings: &mut Vec<String>,
    ) -> BTreeMap<u32, Vec<CarSample>> {
        let mut car_data = BTreeMap::new();
        let mut first_failure: Option<SourceError> = None;
        let mut failures = 0_usize;

        for &number in numbers {
            match self.live.car_data(session_key, Some(number)).await {
                Ok(mut by_driver) => {
                    let samples = by_driver.remove(&number).unwrap_or_default();
                    if !samples.is_empty() {
                        car_data.insert(number, samples);
                    }
                }
                Err(error) => {
                    failures += 1;
                    first_failure.get_or_insert(error);
                    if self.live.circuit_breaker().is_open() {
                        break;
                    }
                }
            }
        }

        if let Some(error) = first_failure {
            warn!(
                endpoint = "car_data",
                code = error.code(),
                failures,
                drivers = numbers.len(),
                error = %error,
                "live telemetry degraded; continuing with what arrived"
            );
            warnings.push(format!(
                "live car_data: {error} ({failures} of {} drivers failed)",
                numbers.len()
            ));
        }
        car_data
    }

    fn finish(
        &mut self,
        bundle: Option<SessionBundle>,
        cache_hit: bool,
        source_chain: Vec<ProviderId>,
        warnings: Vec<String>,
        started: Instant,
    ) {
        self.bundle = bundle;
        self.last_outcome = Some(LoadOutcome {
            cache_hit,
            source_chain,
            warnings,
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        });
    }
}

fn degrade<T: Default>(
    endpoint: &'static str,
    result: Result<T, SourceError>,
    warnings: &mut Vec<String>,
) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            warn!(
                endpoint,
                code = error.code(),
                error = %error,
                "live endpoint degraded; continuing without it"
            );
            warnings.push(format!("live {endpoint}: {error}"));
            T::default()
        }
    }
}
