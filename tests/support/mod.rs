//! Shared fixtures for the behaviour tests: a scripted HTTP transport, a
//! static batch source and a 2025 Japan race worth of data.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use paddock_core::{
    BatchSource, CarSample, Context, HasResults, HttpClient, HttpError, HttpRequest, HttpResponse,
    LapRow, LiveSupplement, PaddockConfig, PitStop, PositionSample, ProviderPolicy,
    RaceControlMessage, RawBatchSession, ReconciliationEngine, ResultRow, RetryConfig,
    SessionBundle, SessionKey, SessionMetadata, SourceError, TrackStatusEntry, UtcDateTime,
    WeatherSample,
};
use serde_json::{json, Value};

pub const LIVE_URL: &str = "https://live.test/v1";
pub const ARCHIVE_URL: &str = "https://archive.test/f1";
pub const TIMING_URL: &str = "https://timing.test/static";

/// 2025 grid, with the team each entrant raced for at Suzuka.
pub const GRID: [(&str, &str, u32, &str); 20] = [
    ("VER", "Max Verstappen", 1, "Red Bull Racing"),
    ("TSU", "Yuki Tsunoda", 22, "Red Bull Racing"),
    ("LEC", "Charles Leclerc", 16, "Ferrari"),
    ("HAM", "Lewis Hamilton", 44, "Ferrari"),
    ("RUS", "George Russell", 63, "Mercedes"),
    ("ANT", "Andrea Kimi Antonelli", 12, "Mercedes"),
    ("NOR", "Lando Norris", 4, "McLaren"),
    ("PIA", "Oscar Piastri", 81, "McLaren"),
    ("ALO", "Fernando Alonso", 14, "Aston Martin"),
    ("STR", "Lance Stroll", 18, "Aston Martin"),
    ("GAS", "Pierre Gasly", 10, "Alpine"),
    ("DOO", "Jack Doohan", 7, "Alpine"),
    ("OCO", "Esteban Ocon", 31, "Haas F1 Team"),
    ("BEA", "Oliver Bearman", 87, "Haas F1 Team"),
    ("ALB", "Alexander Albon", 23, "Williams"),
    ("SAI", "Carlos Sainz", 55, "Williams"),
    ("HUL", "Nico Hulkenberg", 27, "Kick Sauber"),
    ("BOR", "Gabriel Bortoleto", 5, "Kick Sauber"),
    ("LAW", "Liam Lawson", 30, "Racing Bulls"),
    ("HAD", "Isack Hadjar", 6, "Racing Bulls"),
];

pub const SUZUKA_RACE_KEY: i64 = 9693;

// ============================================================================
// Scripted transport
// ============================================================================

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Fail(HttpError),
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Status(200, body.into())
    }
}

struct Route {
    needle: String,
    replies: VecDeque<Reply>,
}

/// Answers requests from substring routes; the longest matching needle wins.
/// A route's replies are consumed in order and the last one repeats.
/// Unrouted URLs get a 404.
#[derive(Default)]
pub struct FixtureHttpClient {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, needle: &str, body: impl Into<String>) -> Self {
        self.route_sequence(needle, vec![Reply::ok(body)])
    }

    pub fn route_json(self, needle: &str, body: &Value) -> Self {
        self.route(needle, body.to_string())
    }

    pub fn route_status(self, needle: &str, status: u16) -> Self {
        self.route_sequence(needle, vec![Reply::Status(status, String::new())])
    }

    pub fn route_error(self, needle: &str, error: HttpError) -> Self {
        self.route_sequence(needle, vec![Reply::Fail(error)])
    }

    pub fn route_sequence(self, needle: &str, replies: Vec<Reply>) -> Self {
        lock(&self.routes).push(Route {
            needle: needle.to_owned(),
            replies: replies.into(),
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|url| url.contains(needle))
            .count()
    }

    fn reply_for(&self, url: &str) -> Reply {
        let mut routes = lock(&self.routes);
        let route = routes
            .iter_mut()
            .filter(|route| url.contains(route.needle.as_str()))
            .max_by_key(|route| route.needle.len());
        match route {
            Some(route) if route.replies.len() > 1 => route
                .replies
                .pop_front()
                .unwrap_or_else(|| Reply::Status(404, String::new())),
            Some(route) => route
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| Reply::Status(404, String::new())),
            None => Reply::Status(404, String::from(r#"{"detail":"No results found."}"#)),
        }
    }
}

impl HttpClient for FixtureHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            lock(&self.calls).push(request.url.clone());
            match self.reply_for(&request.url) {
                Reply::Status(status, body) => Ok(HttpResponse::with_status(status, body)),
                Reply::Fail(error) => Err(error),
            }
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Context
// ============================================================================

/// Context rooted at `home`, pointed at the fixture hosts. Archive calls are
/// not retried; live calls keep the production throttle and backoff, so
/// async tests run with paused time.
pub fn test_context(home: &Path, http: Arc<dyn HttpClient>) -> Context {
    let mut config = PaddockConfig::with_home(home.to_path_buf());
    config.live = ProviderPolicy::live_default().with_base_url(LIVE_URL);
    config.archive = ProviderPolicy::archive_default()
        .with_base_url(ARCHIVE_URL)
        .with_retry(RetryConfig::immediate());
    config.timing = ProviderPolicy::timing_default()
        .with_base_url(TIMING_URL)
        .with_retry(RetryConfig::immediate());
    Context::new(config, http).expect("bundled aliases load")
}

// ============================================================================
// Static batch source
// ============================================================================

/// Serves one prepared session and counts how often it was asked.
#[derive(Clone)]
pub struct StaticBatch {
    session: Result<RawBatchSession, SourceError>,
    calls: Arc<AtomicUsize>,
}

impl StaticBatch {
    pub fn new(session: RawBatchSession) -> Self {
        Self {
            session: Ok(session),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            session: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl BatchSource for StaticBatch {
    fn load<'a>(
        &'a self,
        _key: &'a SessionKey,
    ) -> Pin<Box<dyn Future<Output = Result<RawBatchSession, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.session.clone()
        })
    }
}

pub fn load_count(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

// ============================================================================
// Japan 2025 fixtures
// ============================================================================

pub fn result_row(position: u32, code: &str, name: &str, number: u32, team: &str) -> ResultRow {
    ResultRow {
        position: Some(position),
        abbreviation: code.to_owned(),
        driver_number: Some(number),
        full_name: name.to_owned(),
        team_name: team.to_owned(),
        grid: Some(position),
        laps_completed: Some(53),
        status: String::from("Finished"),
        points: [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0]
            .get(position as usize - 1)
            .copied()
            .unwrap_or(0.0),
        race_time_s: Some(5206.896 + f64::from(position) * 1.123),
        q1_s: None,
        q2_s: None,
        q3_s: None,
    }
}

pub fn japan_metadata() -> SessionMetadata {
    SessionMetadata {
        year: 2025,
        event_name: String::from("Japanese Grand Prix"),
        location: String::from("Suzuka"),
        country: String::from("Japan"),
        round: Some(3),
        date: String::from("2025-04-06"),
        start_time: paddock_core::UtcDateTime::parse("2025-04-06T05:00:00Z").ok(),
        live_session_key: None,
    }
}

/// Batch session with the full grid as classified.
pub fn japan_batch() -> RawBatchSession {
    let results: Vec<ResultRow> = GRID
        .iter()
        .enumerate()
        .map(|(index, (code, name, number, team))| {
            result_row(index as u32 + 1, code, name, *number, team)
        })
        .collect();

    let laps = GRID
        .iter()
        .take(3)
        .flat_map(|(code, ..)| {
            (1..=3).map(move |lap| LapRow {
                driver: (*code).to_owned(),
                lap_number: lap,
                lap_time_s: Some(93.417 + f64::from(lap) / 10.0),
                position: Some(lap),
                compound: Some(String::from("MEDIUM")),
                tyre_life: Some(lap + 2),
            })
        })
        .collect();

    RawBatchSession {
        metadata: japan_metadata(),
        results,
        laps: Some(laps),
        weather: Some(vec![WeatherSample {
            session_time_s: Some(9.466),
            timestamp: None,
            air_temp_c: Some(19.8),
            track_temp_c: Some(31.5),
            humidity_pct: Some(62.0),
            pressure_mbar: Some(1012.1),
            rainfall: false,
            wind_speed_ms: Some(1.2),
            wind_direction_deg: Some(262.0),
        }]),
        car_data: BTreeMap::new(),
        track_status: Some(vec![TrackStatusEntry {
            session_time_s: 0.0,
            status: String::from("1"),
            message: String::from("AllClear"),
        }]),
        race_control_messages: Some(vec![RaceControlMessage {
            timestamp: paddock_core::UtcDateTime::parse("2025-04-06T05:03:00Z").ok(),
            session_time_s: Some(1.0),
            category: String::from("Flag"),
            flag: Some(String::from("GREEN")),
            scope: Some(String::from("Track")),
            lap: Some(1),
            driver_number: None,
            message: String::from("GREEN LIGHT - PIT EXIT OPEN"),
        }]),
    }
}

fn at(value: &str) -> Option<UtcDateTime> {
    UtcDateTime::parse(value).ok()
}

/// Live extras as the facade stores them once numbers are mapped to codes.
pub fn japan_live_supplement() -> LiveSupplement {
    LiveSupplement {
        pit_stops: vec![
            PitStop {
                timestamp: at("2025-04-06T05:40:11.250Z"),
                driver_number: 1,
                abbreviation: Some(String::from("VER")),
                lap_number: Some(21),
                pit_duration_s: Some(22.7),
            },
            PitStop {
                timestamp: at("2025-04-06T05:41:02Z"),
                driver_number: 99,
                abbreviation: None,
                lap_number: None,
                pit_duration_s: None,
            },
        ],
        weather: vec![WeatherSample {
            session_time_s: None,
            timestamp: at("2025-04-06T05:05:00Z"),
            air_temp_c: Some(19.6),
            track_temp_c: Some(30.9),
            humidity_pct: Some(64.0),
            pressure_mbar: Some(1012.3),
            rainfall: false,
            wind_speed_ms: Some(0.9),
            wind_direction_deg: Some(255.0),
        }],
        positions: vec![PositionSample {
            timestamp: at("2025-04-06T05:03:41.123456Z"),
            driver_number: 4,
            abbreviation: Some(String::from("NOR")),
            position: 2,
        }],
    }
}

/// Live telemetry for VER, labelled by abbreviation.
pub fn japan_car_data() -> BTreeMap<String, Vec<CarSample>> {
    BTreeMap::from([(
        String::from("VER"),
        vec![CarSample {
            timestamp: at("2025-04-06T05:10:00.184Z"),
            session_time_s: None,
            speed_kph: Some(301.0),
            rpm: Some(11800.0),
            gear: Some(8),
            throttle_pct: Some(100.0),
            brake: Some(0.0),
            drs: Some(12),
        }],
    )])
}

/// Japan bundle for `key`: batch tables reconciled without live drivers, plus
/// live telemetry and supplements.
pub fn japan_bundle(key: &SessionKey) -> SessionBundle {
    let raw = japan_batch();
    let drivers = raw.batch_drivers();
    let (reconciled_driver_map, reconciliation) = ReconciliationEngine.merge(&drivers, &[]);
    SessionBundle {
        key: key.clone(),
        metadata: raw.metadata,
        results: raw.results,
        laps: raw.laps,
        weather_data: raw.weather,
        car_data: japan_car_data(),
        track_status: raw.track_status,
        race_control_messages: raw.race_control_messages,
        drivers_info: drivers
            .into_iter()
            .map(|driver| (driver.abbreviation.clone(), driver))
            .collect(),
        reconciled_driver_map,
        reconciliation,
        live: japan_live_supplement(),
    }
}

/// Live `sessions` listing for 2025 with a handful of weekends.
pub fn live_sessions_2025() -> Value {
    json!([
        {"session_key": 9692, "session_name": "Qualifying", "session_type": "Qualifying",
         "location": "Suzuka", "country_name": "Japan", "year": 2025},
        {"session_key": SUZUKA_RACE_KEY, "session_name": "Race", "session_type": "Race",
         "location": "Suzuka", "country_name": "Japan", "date_start": "2025-04-06T05:00:00+00:00", "year": 2025},
        {"session_key": 9987, "session_name": "Race", "session_type": "Race",
         "location": "Imola", "country_name": "Italy", "year": 2025},
        {"session_key": 9947, "session_name": "Race", "session_type": "Race",
         "location": "Silverstone", "country_name": "United Kingdom", "year": 2025},
        {"session_key": 9860, "session_name": "Race", "session_type": "Race",
         "location": "Spa-Francorchamps", "country_name": "Belgium", "year": 2025}
    ])
}

/// Live `drivers` records for every grid entry except `missing`.
pub fn live_drivers(missing: &[&str]) -> Value {
    Value::Array(
        GRID.iter()
            .filter(|(code, ..)| !missing.contains(code))
            .map(|(code, name, number, team)| {
                json!({
                    "driver_number": number,
                    "name_acronym": code,
                    "full_name": name.to_uppercase(),
                    "team_name": team,
                    "team_colour": "3671C6",
                    "country_code": "JPN",
                    "session_key": SUZUKA_RACE_KEY
                })
            })
            .collect(),
    )
}

/// Transport serving the Suzuka race on the live side.
pub fn suzuka_live(missing: &[&str]) -> FixtureHttpClient {
    FixtureHttpClient::new()
        .route_json("live.test/v1/sessions", &live_sessions_2025())
        .route_json("live.test/v1/drivers", &live_drivers(missing))
        .route_json(
            "live.test/v1/pit",
            &json!([
                {"date": "2025-04-06T05:40:11.000000+00:00", "driver_number": 1, "lap_number": 21, "pit_duration": 22.7},
                {"date": "2025-04-06T05:41:02.000000+00:00", "driver_number": 4, "lap_number": 22, "pit_duration": 23.1}
            ]),
        )
        .route_json(
            "live.test/v1/car_data",
            &json!([
                {"date": "2025-04-06T05:10:00+00:00", "driver_number": 1, "speed": 301.0, "rpm": 11800.0, "n_gear": 8, "throttle": 100.0, "brake": 0.0, "drs": 12},
                {"date": "2025-04-06T05:10:00+00:00", "driver_number": 4, "speed": 298.0, "rpm": 11650.0, "n_gear": 8, "throttle": 99.0, "brake": 0.0, "drs": 8}
            ]),
        )
}
