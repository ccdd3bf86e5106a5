//! # Domain Models
//!
//! Canonical types for one motorsport session as seen by every consumer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SessionKey`] | Year, event hint and session type; the cache identity |
//! | [`SessionBundle`] | Unified session view handed to consumers |
//! | [`DriverRecord`] | Reconciled driver/team identity |
//! | [`ReconciliationReport`] | Provenance and discrepancy counts |
//! | [`ResultRow`], [`LapRow`], ... | Tabular session data |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Optional tables are exposed through the capability traits
//! ([`HasResults`], [`HasLaps`], [`HasWeather`], [`HasRaceControl`]) rather
//! than discovered at runtime.

mod bundle;
mod driver;
mod session;
mod tables;
mod timestamp;

pub use bundle::{
    HasLaps, HasRaceControl, HasResults, HasWeather, LiveSupplement, SessionBundle,
    SessionMetadata,
};
pub use driver::{BatchDriver, DriverRecord, LiveDriver, Provenance, ReconciliationReport};
pub use session::{SessionKey, SessionType};
pub use tables::{
    parse_clock_seconds, CarSample, LapRow, PitStop, PositionSample, RaceControlMessage,
    ResultRow, TrackStatusEntry, WeatherSample,
};
pub use timestamp::UtcDateTime;
