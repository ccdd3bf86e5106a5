//! # Paddock Core
//!
//! Load, reconcile and cache one motorsport session from two independent
//! providers.
//!
//! ## Overview
//!
//! - **Batch provider** (results archive plus timing archive): the mandatory
//!   primary source for classification, laps, weather and race control
//! - **Live API**: best-effort driver, pit, weather, telemetry and position
//!   facts, throttled and retried, degrading to empty lists
//! - **Session locator**: hint → live session key, direct match then aliases
//! - **Reconciliation**: one driver map with provenance and team discrepancies
//! - **Cache**: one JSON file per session, no expiry
//! - **Facade**: [`DataAccess`], the single object consumers hold
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aliases`] | YAML alias tables for event hints and locator groups |
//! | [`batch`] | Batch provider contract and archive clients |
//! | [`cache`] | On-disk session cache |
//! | [`circuit_breaker`] | Circuit breaker for the live API |
//! | [`config`] | Home directory, cache directory and provider URLs |
//! | [`context`] | Shared context handed to every component |
//! | [`data_source`] | Live endpoints and structured provider errors |
//! | [`diagnostics`] | Read-only validation report |
//! | [`domain`] | Session key, bundle, tables and driver records |
//! | [`error`] | Core error types |
//! | [`facade`] | Load lifecycle and read surface |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`live`] | Live API client |
//! | [`locator`] | Live session resolution |
//! | [`provider_policy`] | Per-provider timeout and retry settings |
//! | [`reconcile`] | Driver identity merge |
//! | [`retry`] | Throttle and exponential backoff |
//! | [`source`] | Provider identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use paddock_core::{Context, DataAccess, SessionType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut data = DataAccess::new(Context::from_env()?);
//!
//!     if data.load(2025, "Japan", SessionType::Race, false).await {
//!         let bundle = data.loaded_data()?;
//!         for (code, driver) in &bundle.reconciled_driver_map {
//!             println!("{code}: {} ({:?})", driver.team_name_reconciled, driver.provenance);
//!         }
//!     }
//!     println!("{}", data.validate());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  DataAccess     │──────────────▶ CacheStore (hit → done)
//! └────────┬────────┘
//!          │ miss / forced reload
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ BatchSource     │────▶│ HTTP Client      │
//! └────────┬────────┘     │ (retry/throttle) │
//!          │              └──────────────────┘
//!          ▼                       ▲
//! ┌─────────────────┐     ┌────────┴─────────┐
//! │ SessionLocator  │────▶│ LiveApiClient    │
//! └────────┬────────┘     │ (circuit breaker)│
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Reconciliation  │────▶ SessionBundle → CacheStore
//! └─────────────────┘
//! ```
//!
//! Every network call of a load is awaited in sequence.

pub mod aliases;
pub mod batch;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod context;
pub mod data_source;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod facade;
pub mod http_client;
pub mod live;
pub mod locator;
pub mod provider_policy;
pub mod reconcile;
pub mod retry;
pub mod source;

pub use aliases::{AliasTable, RaceGroup};
pub use batch::{BatchSource, HistoricalClient, RawBatchSession};
pub use cache::{CacheEntry, CacheError, CacheFileInfo, CacheStore};
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::PaddockConfig;
pub use context::Context;
pub use data_source::{Endpoint, SourceError, SourceErrorKind};
pub use diagnostics::{CheckStatus, DiagnosticCheck, DiagnosticReport};
pub use domain::*;
pub use error::{CoreError, ValidationError};
pub use facade::{DataAccess, LoadOutcome};
pub use http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use live::{LiveApiClient, LiveSession};
pub use locator::SessionLocator;
pub use provider_policy::ProviderPolicy;
pub use reconcile::ReconciliationEngine;
pub use retry::{BackoffPolicy, RetryConfig};
pub use source::ProviderId;
