//! Live API endpoints and the structured provider error.
//!
//! # Endpoints
//!
//! | Endpoint | Path | Filters |
//! |----------|------|---------|
//! | [`Endpoint::Sessions`] | `sessions` | `year` |
//! | [`Endpoint::Drivers`] | `drivers` | `session_key` |
//! | [`Endpoint::Pit`] | `pit` | `session_key` |
//! | [`Endpoint::Weather`] | `weather` | `session_key` |
//! | [`Endpoint::CarData`] | `car_data` | `session_key`, `driver_number` |
//! | [`Endpoint::Position`] | `position` | `session_key`, `driver_number` |

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::http_client::HttpError;

/// Read endpoints of the live API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Sessions,
    Drivers,
    Pit,
    Weather,
    CarData,
    Position,
}

impl Endpoint {
    pub const ALL: [Self; 6] = [
        Self::Sessions,
        Self::Drivers,
        Self::Pit,
        Self::Weather,
        Self::CarData,
        Self::Position,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Drivers => "drivers",
            Self::Pit => "pit",
            Self::Weather => "weather",
            Self::CarData => "car_data",
            Self::Position => "position",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Batch provider unreachable or failing; fatal for a load.
    ProviderUnavailable,
    /// The requested session does not exist upstream.
    SessionNotFound,
    /// Live API timed out; recovered locally.
    ApiTimeout,
    /// Live API failed otherwise; recovered locally.
    ApiError,
}

/// Structured provider error used to decide between failing and degrading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::ProviderUnavailable,
            message: message.into(),
        }
    }

    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::SessionNotFound,
            message: message.into(),
        }
    }

    pub fn api_timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::ApiTimeout,
            message: message.into(),
        }
    }

    pub fn api_error(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::ApiError,
            message: message.into(),
        }
    }

    /// Classifies a live API transport failure.
    pub fn from_live_transport(endpoint: Endpoint, error: &HttpError) -> Self {
        let message = format!("live endpoint '{endpoint}' failed: {}", error.message());
        if error.is_timeout() {
            Self::api_timeout(message)
        } else {
            Self::api_error(message)
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::ProviderUnavailable => "source.provider_unavailable",
            SourceErrorKind::SessionNotFound => "source.session_not_found",
            SourceErrorKind::ApiTimeout => "source.api_timeout",
            SourceErrorKind::ApiError => "source.api_error",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}
