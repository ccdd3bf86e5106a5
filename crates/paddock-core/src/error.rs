use thiserror::Error;

/// Validation and contract errors exposed by `paddock-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event name cannot be empty")]
    EmptyEventName,
    #[error("year {year} is outside the supported range {min}..={max}")]
    YearOutOfRange { year: u16, min: u16, max: u16 },

    #[error("invalid session type '{value}', expected one of FP1, FP2, FP3, SQ, S, Q, R")]
    InvalidSessionType { value: String },

    #[error("timestamp must be RFC3339 UTC: '{value}'")]
    TimestampNotUtc { value: String },
    #[error("lap time must look like M:SS.mmm or SS.mmm: '{value}'")]
    InvalidLapTime { value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("no session is loaded; call load() first")]
    NotLoaded,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
