use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] paddock_core::ValidationError),

    #[error(transparent)]
    Core(#[from] paddock_core::CoreError),

    #[error(transparent)]
    Cache(#[from] paddock_core::CacheError),

    #[error("could not load {session}; see the log for the failing source")]
    LoadFailed { session: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::LoadFailed { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Core(_) => 5,
            Self::Cache(_) => 10,
        }
    }
}
