use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Upstream identifiers used in load outcomes and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Batch-oriented historical provider (classification, laps, timing archive).
    Archive,
    /// Near-real-time REST API.
    Live,
    /// Local on-disk session cache.
    Cache,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Live => "live",
            Self::Cache => "cache",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
