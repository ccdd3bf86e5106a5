//! Runtime configuration resolved once per process.
//!
//! # Environment Variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `PADDOCK_HOME` | Root directory (default `$HOME/.paddock`) |
//! | `PADDOCK_LIVE_URL` | Live API base URL |
//! | `PADDOCK_ARCHIVE_URL` | Results archive base URL |
//! | `PADDOCK_TIMING_URL` | Timing archive base URL |

use std::env;
use std::path::PathBuf;

use crate::provider_policy::ProviderPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct PaddockConfig {
    /// Root directory for paddock data.
    pub paddock_home: PathBuf,
    /// Directory holding one JSON file per cached session.
    pub cache_dir: PathBuf,
    /// Alias table override; the bundled table is used when absent.
    pub alias_file: Option<PathBuf>,
    pub live: ProviderPolicy,
    pub archive: ProviderPolicy,
    pub timing: ProviderPolicy,
}

impl Default for PaddockConfig {
    fn default() -> Self {
        Self::with_home(resolve_paddock_home())
    }
}

impl PaddockConfig {
    /// Defaults rooted at `paddock_home`, without reading the environment.
    pub fn with_home(paddock_home: PathBuf) -> Self {
        let cache_dir = paddock_home.join("cache").join("sessions");
        let alias_file = Some(paddock_home.join("aliases.yaml")).filter(|path| path.is_file());
        Self {
            paddock_home,
            cache_dir,
            alias_file,
            live: ProviderPolicy::live_default(),
            archive: ProviderPolicy::archive_default(),
            timing: ProviderPolicy::timing_default(),
        }
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("PADDOCK_LIVE_URL") {
            config.live.base_url = url;
        }
        if let Ok(url) = env::var("PADDOCK_ARCHIVE_URL") {
            config.archive.base_url = url;
        }
        if let Ok(url) = env::var("PADDOCK_TIMING_URL") {
            config.timing.base_url = url;
        }
        config
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_alias_file(mut self, alias_file: impl Into<PathBuf>) -> Self {
        self.alias_file = Some(alias_file.into());
        self
    }
}

fn resolve_paddock_home() -> PathBuf {
    if let Some(path) = env::var_os("PADDOCK_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".paddock");
    }

    PathBuf::from(".paddock")
}
