//! On-disk session cache: one JSON file per [`SessionKey`].
//!
//! File names are `{year}_{sanitized event}_{session code}.json`. Entries never
//! expire; a reload has to be asked for explicitly.
//!
//! Concurrent writers are not coordinated. Two processes saving the same key
//! race and the last rename wins; the loser's entry is silently replaced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{SessionBundle, SessionKey};
use crate::UtcDateTime;

/// Bumped whenever the bundle layout changes; older entries read as misses.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache entry {path} is unusable: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Serialized form of one cached bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub format_version: u32,
    /// When the entry was written; informational only.
    pub saved_at: UtcDateTime,
    pub key: SessionKey,
    pub bundle: SessionBundle,
}

/// One file in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheFileInfo {
    pub file_name: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.dir.join(file_name(key))
    }

    /// Writes `bundle` under `key`, replacing any earlier entry.
    ///
    /// Failures are logged and reported as `false`; they never abort the caller.
    pub fn save(&self, key: &SessionKey, bundle: &SessionBundle) -> bool {
        match self.write_entry(key, bundle) {
            Ok(path) => {
                debug!(session = %key, path = %path.display(), "cached session bundle");
                true
            }
            Err(error) => {
                warn!(session = %key, error = %error, "cache write failed; continuing without caching");
                false
            }
        }
    }

    /// The cached bundle for `key`, or `None` on a miss.
    ///
    /// A missing, unreadable, undecodable or mismatched entry is a miss.
    pub fn load(&self, key: &SessionKey) -> Option<SessionBundle> {
        match self.read_entry(key) {
            Ok(Some(entry)) => Some(entry.bundle),
            Ok(None) => None,
            Err(error) => {
                warn!(session = %key, error = %error, "ignoring unusable cache entry; treating as a miss");
                None
            }
        }
    }

    pub fn read_entry(&self, key: &SessionKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes).map_err(|error| CacheError::Corrupt {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        if entry.format_version != CACHE_FORMAT_VERSION {
            return Err(CacheError::Corrupt {
                path,
                reason: format!(
                    "format version {} (expected {CACHE_FORMAT_VERSION})",
                    entry.format_version
                ),
            });
        }
        if &entry.key != key {
            return Err(CacheError::Corrupt {
                path,
                reason: format!("entry belongs to {}", entry.key),
            });
        }
        Ok(Some(entry))
    }

    fn write_entry(&self, key: &SessionKey, bundle: &SessionBundle) -> Result<PathBuf, CacheError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CacheError::Io { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let entry = CacheEntry {
            format_version: CACHE_FORMAT_VERSION,
            saved_at: UtcDateTime::now(),
            key: key.clone(),
            bundle: bundle.clone(),
        };
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(&entry).map_err(|error| CacheError::Corrupt {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        let staging = path.with_extension("json.tmp");
        let written = fs::write(&staging, bytes)
            .map_err(io_error(&staging))
            .and_then(|()| fs::rename(&staging, &path).map_err(io_error(&path)));
        if written.is_err() {
            discard_staging(&staging);
        }
        written.map(|()| path)
    }

    /// Cache files sorted by name; an absent directory lists as empty.
    pub fn list(&self) -> Result<Vec<CacheFileInfo>, CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CacheError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let size_bytes = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
            files.push(CacheFileInfo {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes,
                path,
            });
        }
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    /// Deletes the entry for `key`; `false` when there was none.
    pub fn remove(&self, key: &SessionKey) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Deletes every cache file, returning how many were removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let files = self.list()?;
        for file in &files {
            fs::remove_file(&file.path).map_err(|source| CacheError::Io {
                path: file.path.clone(),
                source,
            })?;
        }
        Ok(files.len())
    }
}

fn discard_staging(staging: &Path) {
    match fs::remove_file(staging) {
        Ok(()) => debug!(path = %staging.display(), "removed cache staging file"),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %staging.display(), error = %error, "could not remove cache staging file"),
    }
}

/// `{year}_{sanitized event}_{session code}.json`
pub fn file_name(key: &SessionKey) -> String {
    format!(
        "{}_{}_{}.json",
        key.year(),
        sanitize_event_name(key.event_name()),
        key.session_type().code()
    )
}

/// Spaces become `_`; anything outside `[A-Za-z0-9_-]` is dropped.
pub fn sanitize_event_name(name: &str) -> String {
    name.chars()
        .filter_map(|ch| match ch {
            ' ' => Some('_'),
            ch if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' => Some(ch),
            _ => None,
        })
        .collect()
}
