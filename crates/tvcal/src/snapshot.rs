//! Time-boxed local caching of the published database
//!
//! Consumers read the generated database through a [`SnapshotSource`]. The
//! [`CachedSnapshot`] wrapper keeps the last good copy on disk, serves it
//! while it is fresh, and falls back to it (however old) when the source
//! cannot be reached.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::Clock;
use crate::error::{CalibrationError, Result};
use crate::model::Database;
use crate::writer::{read_database, write_json_atomic};

pub const CACHE_FILE_NAME: &str = "calibration_db.json";

/// Where a database snapshot comes from
pub trait SnapshotSource {
  fn fetch(&self) -> Result<Database>;

  /// Human-readable origin, used in logs and errors
  fn describe(&self) -> String;
}

/// Snapshot read straight from a generated database file
pub struct FileSnapshotSource {
  path: PathBuf,
}

impl FileSnapshotSource {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl SnapshotSource for FileSnapshotSource {
  fn fetch(&self) -> Result<Database> {
    read_database(&self.path)
  }

  fn describe(&self) -> String {
    self.path.display().to_string()
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
  data: Database,
  timestamp: DateTime<Utc>,
}

pub struct CachedSnapshot<S: SnapshotSource, C: Clock> {
  source: S,
  clock: C,
  cache_path: PathBuf,
  ttl: Duration,
  enabled: bool,
}

impl<S: SnapshotSource, C: Clock> CachedSnapshot<S, C> {
  pub fn new(source: S, clock: C, cache_dir: &Path, ttl: Duration) -> Self {
    Self { source, clock, cache_path: cache_dir.join(CACHE_FILE_NAME), ttl, enabled: true }
  }

  /// Bypass the cache entirely; every load goes to the source
  pub fn disabled(mut self) -> Self {
    self.enabled = false;
    self
  }

  pub fn cache_path(&self) -> &Path {
    &self.cache_path
  }

  /// Load the database, preferring a fresh cached copy unless `force_refresh`
  pub fn load(&self, force_refresh: bool) -> Result<Database> {
    if self.enabled && !force_refresh {
      if let Some(entry) = self.read_cache() {
        if self.clock.now() - entry.timestamp <= self.ttl {
          tracing::debug!(cache = %self.cache_path.display(), "loaded database from local cache");
          return Ok(entry.data);
        }
        tracing::debug!("cached database expired");
      }
    }

    match self.source.fetch() {
      Ok(database) => {
        if self.enabled {
          self.store(&database);
        }
        Ok(database)
      }
      Err(error) => {
        if self.enabled {
          if let Some(entry) = self.read_cache() {
            tracing::warn!(origin = %self.source.describe(), %error, "using stale cached database as fallback");
            return Ok(entry.data);
          }
        }
        Err(CalibrationError::snapshot_unavailable(self.source.describe(), error.to_string()))
      }
    }
  }

  /// Whether the published database is newer than the cached one
  pub fn is_stale(&self, published: DateTime<Utc>) -> bool {
    match self.read_cache() {
      Some(entry) => published > entry.data.last_updated,
      None => true,
    }
  }

  pub fn clear(&self) -> Result<()> {
    match fs::remove_file(&self.cache_path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }

  fn read_cache(&self) -> Option<CacheEntry> {
    let content = fs::read_to_string(&self.cache_path).ok()?;
    match serde_json::from_str(&content) {
      Ok(entry) => Some(entry),
      Err(error) => {
        tracing::warn!(cache = %self.cache_path.display(), %error, "ignoring unreadable cache");
        None
      }
    }
  }

  fn store(&self, database: &Database) {
    let entry = CacheEntry { data: database.clone(), timestamp: self.clock.now() };
    if let Err(error) = write_json_atomic(&entry, &self.cache_path) {
      tracing::warn!(cache = %self.cache_path.display(), %error, "failed to save cache");
    }
  }
}
