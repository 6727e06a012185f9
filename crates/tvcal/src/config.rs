//! Configuration management for tvcal
//!
//! Handles loading the source locations, output path and cache settings the
//! pipeline and the read-side commands share.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CalibrationError, Result};

const CONFIG_PATHS: [&str; 3] = [".tvcal.json", "tvcal.json", ".tvcal/config.json"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Version string stamped into the generated database
  #[serde(default = "default_version")]
  pub version: String,
  /// Where the generated database is written
  #[serde(default = "default_output")]
  pub output: PathBuf,
  /// Primary, higher-trust source
  #[serde(default = "SourceConfig::professional")]
  pub professional: SourceConfig,
  /// Secondary, user-contributed source
  #[serde(default = "SourceConfig::community")]
  pub community: SourceConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Directory holding the record store tables
  #[serde(default = "default_store_dir")]
  pub store_dir: PathBuf,
}

/// Location and naming of one raw data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
  /// Human-readable name, also the provenance tag for settings
  pub name: String,
  pub path: PathBuf,
  /// Prefix of synthesized setting ids
  pub id_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_cache_enabled")]
  pub enabled: bool,
  #[serde(default = "default_cache_dir")]
  pub dir: PathBuf,
  #[serde(default = "default_cache_ttl_secs")]
  pub ttl_secs: u64,
}

fn default_version() -> String {
  "1.0.0".to_string()
}
fn default_output() -> PathBuf {
  PathBuf::from("data/calibrations.json")
}
fn default_store_dir() -> PathBuf {
  PathBuf::from("data/tables")
}
fn default_cache_enabled() -> bool {
  true
}
fn default_cache_dir() -> PathBuf {
  dirs::cache_dir().map(|dir| dir.join("tvcal")).unwrap_or_else(|| PathBuf::from(".tvcal/cache"))
}
fn default_cache_ttl_secs() -> u64 {
  3600
}

impl SourceConfig {
  pub fn professional() -> Self {
    Self {
      name: "RTINGS".to_string(),
      path: PathBuf::from("data/rtings-raw.json"),
      id_prefix: "rtings".to_string(),
    }
  }

  pub fn community() -> Self {
    Self {
      name: "AVS Forum".to_string(),
      path: PathBuf::from("data/avs-forum-raw.json"),
      id_prefix: "avs".to_string(),
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> chrono::Duration {
    chrono::Duration::from_std(std::time::Duration::from_secs(self.ttl_secs)).unwrap_or(chrono::Duration::MAX)
  }
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: default_cache_enabled(),
      dir: default_cache_dir(),
      ttl_secs: default_cache_ttl_secs(),
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      version: default_version(),
      output: default_output(),
      professional: SourceConfig::professional(),
      community: SourceConfig::community(),
      cache: CacheConfig::default(),
      store_dir: default_store_dir(),
    }
  }
}

impl Config {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|e| CalibrationError::config(path, format!("cannot read file: {e}")))?;
    let config: Config =
      serde_json::from_str(&content).map_err(|e| CalibrationError::config(path, e.to_string()))?;
    config.check(path)?;
    Ok(config)
  }

  /// Load configuration from the current directory or defaults
  pub fn load() -> Result<Self> {
    Self::load_from_dir(Path::new("."))
  }

  pub fn load_from_dir(dir: &Path) -> Result<Self> {
    for candidate in CONFIG_PATHS {
      let path = dir.join(candidate);
      if path.exists() {
        tracing::debug!(path = %path.display(), "loading configuration");
        return Self::load_from_file(path);
      }
    }

    Ok(Config::default())
  }

  /// Save configuration to a file
  pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Names of all sources, in processing order
  pub fn source_names(&self) -> Vec<String> {
    vec![self.professional.name.clone(), self.community.name.clone()]
  }

  fn check(&self, path: &Path) -> Result<()> {
    if self.professional.name.trim().is_empty() || self.community.name.trim().is_empty() {
      return Err(CalibrationError::config(path, "source names must not be empty"));
    }
    if self.professional.name == self.community.name {
      return Err(CalibrationError::config(path, "professional and community sources share a name"));
    }
    if self.professional.id_prefix == self.community.id_prefix {
      return Err(CalibrationError::config(path, "professional and community sources share an id prefix"));
    }
    Ok(())
  }
}
