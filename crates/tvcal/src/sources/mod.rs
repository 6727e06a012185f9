//! Raw source loading and normalization
//!
//! Each source ships its own JSON layout. The loaders here read those files and
//! the per-source normalizers turn them into canonical models and settings.

pub mod community;
pub mod professional;

use regex::Regex;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

use crate::clock::Clock;
use crate::error::{CalibrationError, Result};
use crate::model::{CalibrationSetting, ContentType, TvModel};

pub use community::{CommunityCalibration, CommunityData};
pub use professional::{ProfessionalData, RawProfessionalModel, RawProfessionalSetting};

/// Fallbacks for sources that do not report panel metadata
pub const DEFAULT_PANEL_TYPE: &str = "LED";
pub const DEFAULT_HDR_SUPPORT: &str = "HDR10";
pub const UNKNOWN_MODEL_NUMBER: &str = "Unknown";

/// Canonical records produced by one source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSource {
  pub models: Vec<TvModel>,
  pub settings: Vec<CalibrationSetting>,
}

/// Read and parse a raw source file.
///
/// A missing file is an expected absence and yields `Ok(None)`. A file that
/// exists but cannot be read or parsed is an error.
pub fn load_source<T: DeserializeOwned>(path: &Path, source_name: &str) -> Result<Option<T>> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(error) if error.kind() == ErrorKind::NotFound => {
      tracing::warn!(source = source_name, path = %path.display(), "data file not found, skipping source");
      return Ok(None);
    }
    Err(error) => {
      return Err(CalibrationError::SourceRead {
        source_name: source_name.to_string(),
        path: path.to_path_buf(),
        error,
      })
    }
  };

  let parsed = serde_json::from_str(&content).map_err(|error| CalibrationError::CorruptSource {
    source_name: source_name.to_string(),
    path: path.to_path_buf(),
    error,
  })?;

  tracing::debug!(source = source_name, path = %path.display(), "loaded source data");
  Ok(Some(parsed))
}

fn year_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"\((\d{4})\)").expect("year pattern is valid"))
}

/// Year from a `(YYYY)` token in a model name, else the clock's current year
pub fn extract_year(model_name: &str, clock: &impl Clock) -> i32 {
  year_pattern()
    .captures(model_name)
    .and_then(|captures| captures.get(1))
    .and_then(|year| year.as_str().parse().ok())
    .unwrap_or_else(|| clock.current_year())
}

/// Deterministic setting id: `{prefix}-{model id}-{content type slug}`
pub fn setting_id(prefix: &str, tv_model_id: &str, content_type: ContentType) -> String {
  format!("{prefix}-{tv_model_id}-{}", content_type.slug())
}
