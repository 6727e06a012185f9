//! Portable settings files: a versioned envelope around calibration settings

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalibrationError, Result};
use crate::model::CalibrationSetting;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsExport {
  pub version: String,
  pub timestamp: String,
  pub settings: Vec<CalibrationSetting>,
}

/// Pretty JSON envelope for `settings`, stamped with `now`
pub fn export_settings(settings: &[CalibrationSetting], now: DateTime<Utc>) -> Result<String> {
  let export = SettingsExport {
    version: EXPORT_VERSION.to_string(),
    timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    settings: settings.to_vec(),
  };
  Ok(serde_json::to_string_pretty(&export)?)
}

#[derive(Deserialize)]
struct RawImport {
  #[serde(default)]
  version: Option<String>,
  #[serde(default)]
  settings: Option<Vec<CalibrationSetting>>,
}

/// Settings from an exported file.
///
/// Any version is accepted, but the envelope must name one and carry a
/// settings list.
pub fn import_settings(json: &str) -> Result<Vec<CalibrationSetting>> {
  let raw: RawImport = serde_json::from_str(json)?;

  match (raw.version, raw.settings) {
    (Some(version), Some(settings)) if !version.is_empty() => {
      tracing::debug!(%version, count = settings.len(), "imported settings");
      Ok(settings)
    }
    _ => Err(CalibrationError::InvalidImport),
  }
}
