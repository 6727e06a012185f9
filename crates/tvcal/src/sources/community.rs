//! Community forum data (AVS Forum layout)
//!
//! Community entries describe one calibration each and carry only a partial
//! model identity, so models are synthesized from them.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Number;

use super::{extract_year, setting_id, NormalizedSource, DEFAULT_HDR_SUPPORT, DEFAULT_PANEL_TYPE, UNKNOWN_MODEL_NUMBER};
use crate::clock::Clock;
use crate::config::SourceConfig;
use crate::model::{CalibrationSetting, ContentType, TvModel};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunityData {
  #[serde(default)]
  pub calibrations: Vec<CommunityCalibration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommunityCalibration {
  pub tv_model_id: String,
  #[serde(default)]
  pub brand: Option<String>,
  #[serde(default)]
  pub model_name: Option<String>,
  #[serde(default)]
  pub model_number: Option<String>,
  pub content_type: ContentType,
  #[serde(default)]
  pub settings: CommunitySettings,
  #[serde(default)]
  pub source: Option<String>,
  #[serde(default)]
  pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunitySettings {
  #[serde(default)]
  pub picture_mode: Option<String>,
  #[serde(default)]
  pub brightness: Option<Number>,
  #[serde(default)]
  pub contrast: Option<Number>,
  #[serde(default)]
  pub color: Option<Number>,
  #[serde(default)]
  pub sharpness: Option<Number>,
  #[serde(default)]
  pub backlight: Option<Number>,
  #[serde(default, alias = "colorTemp")]
  pub color_temperature: Option<String>,
  #[serde(default)]
  pub gamma: Option<String>,
  #[serde(default, alias = "motion")]
  pub motion_settings: Option<String>,
}

impl CommunityCalibration {
  /// Synthesize a model from the calibration's partial identity.
  ///
  /// Returns `None` when brand or model name is missing: there is nothing to
  /// build a model from, and the setting must find its model elsewhere.
  pub fn model(&self, source: &SourceConfig, clock: &impl Clock) -> Option<TvModel> {
    let brand = self.brand.as_ref()?;
    let model_name = self.model_name.as_ref()?;

    Some(TvModel {
      id: self.tv_model_id.clone(),
      brand_id: brand.clone(),
      model_number: self.model_number.clone().unwrap_or_else(|| UNKNOWN_MODEL_NUMBER.to_string()),
      model_name: model_name.clone(),
      year: extract_year(model_name, clock),
      panel_type: DEFAULT_PANEL_TYPE.to_string(),
      hdr_support: DEFAULT_HDR_SUPPORT.to_string(),
      rtings_rating: None,
      source: Some(source.name.clone()),
    })
  }

  pub fn setting(self, source: &SourceConfig, verified_date: DateTime<Utc>) -> CalibrationSetting {
    let settings = self.settings;
    CalibrationSetting {
      id: setting_id(&source.id_prefix, &self.tv_model_id, self.content_type),
      tv_model_id: self.tv_model_id,
      content_type: self.content_type,
      picture_mode: settings.picture_mode,
      brightness: settings.brightness,
      contrast: settings.contrast,
      color: settings.color,
      sharpness: settings.sharpness,
      backlight: settings.backlight,
      color_temperature: settings.color_temperature,
      gamma: settings.gamma,
      motion_settings: settings.motion_settings,
      source: self.source.unwrap_or_else(|| source.name.clone()),
      rating: self.rating,
      verified_date,
    }
  }
}

impl CommunityData {
  pub fn normalize(self, source: &SourceConfig, clock: &impl Clock) -> NormalizedSource {
    let verified_date = clock.now();
    let mut normalized = NormalizedSource::default();

    for calibration in self.calibrations {
      match calibration.model(source, clock) {
        Some(model) => normalized.models.push(model),
        None => tracing::debug!(
          tv_model_id = %calibration.tv_model_id,
          "community calibration has no brand or model name, no model synthesized"
        ),
      }
      normalized.settings.push(calibration.setting(source, verified_date));
    }

    normalized
  }
}
