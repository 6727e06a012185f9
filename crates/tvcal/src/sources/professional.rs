//! Professional reviewer data (RTINGS layout)

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Number;
use std::collections::HashMap;

use super::{extract_year, setting_id, NormalizedSource, DEFAULT_HDR_SUPPORT, DEFAULT_PANEL_TYPE, UNKNOWN_MODEL_NUMBER};
use crate::clock::Clock;
use crate::config::SourceConfig;
use crate::model::{CalibrationSetting, ContentType, TvModel};

/// Top-level layout of the professional raw file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalData {
  #[serde(default)]
  pub tv_models: Vec<RawProfessionalModel>,
  #[serde(default)]
  pub calibration_settings: Vec<RawProfessionalSetting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProfessionalModel {
  pub id: String,
  #[serde(alias = "brand")]
  pub brand_id: String,
  #[serde(default)]
  pub model_number: Option<String>,
  #[serde(default)]
  pub model_name: Option<String>,
  #[serde(default)]
  pub year: Option<i32>,
  #[serde(default)]
  pub panel_type: Option<String>,
  #[serde(default)]
  pub hdr_support: Option<String>,
  #[serde(default)]
  pub rtings_rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProfessionalSetting {
  pub tv_model_id: String,
  pub content_type: ContentType,
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
  #[serde(default)]
  pub source: Option<String>,
  #[serde(default)]
  pub rating: Option<f64>,
}

impl RawProfessionalModel {
  /// Professional entries carry full metadata, so this is mostly a rename.
  /// A missing name falls back to the model number, then the id.
  pub fn normalize(self, clock: &impl Clock) -> TvModel {
    let model_name = self.model_name.or_else(|| self.model_number.clone()).unwrap_or_else(|| self.id.clone());
    let year = self.year.unwrap_or_else(|| extract_year(&model_name, clock));
    TvModel {
      id: self.id,
      brand_id: self.brand_id,
      model_number: self.model_number.unwrap_or_else(|| UNKNOWN_MODEL_NUMBER.to_string()),
      model_name,
      year,
      panel_type: self.panel_type.unwrap_or_else(|| DEFAULT_PANEL_TYPE.to_string()),
      hdr_support: self.hdr_support.unwrap_or_else(|| DEFAULT_HDR_SUPPORT.to_string()),
      rtings_rating: self.rtings_rating,
      source: None,
    }
  }
}

impl RawProfessionalSetting {
  pub fn normalize(
    self,
    source: &SourceConfig,
    model_rating: Option<f64>,
    verified_date: DateTime<Utc>,
  ) -> CalibrationSetting {
    CalibrationSetting {
      id: setting_id(&source.id_prefix, &self.tv_model_id, self.content_type),
      tv_model_id: self.tv_model_id,
      content_type: self.content_type,
      picture_mode: self.picture_mode,
      brightness: self.brightness,
      contrast: self.contrast,
      color: self.color,
      sharpness: self.sharpness,
      backlight: self.backlight,
      color_temperature: self.color_temperature,
      gamma: self.gamma,
      motion_settings: self.motion_settings,
      source: self.source.unwrap_or_else(|| source.name.clone()),
      rating: self.rating.or(model_rating),
      verified_date,
    }
  }
}

impl ProfessionalData {
  pub fn normalize(self, source: &SourceConfig, clock: &impl Clock) -> NormalizedSource {
    let verified_date = clock.now();
    let ratings: HashMap<String, f64> = self
      .tv_models
      .iter()
      .filter_map(|model| model.rtings_rating.map(|rating| (model.id.clone(), rating)))
      .collect();

    let models = self.tv_models.into_iter().map(|model| model.normalize(clock)).collect();
    let settings = self
      .calibration_settings
      .into_iter()
      .map(|setting| {
        let model_rating = ratings.get(&setting.tv_model_id).copied();
        setting.normalize(source, model_rating, verified_date)
      })
      .collect();

    NormalizedSource { models, settings }
  }
}
