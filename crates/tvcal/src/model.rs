//! Canonical records of the calibration database.
//!
//! Every source is normalized into these types before merging, and the
//! generated artifact is a serialized [`Database`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CalibrationError;

/// Viewing context a calibration preset targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
  MoviesSdr,
  MoviesHdr10,
  MoviesDolbyVision,
  Gaming,
  Sports,
  TvShows,
}

impl ContentType {
  pub const ALL: [ContentType; 6] = [
    ContentType::MoviesSdr,
    ContentType::MoviesHdr10,
    ContentType::MoviesDolbyVision,
    ContentType::Gaming,
    ContentType::Sports,
    ContentType::TvShows,
  ];

  /// Human-readable name, also the form written to the database
  pub fn display_name(self) -> &'static str {
    match self {
      ContentType::MoviesSdr => "Movies (SDR)",
      ContentType::MoviesHdr10 => "Movies (HDR10)",
      ContentType::MoviesDolbyVision => "Movies (Dolby Vision)",
      ContentType::Gaming => "Gaming",
      ContentType::Sports => "Sports",
      ContentType::TvShows => "TV Shows",
    }
  }

  /// Short key used by the front-end and by per-model settings maps
  pub fn key(self) -> &'static str {
    match self {
      ContentType::MoviesSdr => "movies_sdr",
      ContentType::MoviesHdr10 => "movies_hdr10",
      ContentType::MoviesDolbyVision => "movies_dolby",
      ContentType::Gaming => "gaming",
      ContentType::Sports => "sports",
      ContentType::TvShows => "tv_shows",
    }
  }

  pub fn canonical_name(self) -> &'static str {
    match self {
      ContentType::MoviesSdr => "Movies-SDR",
      ContentType::MoviesHdr10 => "Movies-HDR10",
      ContentType::MoviesDolbyVision => "Movies-DolbyVision",
      ContentType::Gaming => "Gaming",
      ContentType::Sports => "Sports",
      ContentType::TvShows => "TVShows",
    }
  }

  /// Display name lowercased with whitespace runs replaced by hyphens
  pub fn slug(self) -> String {
    self.display_name().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
  }
}

impl fmt::Display for ContentType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}

impl FromStr for ContentType {
  type Err = CalibrationError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let trimmed = value.trim();
    ContentType::ALL
      .into_iter()
      .find(|content_type| {
        trimmed.eq_ignore_ascii_case(content_type.display_name())
          || trimmed.eq_ignore_ascii_case(content_type.key())
          || trimmed.eq_ignore_ascii_case(content_type.canonical_name())
      })
      .ok_or_else(|| CalibrationError::unknown_content_type(value))
  }
}

impl Serialize for ContentType {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.display_name())
  }
}

impl<'de> Deserialize<'de> for ContentType {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvModel {
  pub id: String,
  pub brand_id: String,
  pub model_number: String,
  pub model_name: String,
  pub year: i32,
  pub panel_type: String,
  pub hdr_support: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rtings_rating: Option<f64>,
  /// Set only for records that originate from the community source
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
}

/// One calibration preset. Slider values are kept exactly as the source
/// wrote them, fractional or out of range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSetting {
  pub id: String,
  pub tv_model_id: String,
  pub content_type: ContentType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub picture_mode: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub brightness: Option<Number>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contrast: Option<Number>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color: Option<Number>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sharpness: Option<Number>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub backlight: Option<Number>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color_temperature: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gamma: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub motion_settings: Option<String>,
  pub source: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating: Option<f64>,
  pub verified_date: DateTime<Utc>,
}

impl CalibrationSetting {
  /// Composite key that must be unique across the final database
  pub fn slot(&self) -> (&str, ContentType) {
    (&self.tv_model_id, self.content_type)
  }
}

/// Aggregate counts derived from a finished database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
  pub total_models: usize,
  pub total_settings: usize,
  pub models_by_brand: BTreeMap<String, usize>,
  pub models_by_year: BTreeMap<i32, usize>,
  pub settings_by_content_type: BTreeMap<String, usize>,
  pub settings_by_source: BTreeMap<String, usize>,
  pub coverage_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
  pub version: String,
  pub last_updated: DateTime<Utc>,
  pub sources: Vec<String>,
  pub tv_models: Vec<TvModel>,
  pub calibration_settings: Vec<CalibrationSetting>,
  #[serde(default)]
  pub statistics: Statistics,
}
