//! Read-side queries over a generated database snapshot

use serde::Serialize;
use serde_json::Number;
use std::cmp::Ordering;

use crate::model::{CalibrationSetting, ContentType, Database, Statistics, TvModel};

/// Filters for [`CalibrationCatalog::recommend`]
#[derive(Debug, Clone, Default)]
pub struct Criteria {
  pub panel_type: Option<String>,
  pub hdr_support: Option<String>,
  pub min_year: Option<i32>,
}

/// One field that differs between two settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingDifference {
  pub field: &'static str,
  pub old: Option<String>,
  pub new: Option<String>,
}

pub struct CalibrationCatalog {
  database: Database,
}

impl CalibrationCatalog {
  pub fn new(database: Database) -> Self {
    Self { database }
  }

  pub fn database(&self) -> &Database {
    &self.database
  }

  pub fn models(&self) -> &[TvModel] {
    &self.database.tv_models
  }

  pub fn statistics(&self) -> &Statistics {
    &self.database.statistics
  }

  pub fn model(&self, id: &str) -> Option<&TvModel> {
    self.database.tv_models.iter().find(|model| model.id == id)
  }

  pub fn models_by_brand(&self, brand_id: &str) -> Vec<&TvModel> {
    self.database.tv_models.iter().filter(|model| model.brand_id == brand_id).collect()
  }

  pub fn settings_for(&self, model_id: &str) -> Vec<&CalibrationSetting> {
    self.database.calibration_settings.iter().filter(|setting| setting.tv_model_id == model_id).collect()
  }

  pub fn setting(&self, model_id: &str, content_type: ContentType) -> Option<&CalibrationSetting> {
    self
      .database
      .calibration_settings
      .iter()
      .find(|setting| setting.tv_model_id == model_id && setting.content_type == content_type)
  }

  /// Models whose name, number and year contain every word of the query.
  ///
  /// Exact model-number matches come first, then newer models.
  pub fn search(&self, query: &str) -> Vec<&TvModel> {
    let query = query.trim().to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut matches: Vec<&TvModel> = self
      .database
      .tv_models
      .iter()
      .filter(|model| {
        let haystack = format!("{} {} {}", model.model_name, model.model_number, model.year).to_lowercase();
        words.iter().all(|word| haystack.contains(word))
      })
      .collect();

    if words.is_empty() {
      return matches;
    }

    matches.sort_by(|a, b| {
      let a_exact = a.model_number.to_lowercase() == query;
      let b_exact = b.model_number.to_lowercase() == query;
      match (a_exact, b_exact) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.year.cmp(&a.year),
      }
    });
    matches
  }

  /// Models matching every given criterion, newest first
  pub fn recommend(&self, criteria: &Criteria) -> Vec<&TvModel> {
    let mut matches: Vec<&TvModel> = self
      .database
      .tv_models
      .iter()
      .filter(|model| criteria.panel_type.as_ref().map_or(true, |panel| &model.panel_type == panel))
      .filter(|model| criteria.hdr_support.as_ref().map_or(true, |hdr| model.hdr_support.contains(hdr.as_str())))
      .filter(|model| criteria.min_year.map_or(true, |year| model.year >= year))
      .collect();

    matches.sort_by(|a, b| b.year.cmp(&a.year));
    matches
  }

  /// Fields that differ between two settings
  pub fn compare(a: &CalibrationSetting, b: &CalibrationSetting) -> Vec<SettingDifference> {
    let number = |value: &Option<Number>| value.as_ref().map(Number::to_string);
    let fields = [
      ("brightness", number(&a.brightness), number(&b.brightness)),
      ("contrast", number(&a.contrast), number(&b.contrast)),
      ("color", number(&a.color), number(&b.color)),
      ("sharpness", number(&a.sharpness), number(&b.sharpness)),
      ("backlight", number(&a.backlight), number(&b.backlight)),
      ("gamma", a.gamma.clone(), b.gamma.clone()),
      ("color_temperature", a.color_temperature.clone(), b.color_temperature.clone()),
    ];

    fields
      .into_iter()
      .filter(|(_, old, new)| old != new)
      .map(|(field, old, new)| SettingDifference { field, old, new })
      .collect()
  }
}
