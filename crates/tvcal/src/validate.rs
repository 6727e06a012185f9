//! Post-merge integrity and completeness checks

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::{CalibrationError, Result};
use crate::model::{ContentType, Database};

/// A setting whose model does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedSetting {
  pub setting_id: String,
  pub tv_model_id: String,
  pub content_type: ContentType,
}

impl fmt::Display for OrphanedSetting {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Orphaned calibration setting {} for model: {} ({})",
      self.setting_id, self.tv_model_id, self.content_type
    )
  }
}

/// A model no setting refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncoveredModel {
  pub id: String,
  pub model_name: String,
}

impl fmt::Display for UncoveredModel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Model without calibrations: {} ({})", self.model_name, self.id)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
  pub warnings: Vec<UncoveredModel>,
}

impl ValidationReport {
  pub fn is_clean(&self) -> bool {
    self.warnings.is_empty()
  }
}

/// Every setting must point at an existing model
pub fn find_orphans(database: &Database) -> Vec<OrphanedSetting> {
  let model_ids: HashSet<&str> = database.tv_models.iter().map(|model| model.id.as_str()).collect();
  database
    .calibration_settings
    .iter()
    .filter(|setting| !model_ids.contains(setting.tv_model_id.as_str()))
    .map(|setting| OrphanedSetting {
      setting_id: setting.id.clone(),
      tv_model_id: setting.tv_model_id.clone(),
      content_type: setting.content_type,
    })
    .collect()
}

/// Every model should have at least one setting
pub fn find_uncovered(database: &Database) -> Vec<UncoveredModel> {
  let covered: HashSet<&str> =
    database.calibration_settings.iter().map(|setting| setting.tv_model_id.as_str()).collect();
  database
    .tv_models
    .iter()
    .filter(|model| !covered.contains(model.id.as_str()))
    .map(|model| UncoveredModel { id: model.id.clone(), model_name: model.model_name.clone() })
    .collect()
}

/// Run both checks. Orphans are fatal and reported all at once; uncovered
/// models come back as warnings.
pub fn validate(database: &Database) -> Result<ValidationReport> {
  let orphans = find_orphans(database);
  if !orphans.is_empty() {
    for orphan in &orphans {
      tracing::error!("{orphan}");
    }
    return Err(CalibrationError::Validation { orphans });
  }

  let warnings = find_uncovered(database);
  for warning in &warnings {
    tracing::warn!("{warning}");
  }

  Ok(ValidationReport { warnings })
}
