use std::collections::{BTreeMap, HashSet};

use crate::model::{CalibrationSetting, Statistics, TvModel};

pub const COMMUNITY_BUCKET: &str = "Community";

/// Aggregate counts over a deduplicated database.
///
/// `professional_tag` names the source bucket: any setting whose source
/// contains it counts toward that bucket, everything else is community.
pub fn calculate(models: &[TvModel], settings: &[CalibrationSetting], professional_tag: &str) -> Statistics {
  let mut models_by_brand = BTreeMap::new();
  let mut models_by_year = BTreeMap::new();
  for model in models {
    *models_by_brand.entry(model.brand_id.clone()).or_insert(0) += 1;
    *models_by_year.entry(model.year).or_insert(0) += 1;
  }

  let mut settings_by_content_type = BTreeMap::new();
  let mut settings_by_source =
    BTreeMap::from([(professional_tag.to_string(), 0), (COMMUNITY_BUCKET.to_string(), 0)]);
  for setting in settings {
    *settings_by_content_type.entry(setting.content_type.display_name().to_string()).or_insert(0) += 1;

    let bucket = if setting.source.contains(professional_tag) { professional_tag } else { COMMUNITY_BUCKET };
    *settings_by_source.entry(bucket.to_string()).or_insert(0) += 1;
  }

  Statistics {
    total_models: models.len(),
    total_settings: settings.len(),
    models_by_brand,
    models_by_year,
    settings_by_content_type,
    settings_by_source,
    coverage_percentage: coverage_percentage(models, settings),
  }
}

/// Percentage of models referenced by at least one setting, 0 when there are
/// no models
pub fn coverage_percentage(models: &[TvModel], settings: &[CalibrationSetting]) -> u32 {
  if models.is_empty() {
    return 0;
  }

  let covered: HashSet<&str> = settings.iter().map(|setting| setting.tv_model_id.as_str()).collect();
  (100.0 * covered.len() as f64 / models.len() as f64).round() as u32
}
