//! Merging and deduplication of normalized sources
//!
//! Models and settings follow different rules. Models have no
//! trust hierarchy, so the first record seen for an id wins. Settings do: a
//! professional setting displaces a community one for the same slot no matter
//! which arrived first.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{CalibrationSetting, ContentType, TvModel};
use crate::sources::NormalizedSource;

/// Concatenated output of every source, in processing order
#[derive(Debug, Clone, Default)]
pub struct Merged {
  pub models: Vec<TvModel>,
  pub settings: Vec<CalibrationSetting>,
}

/// Union all sources, preserving the order they are given in
pub fn merge_sources<I>(sources: I) -> Merged
where
  I: IntoIterator<Item = NormalizedSource>,
{
  let mut merged = Merged::default();
  for source in sources {
    merged.models.extend(source.models);
    merged.settings.extend(source.settings);
  }
  merged
}

/// Keep the first model seen for each id, then sort by brand, newest year,
/// and name
pub fn dedupe_models(models: Vec<TvModel>) -> Vec<TvModel> {
  let mut seen = HashSet::new();
  let mut unique: Vec<TvModel> = models
    .into_iter()
    .filter(|model| {
      let first = seen.insert(model.id.clone());
      if !first {
        tracing::debug!(id = %model.id, "dropping duplicate model");
      }
      first
    })
    .collect();

  unique.sort_by(compare_models);
  unique
}

/// Keep one setting per (model, content type) slot, preferring the
/// professional source, then sort by model id and content type
pub fn dedupe_settings(settings: Vec<CalibrationSetting>, professional_tag: &str) -> Vec<CalibrationSetting> {
  let mut slots: HashMap<(String, ContentType), CalibrationSetting> = HashMap::new();

  for setting in settings {
    let (tv_model_id, content_type) = setting.slot();
    let key = (tv_model_id.to_string(), content_type);
    let occupant = slots.get(&key).map(|existing| existing.source.clone());
    match occupant {
      None => {
        slots.insert(key, setting);
      }
      Some(existing) if setting.source == professional_tag && existing != professional_tag => {
        tracing::debug!(
          tv_model_id = %key.0,
          content_type = %key.1,
          replaced = %existing,
          "professional setting replaces earlier one"
        );
        slots.insert(key, setting);
      }
      Some(_) => {
        tracing::debug!(id = %setting.id, "dropping duplicate setting");
      }
    }
  }

  let mut unique: Vec<CalibrationSetting> = slots.into_values().collect();
  unique.sort_by(compare_settings);
  unique
}

/// Case-insensitive ordering, ties broken by byte order
fn compare_text(a: &str, b: &str) -> Ordering {
  a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn compare_models(a: &TvModel, b: &TvModel) -> Ordering {
  compare_text(&a.brand_id, &b.brand_id)
    .then_with(|| b.year.cmp(&a.year))
    .then_with(|| compare_text(&a.model_name, &b.model_name))
}

fn compare_settings(a: &CalibrationSetting, b: &CalibrationSetting) -> Ordering {
  compare_text(&a.tv_model_id, &b.tv_model_id)
    .then_with(|| compare_text(a.content_type.display_name(), b.content_type.display_name()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};
  use serde_json::Number;

  fn model(id: &str, brand: &str, year: i32, name: &str) -> TvModel {
    TvModel {
      id: id.to_string(),
      brand_id: brand.to_string(),
      model_number: "Unknown".to_string(),
      model_name: name.to_string(),
      year,
      panel_type: "LED".to_string(),
      hdr_support: "HDR10".to_string(),
      rtings_rating: None,
      source: None,
    }
  }

  fn setting(model_id: &str, content_type: ContentType, source: &str, brightness: i32) -> CalibrationSetting {
    CalibrationSetting {
      id: format!("{source}-{model_id}-{}", content_type.slug()),
      tv_model_id: model_id.to_string(),
      content_type,
      picture_mode: None,
      brightness: Some(Number::from(brightness)),
      contrast: None,
      color: None,
      sharpness: None,
      backlight: None,
      color_temperature: None,
      gamma: None,
      motion_settings: None,
      source: source.to_string(),
      rating: None,
      verified_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn test_merge_preserves_source_order() {
    let first = NormalizedSource { models: vec![model("a", "lg", 2023, "A")], settings: vec![] };
    let second = NormalizedSource {
      models: vec![model("b", "lg", 2023, "B")],
      settings: vec![setting("b", ContentType::Gaming, "AVS", 1)],
    };

    let merged = merge_sources([first, second]);
    let ids: Vec<_> = merged.models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(merged.settings.len(), 1);
  }

  #[test]
  fn test_first_model_wins() {
    let mut professional = model("x1", "acme", 2023, "Acme Pro");
    professional.panel_type = "OLED".to_string();
    let mut community = model("x1", "acme", 2019, "Acme (2019)");
    community.source = Some("AVS Forum".to_string());

    let models = dedupe_models(vec![professional.clone(), community]);
    assert_eq!(models, vec![professional]);
  }

  #[test]
  fn test_models_sorted_by_brand_year_desc_name() {
    let models = dedupe_models(vec![
      model("s1", "sony", 2022, "Bravia"),
      model("l1", "lg", 2021, "C1"),
      model("l3", "lg", 2023, "G3"),
      model("l2", "lg", 2023, "C3"),
    ]);

    let ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["l2", "l3", "l1", "s1"]);
  }

  #[test]
  fn test_professional_setting_replaces_earlier_community_setting() {
    let settings = dedupe_settings(
      vec![
        setting("x1", ContentType::Gaming, "AVS Forum User: GamerPro", 10),
        setting("x1", ContentType::Gaming, "RTINGS", 52),
      ],
      "RTINGS",
    );

    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].source, "RTINGS");
    assert_eq!(settings[0].brightness, Some(Number::from(52)));
  }

  #[test]
  fn test_first_setting_wins_otherwise() {
    let settings = dedupe_settings(
      vec![
        setting("x1", ContentType::Sports, "RTINGS", 55),
        setting("x1", ContentType::Sports, "AVS Forum User: SportsWatcher", 60),
        setting("x1", ContentType::Sports, "RTINGS", 99),
        setting("x2", ContentType::Sports, "AVS Forum User: A", 1),
        setting("x2", ContentType::Sports, "AVS Forum User: B", 2),
      ],
      "RTINGS",
    );

    assert_eq!(settings.len(), 2);
    assert_eq!(settings[0].brightness, Some(Number::from(55)));
    assert_eq!(settings[1].brightness, Some(Number::from(1)));
  }

  #[test]
  fn test_model_ordering_ignores_case() {
    let models = dedupe_models(vec![
      model("t1", "tcl", 2023, "Q7"),
      model("s1", "Sony", 2023, "Bravia"),
      model("l1", "lg", 2023, "oled C3"),
      model("l2", "lg", 2023, "Nano"),
      model("l3", "LG", 2023, "B3"),
    ]);

    let ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["l3", "l2", "l1", "s1", "t1"]);
  }

  #[test]
  fn test_settings_sorted_by_model_then_content_type() {
    let settings = dedupe_settings(
      vec![
        setting("b", ContentType::Gaming, "RTINGS", 1),
        setting("a", ContentType::TvShows, "RTINGS", 1),
        setting("a", ContentType::MoviesSdr, "RTINGS", 1),
        setting("a", ContentType::Gaming, "RTINGS", 1),
        setting("a", ContentType::MoviesDolbyVision, "RTINGS", 1),
      ],
      "RTINGS",
    );

    let order: Vec<_> = settings.iter().map(|s| (s.tv_model_id.as_str(), s.content_type)).collect();
    assert_eq!(
      order,
      vec![
        ("a", ContentType::Gaming),
        ("a", ContentType::MoviesDolbyVision),
        ("a", ContentType::MoviesSdr),
        ("a", ContentType::TvShows),
        ("b", ContentType::Gaming),
      ]
    );
  }
}
