//! End-to-end database generation
//!
//! Load → normalize → merge → dedupe → statistics → validate → write. Fatal
//! errors stop the run before anything is written.

use std::path::PathBuf;

use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::merge::{dedupe_models, dedupe_settings, merge_sources};
use crate::model::Database;
use crate::sources::{load_source, CommunityData, NormalizedSource, ProfessionalData};
use crate::statistics;
use crate::validate::{self, ValidationReport};
use crate::writer::write_database;

/// Counts of what each source contributed before deduplication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSummary {
  pub name: String,
  pub found: bool,
  pub models: usize,
  pub settings: usize,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct GenerationReport {
  pub database: Database,
  pub validation: ValidationReport,
  pub sources: Vec<SourceSummary>,
  pub output: PathBuf,
}

pub struct DatabaseGenerator<C: Clock> {
  config: Config,
  clock: C,
}

impl<C: Clock> DatabaseGenerator<C> {
  pub fn new(config: Config, clock: C) -> Self {
    Self { config, clock }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Build the database in memory without validating or writing it
  pub fn build(&self) -> Result<(Database, Vec<SourceSummary>)> {
    let professional = &self.config.professional;
    let community = &self.config.community;

    let professional_data: Option<ProfessionalData> = load_source(&professional.path, &professional.name)?;
    let community_data: Option<CommunityData> = load_source(&community.path, &community.name)?;

    let professional_found = professional_data.is_some();
    let community_found = community_data.is_some();
    let normalized_professional =
      professional_data.map(|data| data.normalize(professional, &self.clock)).unwrap_or_default();
    let normalized_community =
      community_data.map(|data| data.normalize(community, &self.clock)).unwrap_or_default();

    let summaries = vec![
      summarize(&professional.name, professional_found, &normalized_professional),
      summarize(&community.name, community_found, &normalized_community),
    ];
    for summary in &summaries {
      tracing::info!(
        source = %summary.name,
        models = summary.models,
        settings = summary.settings,
        "processing source"
      );
    }

    // Professional data goes first: model dedup keeps the first record seen
    let merged = merge_sources([normalized_professional, normalized_community]);
    let tv_models = dedupe_models(merged.models);
    let calibration_settings = dedupe_settings(merged.settings, &professional.name);
    let statistics = statistics::calculate(&tv_models, &calibration_settings, &professional.name);

    let database = Database {
      version: self.config.version.clone(),
      last_updated: self.clock.now(),
      sources: self.config.source_names(),
      tv_models,
      calibration_settings,
      statistics,
    };

    Ok((database, summaries))
  }

  /// Build, validate and persist the database
  pub fn generate(&self) -> Result<GenerationReport> {
    tracing::info!("starting database generation");
    let (database, sources) = self.build()?;
    let validation = validate::validate(&database)?;
    write_database(&database, &self.config.output)?;

    Ok(GenerationReport { database, validation, sources, output: self.config.output.clone() })
  }
}

fn summarize(name: &str, found: bool, source: &NormalizedSource) -> SourceSummary {
  SourceSummary {
    name: name.to_string(),
    found,
    models: source.models.len(),
    settings: source.settings.len(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::FixedClock;
  use crate::error::CalibrationError;
  use crate::model::ContentType;
  use chrono::{TimeZone, Utc};
  use std::fs;
  use std::path::Path;
  use tempfile::TempDir;

  fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 7, 4, 10, 0, 0).unwrap())
  }

  fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.professional.path = dir.join("rtings-raw.json");
    config.community.path = dir.join("avs-forum-raw.json");
    config.output = dir.join("out").join("calibrations.json");
    config
  }

  #[test]
  fn test_no_sources_produces_empty_database() {
    let temp_dir = TempDir::new().unwrap();
    let generator = DatabaseGenerator::new(config_in(temp_dir.path()), clock());

    let report = generator.generate().unwrap();
    assert!(report.database.tv_models.is_empty());
    assert_eq!(report.database.statistics.coverage_percentage, 0);
    assert!(!report.sources[0].found);
    assert!(report.output.exists());
  }

  #[test]
  fn test_corrupt_source_aborts_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    fs::write(&config.community.path, "not json").unwrap();

    let err = DatabaseGenerator::new(config.clone(), clock()).generate().unwrap_err();
    assert!(matches!(err, CalibrationError::CorruptSource { .. }));
    assert!(!config.output.exists());
  }

  #[test]
  fn test_build_stamps_clock_and_sources() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(temp_dir.path());
    fs::write(
      &config.community.path,
      r#"{ "calibrations": [
        { "tv_model_id": "hisense-u7k", "brand": "hisense", "model_name": "Hisense U7K (2023)",
          "content_type": "Gaming", "settings": { "brightness": 50 }, "source": "AVS Forum User: ULEDGamer", "rating": 4.2 }
      ] }"#,
    )
    .unwrap();

    let (database, summaries) = DatabaseGenerator::new(config, clock()).build().unwrap();
    assert_eq!(database.last_updated, clock().now());
    assert_eq!(database.sources, vec!["RTINGS".to_string(), "AVS Forum".to_string()]);
    assert_eq!(database.calibration_settings[0].verified_date, clock().now());
    assert_eq!(database.calibration_settings[0].content_type, ContentType::Gaming);
    assert_eq!(summaries[1], SourceSummary { name: "AVS Forum".to_string(), found: true, models: 1, settings: 1 });
  }
}
