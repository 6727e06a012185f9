use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{CalibrationError, Result};
use crate::model::Database;

/// Serialize the database to `path` as pretty-printed JSON.
///
/// The file is written next to its destination and renamed into place, so a
/// reader never observes a half-written database.
pub fn write_database(database: &Database, path: &Path) -> Result<()> {
  write_json_atomic(database, path)?;
  tracing::info!(path = %path.display(), "database written");
  Ok(())
}

/// Read a previously generated database
pub fn read_database(path: &Path) -> Result<Database> {
  let content = fs::read_to_string(path).map_err(|error| CalibrationError::SourceRead {
    source_name: "database".to_string(),
    path: path.to_path_buf(),
    error,
  })?;
  serde_json::from_str(&content).map_err(|error| CalibrationError::CorruptSource {
    source_name: "database".to_string(),
    path: path.to_path_buf(),
    error,
  })
}

pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
  let write_err = |error| CalibrationError::Write { path: path.to_path_buf(), error };

  let parent = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent).map_err(write_err)?;

  let mut content = serde_json::to_string_pretty(value)?;
  content.push('\n');

  let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
  temp.write_all(content.as_bytes()).map_err(write_err)?;
  temp.as_file().sync_all().map_err(write_err)?;
  temp.persist(path).map_err(|e| write_err(e.error))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Statistics;
  use chrono::{TimeZone, Utc};
  use tempfile::TempDir;

  fn empty_database() -> Database {
    Database {
      version: "1.0.0".to_string(),
      last_updated: Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap(),
      sources: vec!["RTINGS".to_string(), "AVS Forum".to_string()],
      tv_models: vec![],
      calibration_settings: vec![],
      statistics: Statistics::default(),
    }
  }

  #[test]
  fn test_creates_missing_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("data").join("calibrations.json");

    write_database(&empty_database(), &path).unwrap();
    assert!(path.exists());

    let loaded = read_database(&path).unwrap();
    assert_eq!(loaded, empty_database());
  }

  #[test]
  fn test_output_is_pretty_snake_case_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("calibrations.json");

    write_database(&empty_database(), &path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n  \"last_updated\": \"2024-02-29T12:00:00Z\""));
    assert!(content.contains("\"calibration_settings\": []"));
    assert!(content.contains("\"coverage_percentage\": 0"));
  }

  #[test]
  fn test_overwrites_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("calibrations.json");
    fs::write(&path, "stale").unwrap();

    write_database(&empty_database(), &path).unwrap();
    assert!(read_database(&path).is_ok());
    // Only the final file remains in the directory
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
  }

  #[test]
  fn test_read_rejects_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("calibrations.json");
    fs::write(&path, "{").unwrap();

    assert!(matches!(read_database(&path), Err(CalibrationError::CorruptSource { .. })));
  }
}
