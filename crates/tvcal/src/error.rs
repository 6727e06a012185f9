use std::path::PathBuf;
use thiserror::Error;

use crate::validate::OrphanedSetting;

pub type Result<T> = std::result::Result<T, CalibrationError>;

#[derive(Error, Debug)]
pub enum CalibrationError {
  #[error("Failed to read {source_name} data from {}: {error}", .path.display())]
  SourceRead {
    source_name: String,
    path: PathBuf,
    #[source]
    error: std::io::Error,
  },

  #[error("{source_name} data at {} is not valid: {error}", .path.display())]
  CorruptSource {
    source_name: String,
    path: PathBuf,
    #[source]
    error: serde_json::Error,
  },

  #[error("Database validation failed with {} error(s):\n{}", .orphans.len(), format_orphans(.orphans))]
  Validation { orphans: Vec<OrphanedSetting> },

  #[error("Failed to write database to {}: {error}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    error: std::io::Error,
  },

  #[error("Invalid configuration in {}: {message}", .path.display())]
  Config { path: PathBuf, message: String },

  #[error("Unknown content type '{value}'")]
  UnknownContentType { value: String },

  #[error("Unknown table '{name}'")]
  UnknownTable { name: String },

  #[error("Record {table}/{id} not found")]
  RecordNotFound { table: String, id: String },

  #[error("Record {table}/{id} already exists")]
  DuplicateRecord { table: String, id: String },

  #[error("Invalid record: {message}")]
  InvalidRecord { message: String },

  #[error("Invalid import format: expected a version and a settings list")]
  InvalidImport,

  #[error("Snapshot unavailable from {origin}: {message}")]
  SnapshotUnavailable { origin: String, message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl CalibrationError {
  pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
    Self::Config { path: path.into(), message: message.into() }
  }

  pub fn unknown_content_type(value: impl Into<String>) -> Self {
    Self::UnknownContentType { value: value.into() }
  }

  pub fn record_not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
    Self::RecordNotFound { table: table.into(), id: id.into() }
  }

  pub fn invalid_record(message: impl Into<String>) -> Self {
    Self::InvalidRecord { message: message.into() }
  }

  pub fn snapshot_unavailable(origin: impl Into<String>, message: impl Into<String>) -> Self {
    Self::SnapshotUnavailable { origin: origin.into(), message: message.into() }
  }
}

fn format_orphans(orphans: &[OrphanedSetting]) -> String {
  orphans
    .iter()
    .map(|orphan| format!("  - {orphan}"))
    .collect::<Vec<_>>()
    .join("\n")
}
