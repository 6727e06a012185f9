//! Generic record storage over the app's named tables
//!
//! Records are free-form JSON objects keyed by their `id` field. The trait is
//! what callers depend on; [`JsonFileStore`] keeps one JSON array per table on
//! disk and [`MemoryStore`] keeps everything in memory.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

use crate::catalog::CalibrationCatalog;
use crate::error::{CalibrationError, Result};
use crate::model::{CalibrationSetting, TvModel};
use crate::writer::write_json_atomic;

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  TvBrands,
  TvModels,
  CalibrationSettings,
  CalibrationGuides,
  UserTvs,
}

impl Table {
  pub const ALL: [Table; 5] =
    [Table::TvBrands, Table::TvModels, Table::CalibrationSettings, Table::CalibrationGuides, Table::UserTvs];

  pub fn name(self) -> &'static str {
    match self {
      Table::TvBrands => "tv_brands",
      Table::TvModels => "tv_models",
      Table::CalibrationSettings => "calibration_settings",
      Table::CalibrationGuides => "calibration_guides",
      Table::UserTvs => "user_tvs",
    }
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Table {
  type Err = CalibrationError;

  fn from_str(value: &str) -> Result<Self> {
    Table::ALL
      .into_iter()
      .find(|table| table.name() == value)
      .ok_or_else(|| CalibrationError::UnknownTable { name: value.to_string() })
  }
}

pub trait RecordStore {
  fn get_all(&self, table: Table) -> Result<Vec<Record>>;
  fn get(&self, table: Table, id: &str) -> Result<Option<Record>>;
  /// Insert a record, assigning an id when it has none
  fn create(&self, table: Table, record: Record) -> Result<Record>;
  /// Shallow-merge `patch` into an existing record; the id cannot change
  fn update(&self, table: Table, id: &str, patch: Record) -> Result<Record>;
  /// Returns whether a record was removed
  fn delete(&self, table: Table, id: &str) -> Result<bool>;
}

fn record_id(record: &Record) -> Option<&str> {
  record.get("id").and_then(Value::as_str)
}

fn insert_record(table: Table, rows: &mut Vec<Record>, mut record: Record) -> Result<Record> {
  match record.get("id") {
    None | Some(Value::Null) => {
      record.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
    }
    Some(Value::String(_)) => {}
    Some(other) => return Err(CalibrationError::invalid_record(format!("id must be a string, got {other}"))),
  }

  let id = record_id(&record).unwrap_or_default().to_string();
  if rows.iter().any(|row| record_id(row) == Some(id.as_str())) {
    return Err(CalibrationError::DuplicateRecord { table: table.to_string(), id });
  }

  rows.push(record.clone());
  Ok(record)
}

fn patch_record(table: Table, rows: &mut [Record], id: &str, patch: Record) -> Result<Record> {
  let row = rows
    .iter_mut()
    .find(|row| record_id(row) == Some(id))
    .ok_or_else(|| CalibrationError::record_not_found(table.name(), id))?;

  for (key, value) in patch {
    if key != "id" {
      row.insert(key, value);
    }
  }
  Ok(row.clone())
}

fn remove_record(rows: &mut Vec<Record>, id: &str) -> bool {
  let before = rows.len();
  rows.retain(|row| record_id(row) != Some(id));
  rows.len() != before
}

/// Tables persisted as `<dir>/<table>.json`
pub struct JsonFileStore {
  dir: PathBuf,
}

impl JsonFileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn table_path(&self, table: Table) -> PathBuf {
    self.dir.join(format!("{}.json", table.name()))
  }

  fn read_table(&self, table: Table) -> Result<Vec<Record>> {
    let path = self.table_path(table);
    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(error) => return Err(error.into()),
    };
    serde_json::from_str(&content).map_err(|error| CalibrationError::CorruptSource {
      source_name: table.to_string(),
      path,
      error,
    })
  }

  fn write_table(&self, table: Table, rows: &[Record]) -> Result<()> {
    write_json_atomic(rows, &self.table_path(table))
  }
}

impl RecordStore for JsonFileStore {
  fn get_all(&self, table: Table) -> Result<Vec<Record>> {
    self.read_table(table)
  }

  fn get(&self, table: Table, id: &str) -> Result<Option<Record>> {
    Ok(self.read_table(table)?.into_iter().find(|row| record_id(row) == Some(id)))
  }

  fn create(&self, table: Table, record: Record) -> Result<Record> {
    let mut rows = self.read_table(table)?;
    let created = insert_record(table, &mut rows, record)?;
    self.write_table(table, &rows)?;
    Ok(created)
  }

  fn update(&self, table: Table, id: &str, patch: Record) -> Result<Record> {
    let mut rows = self.read_table(table)?;
    let updated = patch_record(table, &mut rows, id, patch)?;
    self.write_table(table, &rows)?;
    Ok(updated)
  }

  fn delete(&self, table: Table, id: &str) -> Result<bool> {
    let mut rows = self.read_table(table)?;
    let removed = remove_record(&mut rows, id);
    if removed {
      self.write_table(table, &rows)?;
    }
    Ok(removed)
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RefCell<HashMap<Table, Vec<Record>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl RecordStore for MemoryStore {
  fn get_all(&self, table: Table) -> Result<Vec<Record>> {
    Ok(self.tables.borrow().get(&table).cloned().unwrap_or_default())
  }

  fn get(&self, table: Table, id: &str) -> Result<Option<Record>> {
    Ok(self.tables.borrow().get(&table).and_then(|rows| rows.iter().find(|row| record_id(row) == Some(id)).cloned()))
  }

  fn create(&self, table: Table, record: Record) -> Result<Record> {
    insert_record(table, self.tables.borrow_mut().entry(table).or_default(), record)
  }

  fn update(&self, table: Table, id: &str, patch: Record) -> Result<Record> {
    patch_record(table, self.tables.borrow_mut().entry(table).or_default(), id, patch)
  }

  fn delete(&self, table: Table, id: &str) -> Result<bool> {
    Ok(self.tables.borrow_mut().get_mut(&table).is_some_and(|rows| remove_record(rows, id)))
  }
}

/// Summary of one user TV and the calibrations available for it
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
  pub tv: TvSummary,
  pub model: Option<ModelSummary>,
  pub calibration: CalibrationStatus,
  pub settings: Vec<CalibrationSetting>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TvSummary {
  pub nickname: Option<String>,
  pub room: Option<String>,
  pub screen_size: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
  pub brand: String,
  pub name: String,
  pub year: i32,
  pub panel_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationStatus {
  pub calibrated: bool,
  pub date: Option<String>,
  pub available_settings: usize,
}

/// Build the report for the user TV `tv_id`
pub fn calibration_report(
  store: &impl RecordStore,
  catalog: &CalibrationCatalog,
  tv_id: &str,
) -> Result<CalibrationReport> {
  let tv = store
    .get(Table::UserTvs, tv_id)?
    .ok_or_else(|| CalibrationError::record_not_found(Table::UserTvs.name(), tv_id))?;
  let text = |key: &str| tv.get(key).and_then(Value::as_str).map(str::to_string);

  let model_id = text("tv_model_id").unwrap_or_default();
  let model = catalog.model(&model_id).map(|model| ModelSummary {
    brand: model.brand_id.clone(),
    name: model.model_name.clone(),
    year: model.year,
    panel_type: model.panel_type.clone(),
  });
  let settings: Vec<CalibrationSetting> = catalog.settings_for(&model_id).into_iter().cloned().collect();

  Ok(CalibrationReport {
    tv: TvSummary { nickname: text("nickname"), room: text("room"), screen_size: tv.get("screen_size").cloned() },
    model,
    calibration: CalibrationStatus {
      calibrated: tv.get("calibrated").and_then(Value::as_bool).unwrap_or(false),
      date: text("calibration_date"),
      available_settings: settings.len(),
    },
    settings,
  })
}

/// Flag a user TV as calibrated as of `now`
pub fn mark_calibrated(store: &impl RecordStore, tv_id: &str, now: DateTime<Utc>) -> Result<Record> {
  let mut patch = Record::new();
  patch.insert("calibrated".to_string(), Value::Bool(true));
  patch.insert("calibration_date".to_string(), Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)));
  let updated = store.update(Table::UserTvs, tv_id, patch)?;
  tracing::info!(tv_id, "marked TV as calibrated");
  Ok(updated)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalibrationStats {
  pub total_tvs: usize,
  pub calibrated_tvs: usize,
  pub uncalibrated_tvs: usize,
  /// Whole percent of registered TVs that are calibrated
  pub calibration_rate: u32,
}

pub fn calibration_stats(store: &impl RecordStore) -> Result<CalibrationStats> {
  let tvs = store.get_all(Table::UserTvs)?;
  if tvs.is_empty() {
    return Ok(CalibrationStats::default());
  }

  let total = tvs.len();
  let calibrated = tvs.iter().filter(|tv| tv.get("calibrated").and_then(Value::as_bool).unwrap_or(false)).count();
  Ok(CalibrationStats {
    total_tvs: total,
    calibrated_tvs: calibrated,
    uncalibrated_tvs: total - calibrated,
    calibration_rate: (calibrated as f64 / total as f64 * 100.0).round() as u32,
  })
}

/// The models users own most, most owned first.
///
/// Ties keep the order in which the models were first registered. Owned ids
/// missing from the catalog are skipped. With no registered TVs the newest
/// models stand in.
pub fn popular_models<'a>(
  store: &impl RecordStore,
  catalog: &'a CalibrationCatalog,
  limit: usize,
) -> Result<Vec<&'a TvModel>> {
  let tvs = store.get_all(Table::UserTvs)?;
  if tvs.is_empty() {
    let mut newest: Vec<&TvModel> = catalog.models().iter().collect();
    newest.sort_by(|a, b| b.year.cmp(&a.year));
    newest.truncate(limit);
    return Ok(newest);
  }

  let mut counts: Vec<(&str, usize)> = Vec::new();
  for model_id in tvs.iter().filter_map(|tv| tv.get("tv_model_id").and_then(Value::as_str)) {
    match counts.iter_mut().find(|(id, _)| *id == model_id) {
      Some((_, count)) => *count += 1,
      None => counts.push((model_id, 1)),
    }
  }
  counts.sort_by(|a, b| b.1.cmp(&a.1));

  Ok(counts.into_iter().take(limit).filter_map(|(id, _)| catalog.model(id)).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use serde_json::json;
  use tempfile::TempDir;

  fn record(value: Value) -> Record {
    match value {
      Value::Object(map) => map,
      other => panic!("not an object: {other}"),
    }
  }

  fn exercise_store(store: &impl RecordStore) {
    let created = store
      .create(Table::UserTvs, record(json!({ "nickname": "Den TV", "tv_model_id": "lg-c3" })))
      .unwrap();
    let id = record_id(&created).unwrap().to_string();
    assert_eq!(id.len(), 36);

    store.create(Table::UserTvs, record(json!({ "id": "bedroom", "nickname": "Bedroom" }))).unwrap();
    assert_eq!(store.get_all(Table::UserTvs).unwrap().len(), 2);
    assert!(store.get_all(Table::TvBrands).unwrap().is_empty());

    let err = store.create(Table::UserTvs, record(json!({ "id": "bedroom" }))).unwrap_err();
    assert!(matches!(err, CalibrationError::DuplicateRecord { .. }));

    let updated = store
      .update(Table::UserTvs, "bedroom", record(json!({ "id": "hijack", "calibrated": true })))
      .unwrap();
    assert_eq!(updated["id"], "bedroom");
    assert_eq!(updated["nickname"], "Bedroom");
    assert_eq!(updated["calibrated"], true);
    assert_eq!(store.get(Table::UserTvs, "bedroom").unwrap().unwrap()["calibrated"], true);

    let err = store.update(Table::UserTvs, "missing", Record::new()).unwrap_err();
    assert!(matches!(err, CalibrationError::RecordNotFound { .. }));

    assert!(store.delete(Table::UserTvs, "bedroom").unwrap());
    assert!(!store.delete(Table::UserTvs, "bedroom").unwrap());
    assert!(store.get(Table::UserTvs, "bedroom").unwrap().is_none());
    assert!(store.get(Table::UserTvs, &id).unwrap().is_some());
  }

  #[test]
  fn test_memory_store() {
    exercise_store(&MemoryStore::new());
  }

  #[test]
  fn test_json_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp_dir.path().join("tables"));
    exercise_store(&store);

    assert!(temp_dir.path().join("tables").join("user_tvs.json").exists());
    // A fresh handle sees the persisted rows
    let reopened = JsonFileStore::new(temp_dir.path().join("tables"));
    assert_eq!(reopened.get_all(Table::UserTvs).unwrap().len(), 1);
  }

  #[test]
  fn test_json_file_store_unreadable_table() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("user_tvs.json")).unwrap();

    let store = JsonFileStore::new(temp_dir.path());
    assert!(store.get_all(Table::TvBrands).unwrap().is_empty());
    assert!(matches!(store.get_all(Table::UserTvs), Err(CalibrationError::Io(_))));
  }

  #[test]
  fn test_rejects_non_string_id() {
    let err = MemoryStore::new().create(Table::TvBrands, record(json!({ "id": 7 }))).unwrap_err();
    assert!(matches!(err, CalibrationError::InvalidRecord { .. }));
  }

  fn catalog() -> CalibrationCatalog {
    let model = |id: &str, year: i32| TvModel {
      id: id.to_string(),
      brand_id: "acme".to_string(),
      model_number: "Unknown".to_string(),
      model_name: format!("Acme {id}"),
      year,
      panel_type: "LED".to_string(),
      hdr_support: "HDR10".to_string(),
      rtings_rating: None,
      source: None,
    };
    CalibrationCatalog::new(crate::model::Database {
      version: "1.0.0".to_string(),
      last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
      sources: vec![],
      tv_models: vec![model("a1", 2021), model("b2", 2023), model("c3", 2022), model("d4", 2020)],
      calibration_settings: vec![],
      statistics: Default::default(),
    })
  }

  fn own(store: &MemoryStore, model_id: &str, calibrated: bool) {
    store.create(Table::UserTvs, record(json!({ "tv_model_id": model_id, "calibrated": calibrated }))).unwrap();
  }

  #[test]
  fn test_mark_calibrated() {
    let store = MemoryStore::new();
    store.create(Table::UserTvs, record(json!({ "id": "den", "calibrated": false }))).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();

    let updated = mark_calibrated(&store, "den", now).unwrap();
    assert_eq!(updated["calibrated"], true);
    assert_eq!(updated["calibration_date"], "2024-06-15T09:30:00.000Z");
    assert_eq!(store.get(Table::UserTvs, "den").unwrap().unwrap()["calibrated"], true);

    assert!(matches!(mark_calibrated(&store, "attic", now), Err(CalibrationError::RecordNotFound { .. })));
  }

  #[test]
  fn test_calibration_stats() {
    let store = MemoryStore::new();
    assert_eq!(calibration_stats(&store).unwrap(), CalibrationStats::default());

    own(&store, "a1", true);
    own(&store, "a1", false);
    own(&store, "b2", false);
    let stats = calibration_stats(&store).unwrap();
    assert_eq!(stats.total_tvs, 3);
    assert_eq!(stats.calibrated_tvs, 1);
    assert_eq!(stats.uncalibrated_tvs, 2);
    assert_eq!(stats.calibration_rate, 33);

    own(&store, "c3", true);
    assert_eq!(calibration_stats(&store).unwrap().calibration_rate, 50);
  }

  #[test]
  fn test_popular_models_without_owners_are_newest() {
    let catalog = catalog();
    let ids: Vec<_> =
      popular_models(&MemoryStore::new(), &catalog, 3).unwrap().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["b2", "c3", "a1"]);
  }

  #[test]
  fn test_popular_models_ranked_by_ownership() {
    let catalog = catalog();
    let store = MemoryStore::new();
    own(&store, "d4", false);
    own(&store, "a1", false);
    own(&store, "ghost", false);
    own(&store, "ghost", false);
    own(&store, "a1", true);
    own(&store, "ghost", false);
    own(&store, "c3", false);

    let ids: Vec<_> = popular_models(&store, &catalog, 5).unwrap().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "d4", "c3"]);

    // The limit applies before unknown ids are dropped
    let ids: Vec<_> = popular_models(&store, &catalog, 2).unwrap().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["a1"]);
  }

  #[test]
  fn test_table_names_round_trip() {
    for table in Table::ALL {
      assert_eq!(table.name().parse::<Table>().unwrap(), table);
    }
    assert!("users".parse::<Table>().is_err());
  }
}
