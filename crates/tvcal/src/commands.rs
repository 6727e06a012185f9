use anyhow::{anyhow, bail, Result};
use colored::*;
use serde_json::json;
use std::fs;
use std::path::Path;

use tvcal::clock::{Clock, SystemClock};
use tvcal::export::{export_settings, import_settings};
use tvcal::snapshot::{CachedSnapshot, FileSnapshotSource};
use tvcal::store::{calibration_report, calibration_stats, mark_calibrated, popular_models, Record, RecordStore, Table};
use tvcal::writer::read_database;
use tvcal::{
  validate, CalibrationCatalog, CalibrationSetting, Config, ContentType, Criteria, DatabaseGenerator, JsonFileStore,
  TvModel,
};

/// Run the full pipeline and print what it produced
pub fn generate(config: Config) -> Result<()> {
  let report = DatabaseGenerator::new(config, SystemClock).generate()?;
  let stats = &report.database.statistics;

  println!("{} Database written to {}", "✓".green(), report.output.display().to_string().cyan());
  for source in &report.sources {
    if source.found {
      println!("  {} {} models, {} settings", source.name.bold(), source.models, source.settings);
    } else {
      println!("  {} {}", source.name.bold(), "(not found, skipped)".dimmed());
    }
  }
  println!(
    "  {} models, {} settings, {}% coverage",
    stats.total_models, stats.total_settings, stats.coverage_percentage
  );

  if !report.validation.is_clean() {
    println!("{} {} model(s) without calibration settings", "⚠".yellow(), report.validation.warnings.len());
    for warning in &report.validation.warnings {
      println!("  - {}", warning.to_string().dimmed());
    }
  }
  Ok(())
}

pub fn validate_database(path: &Path) -> Result<()> {
  let database = read_database(path)?;
  let report = validate::validate(&database)?;

  println!(
    "{} {} is valid ({} models, {} settings)",
    "✓".green(),
    path.display().to_string().cyan(),
    database.tv_models.len(),
    database.calibration_settings.len()
  );
  for warning in &report.warnings {
    println!("{} {}", "⚠".yellow(), warning);
  }
  Ok(())
}

pub fn show_stats(path: &Path, as_json: bool) -> Result<()> {
  let database = read_database(path)?;
  let stats = &database.statistics;

  if as_json {
    println!("{}", serde_json::to_string_pretty(stats)?);
    return Ok(());
  }

  println!("{} v{} ({})", "Calibration database".bold(), database.version, database.last_updated.to_rfc3339());
  println!("  Models:   {}", stats.total_models);
  println!("  Settings: {}", stats.total_settings);
  println!("  Coverage: {}%", stats.coverage_percentage);

  print_counts("By brand", stats.models_by_brand.iter().map(|(k, v)| (k.to_string(), *v)));
  print_counts("By year", stats.models_by_year.iter().map(|(k, v)| (k.to_string(), *v)));
  print_counts("By content type", stats.settings_by_content_type.iter().map(|(k, v)| (k.to_string(), *v)));
  print_counts("By source", stats.settings_by_source.iter().map(|(k, v)| (k.to_string(), *v)));
  Ok(())
}

fn print_counts(title: &str, counts: impl Iterator<Item = (String, usize)>) {
  println!();
  println!("{}", title.bold());
  for (key, count) in counts {
    println!("  {:<24} {}", key, count);
  }
}

pub fn lookup(config: &Config, model_id: &str, content_type: Option<ContentType>, refresh: bool) -> Result<()> {
  let catalog = load_catalog(config, refresh)?;
  let model = catalog.model(model_id).ok_or_else(|| anyhow!("Unknown TV model '{model_id}'"))?;

  println!("{} {} ({})", model.model_name.bold(), model.model_number.dimmed(), model.year);
  println!("  {} panel, {}", model.panel_type, model.hdr_support);

  let settings: Vec<&CalibrationSetting> = match content_type {
    Some(content_type) => catalog.setting(model_id, content_type).into_iter().collect(),
    None => catalog.settings_for(model_id),
  };

  if settings.is_empty() {
    println!("No calibration settings found");
    return Ok(());
  }
  for setting in settings {
    print_setting(setting);
  }
  Ok(())
}

fn print_setting(setting: &CalibrationSetting) {
  println!();
  println!("{} {}", setting.content_type.to_string().yellow().bold(), format!("[{}]", setting.source).dimmed());

  let number = |value: &Option<serde_json::Number>| value.as_ref().map(|v| v.to_string());
  let rows = [
    ("Picture mode", setting.picture_mode.clone()),
    ("Brightness", number(&setting.brightness)),
    ("Contrast", number(&setting.contrast)),
    ("Color", number(&setting.color)),
    ("Sharpness", number(&setting.sharpness)),
    ("Backlight", number(&setting.backlight)),
    ("Color temp", setting.color_temperature.clone()),
    ("Gamma", setting.gamma.clone()),
    ("Motion", setting.motion_settings.clone()),
    ("Rating", setting.rating.map(|r| format!("{r:.1}"))),
  ];
  for (label, value) in rows {
    if let Some(value) = value {
      println!("  {:<14} {}", label, value);
    }
  }
}

pub fn search(config: &Config, terms: &[String], refresh: bool) -> Result<()> {
  let catalog = load_catalog(config, refresh)?;
  let query = terms.join(" ");
  let results = catalog.search(&query);

  if results.is_empty() {
    println!("No TV models found matching: {}", query);
    return Ok(());
  }

  for model in results {
    let covered = catalog.settings_for(&model.id).len();
    println!(
      "{} {} ({}) {}",
      model.id.cyan(),
      model.model_name,
      model.year,
      format!("{covered} setting(s)").dimmed()
    );
  }
  Ok(())
}

fn print_models(models: &[&TvModel], empty: &str) {
  if models.is_empty() {
    println!("{}", empty);
    return;
  }
  for model in models {
    println!(
      "{} {} ({}, {} {})",
      model.id.cyan(),
      model.model_name,
      model.year,
      model.panel_type,
      model.hdr_support.dimmed()
    );
  }
}

pub fn recommend(config: &Config, criteria: &Criteria) -> Result<()> {
  let catalog = load_catalog(config, false)?;
  print_models(&catalog.recommend(criteria), "No TV models match those requirements");
  Ok(())
}

pub fn compare(config: &Config, model_a: &str, model_b: &str, content_type: ContentType) -> Result<()> {
  let catalog = load_catalog(config, false)?;
  let setting_for = |model_id: &str| {
    catalog
      .setting(model_id, content_type)
      .ok_or_else(|| anyhow!("No {content_type} settings for '{model_id}'"))
  };
  let a = setting_for(model_a)?;
  let b = setting_for(model_b)?;

  let differences = CalibrationCatalog::compare(a, b);
  if differences.is_empty() {
    println!("{} {} settings are identical", "✓".green(), content_type);
    return Ok(());
  }

  println!("{:<18} {:<14} {}", "", model_a.bold(), model_b.bold());
  for difference in differences {
    println!(
      "{:<18} {:<14} {}",
      difference.field,
      difference.old.as_deref().unwrap_or("-"),
      difference.new.as_deref().unwrap_or("-")
    );
  }
  Ok(())
}

pub fn popular(config: &Config, limit: usize) -> Result<()> {
  let catalog = load_catalog(config, false)?;
  let models = popular_models(&store(config), &catalog, limit)?;
  print_models(&models, "No TV models in the database");
  Ok(())
}

pub fn export(config: &Config, model_id: &str, output: Option<&Path>) -> Result<()> {
  let catalog = load_catalog(config, false)?;
  if catalog.model(model_id).is_none() {
    bail!("Unknown TV model '{model_id}'");
  }
  let settings: Vec<CalibrationSetting> = catalog.settings_for(model_id).into_iter().cloned().collect();
  let exported = export_settings(&settings, SystemClock.now())?;

  match output {
    Some(path) => {
      fs::write(path, exported)?;
      println!("{} Exported {} setting(s) to {}", "✓".green(), settings.len(), path.display().to_string().cyan());
    }
    None => println!("{}", exported),
  }
  Ok(())
}

pub fn import(path: &Path) -> Result<()> {
  let content = fs::read_to_string(path)?;
  let settings = import_settings(&content)?;

  println!("{} Read {} setting(s) from {}", "✓".green(), settings.len(), path.display().to_string().cyan());
  for setting in &settings {
    println!();
    println!("{}", setting.tv_model_id.bold());
    print_setting(setting);
  }
  Ok(())
}

pub fn add_tv(
  config: &Config,
  model_id: &str,
  nickname: &str,
  room: Option<&str>,
  screen_size: Option<u32>,
) -> Result<()> {
  let catalog = load_catalog(config, false)?;
  if catalog.model(model_id).is_none() {
    bail!("Unknown TV model '{model_id}'");
  }

  let record = json!({
    "tv_model_id": model_id,
    "nickname": nickname,
    "room": room,
    "screen_size": screen_size,
    "calibrated": false,
    "created_at": SystemClock.now().to_rfc3339(),
  });
  let record: Record = serde_json::from_value(record)?;

  let created = store(config).create(Table::UserTvs, record)?;
  let id = created.get("id").and_then(|id| id.as_str()).unwrap_or_default();
  println!("{} Added {} ({})", "✓".green(), nickname.yellow(), id.cyan());
  Ok(())
}

pub fn list_tvs(config: &Config) -> Result<()> {
  let tvs = store(config).get_all(Table::UserTvs)?;
  if tvs.is_empty() {
    println!("No TVs registered");
    return Ok(());
  }

  let text = |tv: &Record, key: &str| tv.get(key).and_then(|v| v.as_str()).unwrap_or("-").to_string();
  for tv in &tvs {
    println!(
      "{} {} {} {}",
      text(tv, "id").cyan(),
      text(tv, "nickname").bold(),
      text(tv, "tv_model_id"),
      text(tv, "room").dimmed()
    );
  }
  Ok(())
}

pub fn remove_tv(config: &Config, id: &str) -> Result<()> {
  if !store(config).delete(Table::UserTvs, id)? {
    bail!("No TV with id '{id}'");
  }
  println!("{} Removed {}", "✓".green(), id.cyan());
  Ok(())
}

pub fn report_tv(config: &Config, id: &str) -> Result<()> {
  let catalog = load_catalog(config, false)?;
  let report = calibration_report(&store(config), &catalog, id)?;

  println!("{}", report.tv.nickname.as_deref().unwrap_or("Unnamed TV").bold());
  if let Some(room) = &report.tv.room {
    println!("  Room:        {}", room);
  }
  if let Some(size) = &report.tv.screen_size {
    println!("  Screen size: {}\"", size);
  }
  match &report.model {
    Some(model) => println!("  Model:       {} ({}, {} {})", model.name, model.brand, model.year, model.panel_type),
    None => println!("  Model:       {}", "not in database".red()),
  }

  let status = if report.calibration.calibrated { "calibrated".green() } else { "not calibrated".yellow() };
  match &report.calibration.date {
    Some(date) => println!("  Status:      {} on {}", status, date),
    None => println!("  Status:      {}", status),
  }
  println!("  Available:   {} setting(s)", report.calibration.available_settings);

  for setting in &report.settings {
    print_setting(setting);
  }
  Ok(())
}

pub fn calibrate_tv(config: &Config, id: &str) -> Result<()> {
  let updated = mark_calibrated(&store(config), id, SystemClock.now())?;
  let date = updated.get("calibration_date").and_then(|date| date.as_str()).unwrap_or_default();
  println!("{} Marked {} as calibrated ({})", "✓".green(), id.cyan(), date);
  Ok(())
}

pub fn tv_stats(config: &Config, as_json: bool) -> Result<()> {
  let stats = calibration_stats(&store(config))?;
  if as_json {
    println!("{}", serde_json::to_string_pretty(&stats)?);
    return Ok(());
  }

  println!("  TVs:          {}", stats.total_tvs);
  println!("  Calibrated:   {}", stats.calibrated_tvs);
  println!("  Uncalibrated: {}", stats.uncalibrated_tvs);
  println!("  Rate:         {}%", stats.calibration_rate);
  Ok(())
}

fn store(config: &Config) -> JsonFileStore {
  JsonFileStore::new(&config.store_dir)
}

pub fn cache_status(config: &Config) -> Result<()> {
  let cache = snapshot(config);
  let published = read_database(&config.output)?;

  if cache.is_stale(published.last_updated) {
    println!("{} Cache at {} is out of date", "⚠".yellow(), cache.cache_path().display());
  } else {
    println!("{} Cache at {} is current", "✓".green(), cache.cache_path().display());
  }
  Ok(())
}

pub fn clear_cache(config: &Config) -> Result<()> {
  let cache = snapshot(config);
  cache.clear()?;
  println!("{} Cleared {}", "✓".green(), cache.cache_path().display());
  Ok(())
}

fn snapshot(config: &Config) -> CachedSnapshot<FileSnapshotSource, SystemClock> {
  let source = FileSnapshotSource::new(&config.output);
  let snapshot = CachedSnapshot::new(source, SystemClock, &config.cache.dir, config.cache.ttl());
  if config.cache.enabled {
    snapshot
  } else {
    snapshot.disabled()
  }
}

fn load_catalog(config: &Config, refresh: bool) -> Result<CalibrationCatalog> {
  Ok(CalibrationCatalog::new(snapshot(config).load(refresh)?))
}
