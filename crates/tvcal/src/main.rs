use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tvcal::{Config, ContentType, Criteria};

mod commands;

#[derive(Parser)]
#[command(name = "tvcal")]
#[command(about = "TV Calibration Pro - calibration database builder\nMerges professional and community picture settings into one database")]
#[command(version)]
struct Cli {
  /// Configuration file (default: .tvcal.json, tvcal.json or .tvcal/config.json)
  #[arg(short, long, global = true, env = "TVCAL_CONFIG")]
  config: Option<PathBuf>,

  /// More log output on stderr (-v info, -vv debug)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the calibration database from the raw sources
  Generate {
    /// Professional source file
    #[arg(long)]
    professional: Option<PathBuf>,
    /// Community source file
    #[arg(long)]
    community: Option<PathBuf>,
    /// Where to write the database
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Check an existing database for orphaned settings
  Validate {
    /// Database file (default: configured output)
    #[arg(short, long)]
    database: Option<PathBuf>,
  },
  /// Show database statistics
  Stats {
    /// Database file (default: configured output)
    #[arg(short, long)]
    database: Option<PathBuf>,
    /// Print the statistics as JSON
    #[arg(long)]
    json: bool,
  },
  /// Show the calibration settings of one TV model
  Lookup {
    /// TV model id, e.g. lg-c3-oled
    model_id: String,
    /// Only this content type (e.g. gaming, "Movies (HDR10)")
    #[arg(short = 't', long)]
    content_type: Option<ContentType>,
    /// Ignore the local cache
    #[arg(long)]
    refresh: bool,
  },
  /// Search TV models by name, model number or year
  Search {
    /// Search terms (space-separated)
    #[arg(required = true)]
    terms: Vec<String>,
    /// Ignore the local cache
    #[arg(long)]
    refresh: bool,
  },
  /// Models matching panel, HDR and year requirements, newest first
  Recommend {
    /// Panel type, e.g. OLED
    #[arg(long)]
    panel: Option<String>,
    /// Required HDR format, e.g. "Dolby Vision"
    #[arg(long)]
    hdr: Option<String>,
    #[arg(long)]
    min_year: Option<i32>,
  },
  /// Show how two models' settings differ for one content type
  Compare {
    model_a: String,
    model_b: String,
    #[arg(short = 't', long)]
    content_type: ContentType,
  },
  /// The models registered most often, or the newest when none are
  Popular {
    #[arg(short, long, default_value_t = 5)]
    limit: usize,
  },
  /// Write a model's settings to a portable settings file
  Export {
    model_id: String,
    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Read a settings file written by `export`
  Import { file: PathBuf },
  /// Manage your TVs
  Tvs {
    #[command(subcommand)]
    action: TvsCommand,
  },
  /// Inspect or clear the local database cache
  Cache {
    #[command(subcommand)]
    action: CacheCommand,
  },
}

#[derive(Subcommand)]
enum CacheCommand {
  /// Show whether the cached copy is behind the published database
  Status,
  /// Delete the cached copy
  Clear,
}

#[derive(Subcommand)]
enum TvsCommand {
  /// Register a TV you own
  Add {
    /// TV model id from the database
    model_id: String,
    #[arg(short, long)]
    nickname: String,
    #[arg(short, long)]
    room: Option<String>,
    /// Screen size in inches
    #[arg(short, long)]
    screen_size: Option<u32>,
  },
  /// List registered TVs
  List,
  /// Remove a registered TV
  Remove { id: String },
  /// Show the calibration report for a registered TV
  Report { id: String },
  /// Mark a registered TV as calibrated
  Calibrate { id: String },
  /// How many registered TVs are calibrated
  Stats {
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  tvcal::logging::init_logging(cli.verbose);

  let mut config = match &cli.config {
    Some(path) => Config::load_from_file(path)?,
    None => Config::load()?,
  };

  match cli.command {
    Commands::Generate { professional, community, output } => {
      if let Some(path) = professional {
        config.professional.path = path;
      }
      if let Some(path) = community {
        config.community.path = path;
      }
      if let Some(path) = output {
        config.output = path;
      }
      commands::generate(config)?;
    }
    Commands::Validate { database } => {
      commands::validate_database(&database.unwrap_or(config.output))?;
    }
    Commands::Stats { database, json } => {
      commands::show_stats(&database.unwrap_or(config.output), json)?;
    }
    Commands::Lookup { model_id, content_type, refresh } => {
      commands::lookup(&config, &model_id, content_type, refresh)?;
    }
    Commands::Search { terms, refresh } => {
      commands::search(&config, &terms, refresh)?;
    }
    Commands::Recommend { panel, hdr, min_year } => {
      let criteria = Criteria { panel_type: panel, hdr_support: hdr, min_year };
      commands::recommend(&config, &criteria)?;
    }
    Commands::Compare { model_a, model_b, content_type } => {
      commands::compare(&config, &model_a, &model_b, content_type)?;
    }
    Commands::Popular { limit } => commands::popular(&config, limit)?,
    Commands::Export { model_id, output } => commands::export(&config, &model_id, output.as_deref())?,
    Commands::Import { file } => commands::import(&file)?,
    Commands::Tvs { action } => match action {
      TvsCommand::Add { model_id, nickname, room, screen_size } => {
        commands::add_tv(&config, &model_id, &nickname, room.as_deref(), screen_size)?;
      }
      TvsCommand::List => commands::list_tvs(&config)?,
      TvsCommand::Remove { id } => commands::remove_tv(&config, &id)?,
      TvsCommand::Report { id } => commands::report_tv(&config, &id)?,
      TvsCommand::Calibrate { id } => commands::calibrate_tv(&config, &id)?,
      TvsCommand::Stats { json } => commands::tv_stats(&config, json)?,
    },
    Commands::Cache { action } => match action {
      CacheCommand::Status => commands::cache_status(&config)?,
      CacheCommand::Clear => commands::clear_cache(&config)?,
    },
  }

  Ok(())
}
