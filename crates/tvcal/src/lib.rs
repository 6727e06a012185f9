//! Builds the TV calibration database from professional and community sources

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod snapshot;
pub mod sources;
pub mod statistics;
pub mod store;
pub mod validate;
pub mod writer;

pub use catalog::{CalibrationCatalog, Criteria};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{CalibrationError, Result};
pub use model::{CalibrationSetting, ContentType, Database, Statistics, TvModel};
pub use pipeline::{DatabaseGenerator, GenerationReport};
pub use store::{JsonFileStore, MemoryStore, RecordStore, Table};
