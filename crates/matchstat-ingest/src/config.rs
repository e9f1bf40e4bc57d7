//! Runtime configuration for the ingest pipeline.

use std::path::{Path, PathBuf};

use matchstat_core::schema::Era;
use serde::Deserialize;

use crate::Result;

/// Prefix of the environment variables layered over the config file, e.g.
/// `MATCHSTAT_DATABASE_PATH`.
pub const ENV_PREFIX: &str = "MATCHSTAT";

/// Pipeline configuration, deserialised from `matchstat.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
  /// SQLite file holding the reference and destination stores.
  pub database_path:    PathBuf,
  /// Era to assume for every document unless the caller passes one.
  pub schema_hint:      Option<Era>,
  /// Extra attempts for a record write that lost a race to another writer.
  pub conflict_retries: u32,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      database_path:    PathBuf::from("matchstat.db"),
      schema_hint:      None,
      conflict_retries: 1,
    }
  }
}

impl IngestConfig {
  /// Read `path` (if it exists) and then `MATCHSTAT_*` variables.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?;
    Ok(settings.try_deserialize()?)
  }
}
