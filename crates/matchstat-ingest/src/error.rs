//! Error type for the ingest pipeline.

use matchstat_core::ids::MatchId;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("extraction error: {0}")]
  Extract(#[from] matchstat_html::Error),

  /// A concurrent writer kept winning the race for one (match, entity) pair.
  /// Fatal for that record only.
  #[error(
    "persistence conflict on match {match_id}, entity {entity_id} after {attempts} attempts"
  )]
  PersistenceConflict {
    match_id:  MatchId,
    entity_id: Uuid,
    attempts:  u32,
    #[source]
    source:    Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
