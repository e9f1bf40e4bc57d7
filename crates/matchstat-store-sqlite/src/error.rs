//! Error type for `matchstat-store-sqlite`.

use matchstat_core::store::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] matchstat_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("decode error: {0}")]
  Decode(String),

  #[error("entity not found: {0}")]
  EntityNotFound(Uuid),

  #[error("source id {source_id} is already mapped to {entity_id}")]
  SourceIdTaken { source_id: String, entity_id: Uuid },

  #[error("cannot merge {absorb} into {keep}: entity kinds differ")]
  KindMismatch { keep: Uuid, absorb: Uuid },

  #[error("cannot merge an entity with itself")]
  SelfMerge,

  #[error("connection mutex poisoned")]
  Poisoned,
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool {
    match self {
      Self::Database(rusqlite::Error::SqliteFailure(e, _)) => {
        matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
          || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
      }
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
