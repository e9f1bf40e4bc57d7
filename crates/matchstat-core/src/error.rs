//! Error types for `matchstat-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid match id {0:?}: expected 8 lowercase hex characters")]
  InvalidMatchId(String),

  #[error("invalid source-site id {0:?}")]
  InvalidSourceId(String),

  #[error("unknown canonical field: {0:?}")]
  UnknownField(String),

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
