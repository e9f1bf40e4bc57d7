//! Error types for the matchstat-html codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The document holds no table matching any statistics naming convention.
  /// Distinct from a table that was found but could not be read.
  #[error("document contains no statistics tables")]
  NoStatisticsTables,

  /// No registered signature matches the reconciled header. Fatal for that
  /// one table only.
  #[error("unrecognized schema in table {table_id} ({columns} columns)")]
  UnrecognizedSchema { table_id: String, columns: usize },

  #[error("invalid CSS selector: {0}")]
  Selector(String),

  #[error("invalid pattern: {0}")]
  Pattern(#[from] regex::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
