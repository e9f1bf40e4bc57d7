//! Schema classifier: picks exactly one [`SchemaVersion`] for a reconciled
//! header, or rejects the table.
//!
//! [`SchemaVersion`]: matchstat_core::schema::SchemaVersion

use matchstat_core::{
  field::field,
  schema::{Era, Signature, StatCategory, signatures_for},
};
use tracing::debug;

use crate::{Error, Result};

/// Match `headers` against the signatures of `category`, most specific first.
///
/// A signature matches when the column count is within its tolerated range
/// and every required field resolves to some header. With an `era` hint,
/// signatures of other eras are not considered.
pub fn classify(
  table_id: &str,
  category: StatCategory,
  headers: &[String],
  era: Option<Era>,
) -> Result<&'static Signature> {
  let columns = headers.len();

  let found = signatures_for(category)
    .into_iter()
    .filter(|sig| era.is_none_or(|era| sig.era == era))
    .find(|sig| {
      sig.columns.contains(&columns)
        && sig.required.iter().all(|name| has_field(headers, name))
    });

  match found {
    Some(sig) => {
      debug!(table_id, columns, version = %sig.version, "classified table");
      Ok(sig)
    }
    None => Err(Error::UnrecognizedSchema {
      table_id: table_id.to_owned(),
      columns,
    }),
  }
}

fn has_field(headers: &[String], name: &str) -> bool {
  field(name).is_some_and(|f| headers.iter().any(|h| f.matches_header(h)))
}
