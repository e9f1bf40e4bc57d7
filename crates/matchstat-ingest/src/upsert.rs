//! Persistence upserter: one (match, entity) write with a bounded retry on
//! write conflicts.

use matchstat_core::{
  identity::IdentityMapping,
  record::{StatWrite, UpsertOutcome},
  store::{MatchStore, StoreError as _},
};
use tracing::warn;

use crate::{Error, Result};

/// Write `write` and its staged mappings in one store transaction.
///
/// A conflict (another writer holding the lock, or winning the insert race
/// for the same pair) is retried up to `retries` more times. The store rolls
/// the whole transaction back on failure, so a retry starts clean and
/// re-evaluates insert versus update.
pub fn upsert<S: MatchStore>(
  store: &S,
  write: &StatWrite,
  staged: &[IdentityMapping],
  retries: u32,
) -> Result<UpsertOutcome> {
  let mut attempt = 0;
  loop {
    attempt += 1;
    match store.upsert_stat_record(write, staged) {
      Ok(outcome) => return Ok(outcome),
      Err(e) if e.is_conflict() && attempt <= retries => {
        warn!(
          match_id = %write.match_id,
          entity_id = %write.entity_id,
          attempt,
          error = %e,
          "write conflict, retrying"
        );
      }
      Err(e) if e.is_conflict() => {
        return Err(Error::PersistenceConflict {
          match_id:  write.match_id.clone(),
          entity_id: write.entity_id,
          attempts:  attempt,
          source:    Box::new(e),
        });
      }
      Err(e) => return Err(Error::store(e)),
    }
  }
}

