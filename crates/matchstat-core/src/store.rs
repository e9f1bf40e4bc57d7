//! The `MatchStore` trait: reference-store reads and staged writes, and the
//! destination store for statistical records.
//!
//! Implemented by storage backends (e.g. `matchstat-store-sqlite`). The
//! ingest pipeline depends on this abstraction, not on any concrete backend.

use uuid::Uuid;

use crate::{
  identity::{Entity, IdentityLookup, IdentityMapping, IdentityQuery, MergeSummary, NewEntity},
  ids::MatchId,
  record::{StatRecord, StatWrite, UpsertOutcome},
};

/// Errors returned by a [`MatchStore`] backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when the failure came from a concurrent writer (a busy database
  /// or a lost uniqueness race) and the whole write may be retried.
  fn is_conflict(&self) -> bool;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the reference store and the destination store.
///
/// The two live behind one trait because a staged identity mapping must be
/// committed atomically with the record write that discovered it.
///
/// All methods are blocking. Implementations must be shareable across
/// threads so independent documents can be processed in parallel.
pub trait MatchStore: Send + Sync {
  type Error: StoreError;

  // ── Reference store ───────────────────────────────────────────────────

  /// Look up a durable identity: source id first, then the name path.
  fn lookup_identity(&self, query: &IdentityQuery) -> Result<IdentityLookup, Self::Error>;

  /// Create a new durable identity. This is the only way a new identity
  /// comes into existence; the pipeline never calls it on its own.
  ///
  /// Returns an error if `input.source_id` is already mapped.
  fn register_entity(&self, input: NewEntity) -> Result<Entity, Self::Error>;

  /// Retrieve an entity by id. Returns `None` if not found.
  fn get_entity(&self, id: Uuid) -> Result<Option<Entity>, Self::Error>;

  /// All source ids currently mapped to `id`.
  fn mappings_for(&self, id: Uuid) -> Result<Vec<IdentityMapping>, Self::Error>;

  // ── Destination store ─────────────────────────────────────────────────

  /// Insert or update the record for `(write.match_id, write.entity_id)` and
  /// commit `staged` mappings in the same transaction.
  ///
  /// An existing record keeps its `record_id`; only the fields present in
  /// `write.fields` are replaced.
  fn upsert_stat_record(
    &self,
    write: &StatWrite,
    staged: &[IdentityMapping],
  ) -> Result<UpsertOutcome, Self::Error>;

  fn get_stat_record(
    &self,
    match_id: &MatchId,
    entity_id: Uuid,
  ) -> Result<Option<StatRecord>, Self::Error>;

  /// Every record of one match, in no particular order.
  fn list_stat_records(&self, match_id: &MatchId) -> Result<Vec<StatRecord>, Self::Error>;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Fold `absorb` into `keep`: mappings, affiliations and records move
  /// over, colliding records are merged, and `absorb` is deleted. Runs in
  /// one transaction.
  ///
  /// Returns an error if either entity is missing, the kinds differ, or
  /// `keep == absorb`.
  fn merge_identities(&self, keep: Uuid, absorb: Uuid) -> Result<MergeSummary, Self::Error>;
}
