//! Statistical records: drafts produced by the row normalizer, writes handed
//! to the destination store, and the persisted read model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  field::{FieldCoercionError, Observation},
  identity::EntityKind,
  ids::{MatchId, SeasonId, SourceId},
  schema::SchemaVersion,
};

/// Canonical field name → observation. Ordered so reports and stored rows are
/// deterministic.
pub type FieldMap = BTreeMap<String, Observation>;

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// The identity fields of a body row, extracted verbatim and left for the
/// identity resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIdentity {
  pub kind:         EntityKind,
  pub display_name: String,
  pub source_id:    Option<SourceId>,
}

/// One normalized row, before identity resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDraft {
  /// Identifier of the table the row came from.
  pub table_id:    String,
  pub version:     SchemaVersion,
  pub identity:    RowIdentity,
  /// Every field carried by `version` plus the category fields it does not
  /// track, the latter as `Null(NotTracked)`.
  pub fields:      FieldMap,
  pub diagnostics: Vec<FieldCoercionError>,
}

impl StatDraft {
  pub fn get(&self, field: &str) -> Option<&Observation> { self.fields.get(field) }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// A resolved draft, ready for [`MatchStore::upsert_stat_record`].
///
/// [`MatchStore::upsert_stat_record`]: crate::store::MatchStore::upsert_stat_record
#[derive(Debug, Clone, PartialEq)]
pub struct StatWrite {
  pub match_id:  MatchId,
  pub entity_id: Uuid,
  pub season:    SeasonId,
  /// Team the entity played for in this match, recorded as a season
  /// affiliation. `None` for team rows.
  pub team_id:   Option<Uuid>,
  /// Only these fields are written; fields already stored for the pair and
  /// absent here are left untouched.
  pub fields:    FieldMap,
}

/// Which branch of the upsert was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "record_id", rename_all = "snake_case")]
pub enum UpsertOutcome {
  Inserted(Uuid),
  Updated(Uuid),
}

impl UpsertOutcome {
  pub fn record_id(self) -> Uuid {
    match self {
      Self::Inserted(id) | Self::Updated(id) => id,
    }
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// One persisted player-in-match or team-in-match observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
  pub record_id:  Uuid,
  pub match_id:   MatchId,
  pub entity_id:  Uuid,
  pub season:     SeasonId,
  pub fields:     FieldMap,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl StatRecord {
  pub fn get(&self, field: &str) -> Option<&Observation> { self.fields.get(field) }
}
