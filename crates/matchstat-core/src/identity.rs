//! Durable entity identities and the lookup vocabulary of the reference store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::ids::{SeasonId, SourceId};

/// What a durable identity refers to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Player,
  Team,
}

/// A player or team known to the reference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
  pub entity_id:    Uuid,
  pub kind:         EntityKind,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

/// A source-site identifier bound to a durable identity. Many mappings may
/// point at one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityMapping {
  pub source_id: SourceId,
  pub entity_id: Uuid,
}

/// An entity played for `team_id` during `season`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Affiliation {
  pub team_id: Uuid,
  pub season:  SeasonId,
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Parameters for [`MatchStore::lookup_identity`].
///
/// The source id is tried first. The name path only runs when it is absent
/// or unknown; for players it is constrained by `team` and `season`.
///
/// [`MatchStore::lookup_identity`]: crate::store::MatchStore::lookup_identity
#[derive(Debug, Clone)]
pub struct IdentityQuery {
  pub kind:      EntityKind,
  pub source_id: Option<SourceId>,
  pub name:      Option<String>,
  pub team:      Option<Uuid>,
  pub season:    Option<SeasonId>,
}

impl IdentityQuery {
  pub fn new(kind: EntityKind) -> Self {
    Self { kind, source_id: None, name: None, team: None, season: None }
  }

  pub fn source_id(mut self, id: SourceId) -> Self {
    self.source_id = Some(id);
    self
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn team(mut self, team: Uuid) -> Self {
    self.team = Some(team);
    self
  }

  pub fn season(mut self, season: SeasonId) -> Self {
    self.season = Some(season);
    self
  }
}

/// Which evidence a successful lookup rested on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPath {
  SourceId,
  /// Display name (plus team and season where given).
  Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityLookup {
  Found { entity_id: Uuid, via: LookupPath },
  NotFound,
  /// More than one entity matched the name path. Never resolved
  /// automatically.
  Ambiguous(Vec<Uuid>),
}

// ─── Registration & merge ────────────────────────────────────────────────────

/// Input for [`MatchStore::register_entity`].
///
/// [`MatchStore::register_entity`]: crate::store::MatchStore::register_entity
#[derive(Debug, Clone)]
pub struct NewEntity {
  pub kind:         EntityKind,
  pub display_name: String,
  pub source_id:    Option<SourceId>,
  pub affiliation:  Option<Affiliation>,
}

impl NewEntity {
  pub fn new(kind: EntityKind, display_name: impl Into<String>) -> Self {
    Self {
      kind,
      display_name: display_name.into(),
      source_id: None,
      affiliation: None,
    }
  }

  pub fn with_source_id(mut self, id: SourceId) -> Self {
    self.source_id = Some(id);
    self
  }

  pub fn with_affiliation(mut self, team_id: Uuid, season: SeasonId) -> Self {
    self.affiliation = Some(Affiliation { team_id, season });
    self
  }
}

/// What [`MatchStore::merge_identities`] moved.
///
/// [`MatchStore::merge_identities`]: crate::store::MatchStore::merge_identities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
  pub mappings_moved:     usize,
  pub affiliations_moved: usize,
  /// Records re-pointed at the kept identity.
  pub records_moved:      usize,
  /// Records folded into an existing record of the kept identity.
  pub records_merged:     usize,
}
