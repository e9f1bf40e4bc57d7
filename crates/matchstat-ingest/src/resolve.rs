//! Identity resolver: maps the verbatim identity fields of a draft onto a
//! durable entity id.
//!
//! Lookup order is source id, then name. For players the name path is only
//! taken inside a known team and season; without that context a name alone
//! is never trusted. When the name path succeeds for a row that carried a
//! source id, the id is staged as a new mapping and committed together with
//! the record write.

use matchstat_core::{
  identity::{EntityKind, IdentityLookup, IdentityMapping, IdentityQuery, LookupPath},
  ids::SeasonId,
  record::RowIdentity,
  store::MatchStore,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Why a row could not be tied to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
  /// Neither the source id nor the name matched anything.
  NotFound,
  /// The name matched several entities.
  Ambiguous { candidates: Vec<Uuid> },
  /// The source id is unknown and the row's team could not be resolved, so
  /// the name path had no context.
  TeamUnknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  Resolved {
    entity_id: Uuid,
    via:       LookupPath,
    /// Mapping to commit with the record, if the row brought a new source id.
    staged:    Option<IdentityMapping>,
  },
  Unresolved(UnresolvedReason),
}

impl Resolution {
  pub fn entity_id(&self) -> Option<Uuid> {
    match self {
      Self::Resolved { entity_id, .. } => Some(*entity_id),
      Self::Unresolved(_) => None,
    }
  }
}

/// Resolve one row identity. `team` is the resolved team of the table the
/// row came from; it is ignored for team rows.
pub fn resolve<S: MatchStore>(
  store: &S,
  identity: &RowIdentity,
  team: Option<Uuid>,
  season: SeasonId,
) -> Result<Resolution, S::Error> {
  let mut query = IdentityQuery::new(identity.kind);
  if let Some(id) = &identity.source_id {
    query = query.source_id(id.clone());
  }

  let name_context = match identity.kind {
    EntityKind::Team => true,
    EntityKind::Player => match team {
      Some(team) => {
        query = query.team(team).season(season);
        true
      }
      None => false,
    },
  };
  if name_context {
    query = query.name(identity.display_name.as_str());
  }

  let resolution = match store.lookup_identity(&query)? {
    IdentityLookup::Found { entity_id, via } => {
      let staged = match (via, &identity.source_id) {
        (LookupPath::Name, Some(source_id)) => Some(IdentityMapping {
          source_id: source_id.clone(),
          entity_id,
        }),
        _ => None,
      };
      Resolution::Resolved { entity_id, via, staged }
    }
    IdentityLookup::NotFound if !name_context => {
      Resolution::Unresolved(UnresolvedReason::TeamUnknown)
    }
    IdentityLookup::NotFound => Resolution::Unresolved(UnresolvedReason::NotFound),
    IdentityLookup::Ambiguous(candidates) => {
      Resolution::Unresolved(UnresolvedReason::Ambiguous { candidates })
    }
  };

  debug!(
    kind = %identity.kind,
    name = %identity.display_name,
    source_id = ?identity.source_id,
    ?resolution,
    "resolved identity"
  );
  Ok(resolution)
}

#[cfg(test)]
mod tests {
  use matchstat_core::{identity::NewEntity, ids::SourceId};
  use matchstat_store_sqlite::SqliteStore;

  use super::*;

  fn sid(s: &str) -> SourceId { SourceId::parse(s).unwrap() }

  fn player(name: &str, source_id: Option<&str>) -> RowIdentity {
    RowIdentity {
      kind:         EntityKind::Player,
      display_name: name.into(),
      source_id:    source_id.map(sid),
    }
  }

  fn team(store: &SqliteStore, name: &str, source_id: &str) -> Uuid {
    store
      .register_entity(
        NewEntity::new(EntityKind::Team, name).with_source_id(sid(source_id)),
      )
      .unwrap()
      .entity_id
  }

  #[test]
  fn known_source_id_resolves_without_staging() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jane = store
      .register_entity(
        NewEntity::new(EntityKind::Player, "Jane Doe").with_source_id(sid("a1b2c3d4")),
      )
      .unwrap();

    let res = resolve(&store, &player("Jane Doe", Some("a1b2c3d4")), None, 2022).unwrap();
    assert_eq!(res, Resolution::Resolved {
      entity_id: jane.entity_id,
      via:       LookupPath::SourceId,
      staged:    None,
    });
  }

  #[test]
  fn name_fallback_stages_the_new_source_id() {
    let store = SqliteStore::open_in_memory().unwrap();
    let x_fc = team(&store, "X FC", "0000aaaa");
    let jane = store
      .register_entity(
        NewEntity::new(EntityKind::Player, "Jane Doe").with_affiliation(x_fc, 2022),
      )
      .unwrap();

    let res =
      resolve(&store, &player("Jane Doe", Some("a1b2c3d4")), Some(x_fc), 2022).unwrap();
    assert_eq!(res, Resolution::Resolved {
      entity_id: jane.entity_id,
      via:       LookupPath::Name,
      staged:    Some(IdentityMapping {
        source_id: sid("a1b2c3d4"),
        entity_id: jane.entity_id,
      }),
    });
    // Staged only; nothing committed yet.
    assert!(store.mappings_for(jane.entity_id).unwrap().is_empty());
  }

  #[test]
  fn name_without_team_context_is_not_trusted() {
    let store = SqliteStore::open_in_memory().unwrap();
    let x_fc = team(&store, "X FC", "0000aaaa");
    store
      .register_entity(
        NewEntity::new(EntityKind::Player, "Jane Doe").with_affiliation(x_fc, 2022),
      )
      .unwrap();

    let res = resolve(&store, &player("Jane Doe", Some("a1b2c3d4")), None, 2022).unwrap();
    assert_eq!(res, Resolution::Unresolved(UnresolvedReason::TeamUnknown));
  }

  #[test]
  fn other_season_does_not_match() {
    let store = SqliteStore::open_in_memory().unwrap();
    let x_fc = team(&store, "X FC", "0000aaaa");
    store
      .register_entity(
        NewEntity::new(EntityKind::Player, "Jane Doe").with_affiliation(x_fc, 2021),
      )
      .unwrap();

    let res = resolve(&store, &player("Jane Doe", None), Some(x_fc), 2022).unwrap();
    assert_eq!(res, Resolution::Unresolved(UnresolvedReason::NotFound));
  }

  #[test]
  fn duplicate_names_are_ambiguous() {
    let store = SqliteStore::open_in_memory().unwrap();
    let x_fc = team(&store, "X FC", "0000aaaa");
    let mut ids = Vec::new();
    for _ in 0..2 {
      ids.push(
        store
          .register_entity(
            NewEntity::new(EntityKind::Player, "Jane Doe").with_affiliation(x_fc, 2022),
          )
          .unwrap()
          .entity_id,
      );
    }

    let res = resolve(&store, &player("Jane Doe", None), Some(x_fc), 2022).unwrap();
    let mut candidates = match res {
      Resolution::Unresolved(UnresolvedReason::Ambiguous { candidates }) => candidates,
      other => panic!("expected ambiguity, got {other:?}"),
    };
    candidates.sort();
    ids.sort();
    assert_eq!(candidates, ids);
  }

  #[test]
  fn teams_resolve_by_name_alone() {
    let store = SqliteStore::open_in_memory().unwrap();
    let x_fc = store
      .register_entity(NewEntity::new(EntityKind::Team, "X FC"))
      .unwrap()
      .entity_id;

    let identity = RowIdentity {
      kind:         EntityKind::Team,
      display_name: "x fc".into(),
      source_id:    Some(sid("0000aaaa")),
    };
    let res = resolve(&store, &identity, None, 2022).unwrap();
    assert_eq!(res.entity_id(), Some(x_fc));
    assert!(matches!(res, Resolution::Resolved { staged: Some(_), .. }));
  }
}
