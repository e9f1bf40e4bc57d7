//! Integration tests for `SqliteStore` against an in-memory database.

use matchstat_core::{
  field::{FieldValue, NullReason, Observation},
  identity::{EntityKind, IdentityLookup, IdentityMapping, IdentityQuery, LookupPath, NewEntity},
  ids::{MatchId, SourceId},
  record::{FieldMap, StatWrite, UpsertOutcome},
  store::{MatchStore, StoreError},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

fn store() -> SqliteStore { SqliteStore::open_in_memory().expect("in-memory store") }

fn sid(s: &str) -> SourceId { SourceId::parse(s).unwrap() }

fn match_id() -> MatchId { MatchId::parse("414d2972").unwrap() }

fn int(n: i64) -> Observation { Observation::Measured(FieldValue::Integer(n)) }

fn fields(pairs: &[(&str, Observation)]) -> FieldMap {
  pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn write(entity_id: Uuid, team_id: Option<Uuid>, fields: FieldMap) -> StatWrite {
  StatWrite { match_id: match_id(), entity_id, season: 2022, team_id, fields }
}

/// A team plus one player affiliated with it in 2022.
fn team_and_player(s: &SqliteStore) -> (Uuid, Uuid) {
  let team = s
    .register_entity(NewEntity::new(EntityKind::Team, "X FC").with_source_id(sid("18bb7c10")))
    .unwrap();
  let player = s
    .register_entity(
      NewEntity::new(EntityKind::Player, "Jane Doe")
        .with_source_id(sid("0000aaaa"))
        .with_affiliation(team.entity_id, 2022),
    )
    .unwrap();
  (team.entity_id, player.entity_id)
}

// ─── Entities & lookup ───────────────────────────────────────────────────────

#[test]
fn register_and_get_entity() {
  let s = store();
  let entity = s
    .register_entity(NewEntity::new(EntityKind::Player, "  Jane Doe "))
    .unwrap();
  assert_eq!(entity.display_name, "Jane Doe");

  let fetched = s.get_entity(entity.entity_id).unwrap().unwrap();
  assert_eq!(fetched.entity_id, entity.entity_id);
  assert_eq!(fetched.kind, EntityKind::Player);
  assert!(s.get_entity(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn lookup_by_source_id() {
  let s = store();
  let (_, player) = team_and_player(&s);

  let found = s
    .lookup_identity(&IdentityQuery::new(EntityKind::Player).source_id(sid("0000AAAA")))
    .unwrap();
  assert_eq!(found, IdentityLookup::Found { entity_id: player, via: LookupPath::SourceId });

  // Source ids are scoped by kind.
  let as_team = s
    .lookup_identity(&IdentityQuery::new(EntityKind::Team).source_id(sid("0000aaaa")))
    .unwrap();
  assert_eq!(as_team, IdentityLookup::NotFound);
}

#[test]
fn lookup_by_name_team_and_season() {
  let s = store();
  let (team, player) = team_and_player(&s);

  let query = IdentityQuery::new(EntityKind::Player)
    .source_id(sid("a1b2c3d4"))
    .name("jane doe ")
    .team(team)
    .season(2022);
  assert_eq!(
    s.lookup_identity(&query).unwrap(),
    IdentityLookup::Found { entity_id: player, via: LookupPath::Name }
  );

  let wrong_season = query.clone().season(2021);
  assert_eq!(s.lookup_identity(&wrong_season).unwrap(), IdentityLookup::NotFound);

  let other_team = query.team(Uuid::new_v4());
  assert_eq!(s.lookup_identity(&other_team).unwrap(), IdentityLookup::NotFound);
}

#[test]
fn lookup_team_by_name_alone() {
  let s = store();
  let (team, _) = team_and_player(&s);
  let found = s
    .lookup_identity(&IdentityQuery::new(EntityKind::Team).name("x fc"))
    .unwrap();
  assert_eq!(found, IdentityLookup::Found { entity_id: team, via: LookupPath::Name });
}

#[test]
fn duplicate_names_are_ambiguous() {
  let s = store();
  let (team, _) = team_and_player(&s);
  s.register_entity(
    NewEntity::new(EntityKind::Player, "Jane Doe").with_affiliation(team, 2022),
  )
  .unwrap();

  let query = IdentityQuery::new(EntityKind::Player).name("Jane Doe").team(team).season(2022);
  match s.lookup_identity(&query).unwrap() {
    IdentityLookup::Ambiguous(ids) => assert_eq!(ids.len(), 2),
    other => panic!("expected ambiguity, got {other:?}"),
  }
}

#[test]
fn source_id_cannot_be_registered_twice() {
  let s = store();
  team_and_player(&s);
  let err = s
    .register_entity(NewEntity::new(EntityKind::Player, "Other").with_source_id(sid("0000aaaa")))
    .unwrap_err();
  assert!(matches!(err, Error::SourceIdTaken { .. }));
  assert!(!err.is_conflict());

  // The failed registration left nothing behind.
  let lookup = s
    .lookup_identity(&IdentityQuery::new(EntityKind::Player).name("Other"))
    .unwrap();
  assert_eq!(lookup, IdentityLookup::NotFound);
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[test]
fn reupsert_updates_in_place() {
  let s = store();
  let (team, player) = team_and_player(&s);

  let first = s
    .upsert_stat_record(&write(player, Some(team), fields(&[("goals", int(12))])), &[])
    .unwrap();
  let UpsertOutcome::Inserted(record_id) = first else {
    panic!("expected insert, got {first:?}");
  };

  let second = s
    .upsert_stat_record(&write(player, Some(team), fields(&[("goals", int(13))])), &[])
    .unwrap();
  assert_eq!(second, UpsertOutcome::Updated(record_id));

  let records = s.list_stat_records(&match_id()).unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].record_id, record_id);
  assert_eq!(records[0].get("goals"), Some(&int(13)));
  assert!(records[0].updated_at >= records[0].created_at);
}

#[test]
fn partial_writes_accumulate_fields() {
  let s = store();
  let (team, player) = team_and_player(&s);

  s.upsert_stat_record(
    &write(player, Some(team), fields(&[("goals", int(1)), ("assists", int(0))])),
    &[],
  )
  .unwrap();
  s.upsert_stat_record(&write(player, Some(team), fields(&[("key_passes", int(3))])), &[])
    .unwrap();

  let record = s.get_stat_record(&match_id(), player).unwrap().unwrap();
  assert_eq!(record.fields.len(), 3);
  assert_eq!(record.get("goals"), Some(&int(1)));
  assert_eq!(record.get("key_passes"), Some(&int(3)));
}

#[test]
fn null_reasons_survive_storage() {
  let s = store();
  let (team, player) = team_and_player(&s);
  s.upsert_stat_record(
    &write(
      player,
      Some(team),
      fields(&[
        ("goals", int(0)),
        ("assists", Observation::Null(NullReason::Blank)),
        ("expected_goals", Observation::Null(NullReason::NotTracked)),
        ("pass_completion_pct", Observation::Measured(FieldValue::Decimal(81.5))),
        ("nation", Observation::Measured(FieldValue::Text("ENG".into()))),
      ]),
    ),
    &[],
  )
  .unwrap();

  let record = s.get_stat_record(&match_id(), player).unwrap().unwrap();
  assert_eq!(record.get("goals"), Some(&int(0)));
  assert_eq!(record.get("assists"), Some(&Observation::Null(NullReason::Blank)));
  assert!(record.get("expected_goals").unwrap().is_not_tracked());
  assert_eq!(record.get("pass_completion_pct").unwrap().as_f64(), Some(81.5));
  assert_eq!(record.get("nation").unwrap().as_text(), Some("ENG"));
}

#[test]
fn staged_mappings_commit_with_the_record() {
  let s = store();
  let (team, player) = team_and_player(&s);
  let staged = [IdentityMapping { source_id: sid("a1b2c3d4"), entity_id: player }];

  s.upsert_stat_record(&write(player, Some(team), fields(&[("goals", int(1))])), &staged)
    .unwrap();

  let sources: Vec<_> = s
    .mappings_for(player)
    .unwrap()
    .into_iter()
    .map(|m| m.source_id.to_string())
    .collect();
  assert_eq!(sources, ["0000aaaa", "a1b2c3d4"]);
}

#[test]
fn conflicting_mapping_rolls_back_the_record() {
  let s = store();
  let (team, player) = team_and_player(&s);
  let other = s.register_entity(NewEntity::new(EntityKind::Player, "Other")).unwrap();
  let staged = [IdentityMapping { source_id: sid("0000aaaa"), entity_id: other.entity_id }];

  let err = s
    .upsert_stat_record(
      &write(other.entity_id, Some(team), fields(&[("goals", int(1))])),
      &staged,
    )
    .unwrap_err();
  assert!(matches!(err, Error::SourceIdTaken { entity_id, .. } if entity_id == player));
  assert!(s.list_stat_records(&match_id()).unwrap().is_empty());
}

#[test]
fn unknown_fields_are_rejected() {
  let s = store();
  let (team, player) = team_and_player(&s);
  let err = s
    .upsert_stat_record(&write(player, Some(team), fields(&[("style_points", int(9))])), &[])
    .unwrap_err();
  assert!(matches!(err, Error::Core(matchstat_core::Error::UnknownField(_))));
}

#[test]
fn upsert_records_season_affiliation() {
  let s = store();
  let (team, _) = team_and_player(&s);
  let newcomer = s.register_entity(NewEntity::new(EntityKind::Player, "New Signing")).unwrap();
  s.upsert_stat_record(
    &write(newcomer.entity_id, Some(team), fields(&[("goals", int(0))])),
    &[],
  )
  .unwrap();

  let query = IdentityQuery::new(EntityKind::Player).name("New Signing").team(team).season(2022);
  assert!(matches!(s.lookup_identity(&query).unwrap(), IdentityLookup::Found { .. }));
}

// ─── Merge ───────────────────────────────────────────────────────────────────

#[test]
fn merge_moves_and_folds_records() {
  let s = store();
  let (team, keep) = team_and_player(&s);
  let absorb = s
    .register_entity(
      NewEntity::new(EntityKind::Player, "J. Doe")
        .with_source_id(sid("a1b2c3d4"))
        .with_affiliation(team, 2021),
    )
    .unwrap()
    .entity_id;

  // Same match: keep has goals, absorb has goals and assists.
  s.upsert_stat_record(
    &write(keep, Some(team), fields(&[
      ("goals", int(2)),
      ("assists", Observation::Null(NullReason::Blank)),
    ])),
    &[],
  )
  .unwrap();
  s.upsert_stat_record(
    &write(absorb, Some(team), fields(&[("goals", int(9)), ("assists", int(1))])),
    &[],
  )
  .unwrap();

  // Another match only absorb played.
  let other_match = MatchId::parse("008e301f").unwrap();
  s.upsert_stat_record(
    &StatWrite {
      match_id: other_match.clone(),
      entity_id: absorb,
      season: 2021,
      team_id: Some(team),
      fields: fields(&[("goals", int(1))]),
    },
    &[],
  )
  .unwrap();

  let summary = s.merge_identities(keep, absorb).unwrap();
  assert_eq!(summary.mappings_moved, 1);
  assert_eq!(summary.records_merged, 1);
  assert_eq!(summary.records_moved, 1);
  assert_eq!(summary.affiliations_moved, 2);

  let merged = s.get_stat_record(&match_id(), keep).unwrap().unwrap();
  assert_eq!(merged.get("goals"), Some(&int(2)));
  assert_eq!(merged.get("assists"), Some(&int(1)));
  assert_eq!(s.list_stat_records(&match_id()).unwrap().len(), 1);

  let moved = s.get_stat_record(&other_match, keep).unwrap().unwrap();
  assert_eq!(moved.season, 2021);

  assert!(s.get_entity(absorb).unwrap().is_none());
  let found = s
    .lookup_identity(&IdentityQuery::new(EntityKind::Player).source_id(sid("a1b2c3d4")))
    .unwrap();
  assert_eq!(found, IdentityLookup::Found { entity_id: keep, via: LookupPath::SourceId });
}

#[test]
fn merge_rejects_bad_pairs() {
  let s = store();
  let (team, player) = team_and_player(&s);

  assert!(matches!(s.merge_identities(player, player), Err(Error::SelfMerge)));
  assert!(matches!(
    s.merge_identities(player, Uuid::new_v4()),
    Err(Error::EntityNotFound(_))
  ));
  assert!(matches!(
    s.merge_identities(player, team),
    Err(Error::KindMismatch { .. })
  ));
  assert!(s.get_entity(team).unwrap().is_some());
}
