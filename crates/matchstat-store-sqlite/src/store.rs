//! [`SqliteStore`], the SQLite implementation of [`MatchStore`].

use std::{
  path::Path,
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, Transaction, TransactionBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use matchstat_core::{
  field::field,
  identity::{
    Entity, IdentityLookup, IdentityMapping, IdentityQuery, LookupPath, MergeSummary,
    NewEntity,
  },
  ids::{MatchId, SourceId},
  record::{StatRecord, StatWrite, UpsertOutcome},
  store::MatchStore,
};

use crate::{
  Error, Result,
  encode::{
    RawEntity, RawStatRecord, RawStatValue, decode_uuid, encode_dt, encode_observation,
    encode_uuid, name_key,
  },
  schema::SCHEMA,
};

/// How long a writer waits on another process's lock before giving up with
/// `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const RECORD_COLUMNS: &str =
  "record_id, match_id, entity_id, season_id, created_at, updated_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A matchstat store backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Self::init(conn)
  }

  /// Open a private in-memory store.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Arc::new(Mutex::new(conn)) })
  }

  fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| Error::Poisoned)
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────

fn read_entity(conn: &Connection, id: Uuid) -> Result<Option<Entity>> {
  let raw = conn
    .query_row(
      "SELECT entity_id, kind, display_name, created_at FROM entities
       WHERE entity_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |row| {
        Ok(RawEntity {
          entity_id:    row.get(0)?,
          kind:         row.get(1)?,
          display_name: row.get(2)?,
          created_at:   row.get(3)?,
        })
      },
    )
    .optional()?;
  raw.map(RawEntity::into_entity).transpose()
}

/// Entity currently mapped from `source_id`, if any.
fn mapped_entity(conn: &Connection, source_id: &SourceId) -> Result<Option<Uuid>> {
  let raw: Option<String> = conn
    .query_row(
      "SELECT entity_id FROM identity_mappings WHERE source_id = ?1",
      rusqlite::params![source_id.as_str()],
      |r| r.get(0),
    )
    .optional()?;
  raw.as_deref().map(decode_uuid).transpose()
}

/// Insert a mapping unless it already exists. A source id bound to a
/// different entity is an error; it is never silently re-pointed.
fn insert_mapping(tx: &Transaction<'_>, mapping: &IdentityMapping, now: &str) -> Result<()> {
  match mapped_entity(tx, &mapping.source_id)? {
    Some(existing) if existing == mapping.entity_id => Ok(()),
    Some(existing) => Err(Error::SourceIdTaken {
      source_id: mapping.source_id.to_string(),
      entity_id: existing,
    }),
    None => {
      tx.execute(
        "INSERT INTO identity_mappings (source_id, entity_id, recorded_at)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![
          mapping.source_id.as_str(),
          encode_uuid(mapping.entity_id),
          now
        ],
      )?;
      debug!(source_id = %mapping.source_id, entity_id = %mapping.entity_id, "recorded identity mapping");
      Ok(())
    }
  }
}

fn record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawStatRecord> {
  Ok(RawStatRecord {
    record_id:  row.get(0)?,
    match_id:   row.get(1)?,
    entity_id:  row.get(2)?,
    season_id:  row.get(3)?,
    created_at: row.get(4)?,
    updated_at: row.get(5)?,
  })
}

fn load_values(conn: &Connection, record_id: &str) -> Result<Vec<RawStatValue>> {
  let mut stmt =
    conn.prepare("SELECT field, state, value FROM stat_values WHERE record_id = ?1")?;
  let values = stmt
    .query_map(rusqlite::params![record_id], |row| {
      Ok(RawStatValue {
        field: row.get(0)?,
        state: row.get(1)?,
        value: row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(values)
}

fn hydrate(conn: &Connection, raw: RawStatRecord) -> Result<StatRecord> {
  let values = load_values(conn, &raw.record_id)?;
  raw.into_record(values)
}

// ─── MatchStore impl ─────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  type Error = Error;

  // ── Reference store ───────────────────────────────────────────────────────

  fn lookup_identity(&self, query: &IdentityQuery) -> Result<IdentityLookup> {
    let conn = self.conn()?;
    let kind = query.kind.as_ref();

    if let Some(source_id) = &query.source_id {
      let found: Option<String> = conn
        .query_row(
          "SELECT m.entity_id FROM identity_mappings m
           JOIN entities e ON e.entity_id = m.entity_id
           WHERE m.source_id = ?1 AND e.kind = ?2",
          rusqlite::params![source_id.as_str(), kind],
          |r| r.get(0),
        )
        .optional()?;
      if let Some(id) = found {
        return Ok(IdentityLookup::Found {
          entity_id: decode_uuid(&id)?,
          via:       LookupPath::SourceId,
        });
      }
    }

    let Some(name) = query.name.as_deref().map(name_key).filter(|n| !n.is_empty())
    else {
      return Ok(IdentityLookup::NotFound);
    };

    let team = query.team.map(encode_uuid);
    let mut stmt = conn.prepare(
      "SELECT DISTINCT e.entity_id FROM entities e
       LEFT JOIN affiliations a ON a.entity_id = e.entity_id
       WHERE e.kind = ?1 AND e.name_key = ?2
         AND (?3 IS NULL OR a.team_id = ?3)
         AND (?4 IS NULL OR a.season_id = ?4)",
    )?;
    let ids = stmt
      .query_map(rusqlite::params![kind, name, team, query.season], |r| {
        r.get::<_, String>(0)
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<Vec<_>>>()?;

    Ok(match ids.as_slice() {
      [] => IdentityLookup::NotFound,
      [id] => IdentityLookup::Found { entity_id: *id, via: LookupPath::Name },
      _ => IdentityLookup::Ambiguous(ids),
    })
  }

  fn register_entity(&self, input: NewEntity) -> Result<Entity> {
    let entity = Entity {
      entity_id:    Uuid::new_v4(),
      kind:         input.kind,
      display_name: input.display_name.trim().to_owned(),
      created_at:   Utc::now(),
    };
    let id_str = encode_uuid(entity.entity_id);
    let now = encode_dt(entity.created_at);

    let mut conn = self.conn()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
      "INSERT INTO entities (entity_id, kind, display_name, name_key, created_at)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        id_str,
        entity.kind.as_ref(),
        entity.display_name,
        name_key(&entity.display_name),
        now
      ],
    )?;

    if let Some(source_id) = input.source_id {
      let mapping = IdentityMapping { source_id, entity_id: entity.entity_id };
      insert_mapping(&tx, &mapping, &now)?;
    }

    if let Some(aff) = input.affiliation {
      tx.execute(
        "INSERT OR IGNORE INTO affiliations (entity_id, team_id, season_id)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![id_str, encode_uuid(aff.team_id), aff.season],
      )?;
    }

    tx.commit()?;
    info!(entity_id = %entity.entity_id, kind = %entity.kind, name = %entity.display_name, "registered entity");
    Ok(entity)
  }

  fn get_entity(&self, id: Uuid) -> Result<Option<Entity>> {
    let conn = self.conn()?;
    read_entity(&conn, id)
  }

  fn mappings_for(&self, id: Uuid) -> Result<Vec<IdentityMapping>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT source_id FROM identity_mappings WHERE entity_id = ?1 ORDER BY source_id",
    )?;
    let raws = stmt
      .query_map(rusqlite::params![encode_uuid(id)], |r| r.get::<_, String>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws
      .iter()
      .map(|s| {
        Ok(IdentityMapping {
          source_id: SourceId::parse(s)?,
          entity_id: id,
        })
      })
      .collect()
  }

  // ── Destination store ─────────────────────────────────────────────────────

  fn upsert_stat_record(
    &self,
    write: &StatWrite,
    staged: &[IdentityMapping],
  ) -> Result<UpsertOutcome> {
    if let Some(unknown) = write.fields.keys().find(|name| field(name).is_none()) {
      return Err(matchstat_core::Error::UnknownField(unknown.clone()).into());
    }

    let now = encode_dt(Utc::now());
    let match_str = write.match_id.as_str();
    let entity_str = encode_uuid(write.entity_id);

    let mut conn = self.conn()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    for mapping in staged {
      insert_mapping(&tx, mapping, &now)?;
    }

    tx.execute(
      "INSERT INTO matches (match_id, season_id) VALUES (?1, ?2)
       ON CONFLICT (match_id) DO NOTHING",
      rusqlite::params![match_str, write.season],
    )?;

    if let Some(team) = write.team_id {
      tx.execute(
        "INSERT OR IGNORE INTO affiliations (entity_id, team_id, season_id)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![entity_str, encode_uuid(team), write.season],
      )?;
    }

    let existing: Option<String> = tx
      .query_row(
        "SELECT record_id FROM stat_records WHERE match_id = ?1 AND entity_id = ?2",
        rusqlite::params![match_str, entity_str],
        |r| r.get(0),
      )
      .optional()?;

    let outcome = match existing {
      Some(id) => {
        tx.execute(
          "UPDATE stat_records SET season_id = ?1, updated_at = ?2 WHERE record_id = ?3",
          rusqlite::params![write.season, now, id],
        )?;
        UpsertOutcome::Updated(decode_uuid(&id)?)
      }
      None => {
        let id = Uuid::new_v4();
        tx.execute(
          "INSERT INTO stat_records (record_id, match_id, entity_id, season_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![encode_uuid(id), match_str, entity_str, write.season, now],
        )?;
        UpsertOutcome::Inserted(id)
      }
    };

    let record_str = encode_uuid(outcome.record_id());
    {
      let mut stmt = tx.prepare(
        "INSERT INTO stat_values (record_id, field, state, value) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (record_id, field) DO UPDATE
           SET state = excluded.state, value = excluded.value",
      )?;
      for (name, obs) in &write.fields {
        let (state, value) = encode_observation(obs)?;
        stmt.execute(rusqlite::params![record_str, name, state, value])?;
      }
    }

    tx.commit()?;
    debug!(
      match_id = %write.match_id,
      entity_id = %write.entity_id,
      fields = write.fields.len(),
      staged = staged.len(),
      ?outcome,
      "upserted stat record"
    );
    Ok(outcome)
  }

  fn get_stat_record(
    &self,
    match_id: &MatchId,
    entity_id: Uuid,
  ) -> Result<Option<StatRecord>> {
    let conn = self.conn()?;
    let raw = conn
      .query_row(
        &format!(
          "SELECT {RECORD_COLUMNS} FROM stat_records WHERE match_id = ?1 AND entity_id = ?2"
        ),
        rusqlite::params![match_id.as_str(), encode_uuid(entity_id)],
        record_row,
      )
      .optional()?;
    raw.map(|raw| hydrate(&conn, raw)).transpose()
  }

  fn list_stat_records(&self, match_id: &MatchId) -> Result<Vec<StatRecord>> {
    let conn = self.conn()?;
    let raws = {
      let mut stmt = conn
        .prepare(&format!("SELECT {RECORD_COLUMNS} FROM stat_records WHERE match_id = ?1"))?;
      stmt
        .query_map(rusqlite::params![match_id.as_str()], record_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?
    };
    raws.into_iter().map(|raw| hydrate(&conn, raw)).collect()
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  fn merge_identities(&self, keep: Uuid, absorb: Uuid) -> Result<MergeSummary> {
    if keep == absorb {
      return Err(Error::SelfMerge);
    }

    let keep_str = encode_uuid(keep);
    let absorb_str = encode_uuid(absorb);
    let now = encode_dt(Utc::now());

    let mut conn = self.conn()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let keep_entity = read_entity(&tx, keep)?.ok_or(Error::EntityNotFound(keep))?;
    let absorb_entity = read_entity(&tx, absorb)?.ok_or(Error::EntityNotFound(absorb))?;
    if keep_entity.kind != absorb_entity.kind {
      return Err(Error::KindMismatch { keep, absorb });
    }

    let mut summary = MergeSummary::default();

    summary.mappings_moved = tx.execute(
      "UPDATE identity_mappings SET entity_id = ?1 WHERE entity_id = ?2",
      rusqlite::params![keep_str, absorb_str],
    )?;

    // Affiliations held by the absorbed entity, and those naming it as team.
    tx.execute(
      "INSERT OR IGNORE INTO affiliations (entity_id, team_id, season_id)
       SELECT ?1, team_id, season_id FROM affiliations WHERE entity_id = ?2",
      rusqlite::params![keep_str, absorb_str],
    )?;
    tx.execute(
      "INSERT OR IGNORE INTO affiliations (entity_id, team_id, season_id)
       SELECT entity_id, ?1, season_id FROM affiliations WHERE team_id = ?2",
      rusqlite::params![keep_str, absorb_str],
    )?;
    summary.affiliations_moved = tx.execute(
      "DELETE FROM affiliations WHERE entity_id = ?1 OR team_id = ?1",
      rusqlite::params![absorb_str],
    )?;

    let absorbed: Vec<(String, String)> = {
      let mut stmt =
        tx.prepare("SELECT record_id, match_id FROM stat_records WHERE entity_id = ?1")?;
      stmt
        .query_map(rusqlite::params![absorb_str], |r| Ok((r.get(0)?, r.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?
    };

    for (absorbed_record, match_id) in absorbed {
      let kept_record: Option<String> = tx
        .query_row(
          "SELECT record_id FROM stat_records WHERE match_id = ?1 AND entity_id = ?2",
          rusqlite::params![match_id, keep_str],
          |r| r.get(0),
        )
        .optional()?;

      match kept_record {
        Some(kept_record) => {
          // Measured values of the kept record win; the absorbed record fills
          // fields the kept one lacks or holds as null.
          tx.execute(
            "INSERT INTO stat_values (record_id, field, state, value)
             SELECT ?1, field, state, value FROM stat_values WHERE record_id = ?2
             ON CONFLICT (record_id, field) DO UPDATE
               SET state = excluded.state, value = excluded.value
               WHERE stat_values.state != 'measured' AND excluded.state = 'measured'",
            rusqlite::params![kept_record, absorbed_record],
          )?;
          tx.execute(
            "DELETE FROM stat_values WHERE record_id = ?1",
            rusqlite::params![absorbed_record],
          )?;
          tx.execute(
            "DELETE FROM stat_records WHERE record_id = ?1",
            rusqlite::params![absorbed_record],
          )?;
          tx.execute(
            "UPDATE stat_records SET updated_at = ?1 WHERE record_id = ?2",
            rusqlite::params![now, kept_record],
          )?;
          summary.records_merged += 1;
        }
        None => {
          tx.execute(
            "UPDATE stat_records SET entity_id = ?1, updated_at = ?2 WHERE record_id = ?3",
            rusqlite::params![keep_str, now, absorbed_record],
          )?;
          summary.records_moved += 1;
        }
      }
    }

    tx.execute(
      "DELETE FROM entities WHERE entity_id = ?1",
      rusqlite::params![absorb_str],
    )?;

    tx.commit()?;
    info!(%keep, %absorb, ?summary, "merged identities");
    Ok(summary)
  }
}
