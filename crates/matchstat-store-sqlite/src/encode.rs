//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, enum
//! tags their snake_case names. A measured field value is stored as a JSON
//! scalar next to its state tag.

use chrono::{DateTime, Utc};
use matchstat_core::{
  field::{NullReason, Observation},
  identity::{Entity, EntityKind},
  ids::{MatchId, SeasonId},
  record::{FieldMap, StatRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Names ───────────────────────────────────────────────────────────────────

/// Key used for the exact-name fallback: trimmed and case-folded.
pub fn name_key(name: &str) -> String { name.trim().to_lowercase() }

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<EntityKind> {
  s.parse().map_err(|_| {
    Error::Core(matchstat_core::Error::UnknownVariant {
      kind:  "entity kind",
      value: s.to_owned(),
    })
  })
}

// ─── Observations ────────────────────────────────────────────────────────────

/// `(state, value)` columns for one observation.
pub fn encode_observation(obs: &Observation) -> Result<(&'static str, Option<String>)> {
  let value = obs.value().map(serde_json::to_string).transpose()?;
  Ok((obs.state(), value))
}

pub fn decode_observation(state: &str, value: Option<&str>) -> Result<Observation> {
  if state == "measured" {
    let value =
      value.ok_or_else(|| Error::Decode("measured field without a value".into()))?;
    return Ok(Observation::Measured(serde_json::from_str(value)?));
  }
  let reason: NullReason = state.parse().map_err(|_| {
    Error::Core(matchstat_core::Error::UnknownVariant {
      kind:  "observation state",
      value: state.to_owned(),
    })
  })?;
  Ok(Observation::Null(reason))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `entities` row.
pub struct RawEntity {
  pub entity_id:    String,
  pub kind:         String,
  pub display_name: String,
  pub created_at:   String,
}

impl RawEntity {
  pub fn into_entity(self) -> Result<Entity> {
    Ok(Entity {
      entity_id:    decode_uuid(&self.entity_id)?,
      kind:         decode_kind(&self.kind)?,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `stat_records` row.
pub struct RawStatRecord {
  pub record_id:  String,
  pub match_id:   String,
  pub entity_id:  String,
  pub season_id:  SeasonId,
  pub created_at: String,
  pub updated_at: String,
}

/// One `stat_values` row.
pub struct RawStatValue {
  pub field: String,
  pub state: String,
  pub value: Option<String>,
}

impl RawStatRecord {
  pub fn into_record(self, values: Vec<RawStatValue>) -> Result<StatRecord> {
    let mut fields = FieldMap::new();
    for v in values {
      let obs = decode_observation(&v.state, v.value.as_deref())?;
      fields.insert(v.field, obs);
    }

    Ok(StatRecord {
      record_id: decode_uuid(&self.record_id)?,
      match_id: MatchId::parse(&self.match_id)?,
      entity_id: decode_uuid(&self.entity_id)?,
      season: self.season_id,
      fields,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
