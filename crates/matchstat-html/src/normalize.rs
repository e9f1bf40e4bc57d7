//! Row normalizer: turns body rows into [`StatDraft`]s under a classified
//! signature.
//!
//! Coercion never aborts a row. A cell that cannot be read becomes
//! `Null(CoercionFailed)` and a [`FieldCoercionError`] is attached to the
//! draft. Fields the signature's version does not carry are written as
//! `Null(NotTracked)` so they are never confused with a measured zero.

use std::collections::HashSet;

use matchstat_core::{
  field::{
    CanonicalField, FIELDS, FieldCoercionError, FieldKind, FieldValue, NullReason,
    Observation,
  },
  identity::EntityKind,
  ids::SourceId,
  record::{FieldMap, RowIdentity, StatDraft},
  schema::Signature,
};
use regex::Regex;
use tracing::debug;

use crate::{
  Result,
  locate::{RawCell, RawRow, RawTable},
};

const PLAYER_LINK: &str = r"/players/([0-9a-f]{8})/";

/// Text standing in for "no value".
const BLANK_PLACEHOLDERS: &[&str] = &["", "-", "\u{2014}", "\u{2013}"];

/// Name-column labels of rows that summarise other rows.
const AGGREGATE_LABELS: &[&str] =
  &["squad total", "team total", "opponent total", "total", "player", "players"];

/// Fields that describe a person and have no team-level meaning.
const PLAYER_ONLY: &[&str] = &["shirt_number", "nation", "position", "age"];

/// The drafts read from one table.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
  /// Player drafts in row order, then the team draft from the totals row.
  pub drafts:   Vec<StatDraft>,
  /// Summary lines dropped by the aggregate-row heuristic.
  pub excluded: usize,
}

struct Binding {
  column: usize,
  field:  &'static CanonicalField,
}

pub(crate) struct RowNormalizer {
  player_link: Regex,
}

impl RowNormalizer {
  pub fn new() -> Result<Self> {
    Ok(Self { player_link: Regex::new(PLAYER_LINK)? })
  }

  pub fn normalize(
    &self,
    table: &RawTable,
    headers: &[String],
    sig: &Signature,
  ) -> NormalizedTable {
    let bindings = bind(headers, sig);
    let name_column = name_column(headers, table);
    let untracked: Vec<_> = sig.version.not_tracked().collect();

    let mut out = NormalizedTable::default();
    for row in &table.rows {
      let Some(name_cell) = row.cells.get(name_column) else {
        out.excluded += 1;
        continue;
      };
      if is_aggregate(&name_cell.text) {
        debug!(table_id = %table.id, label = %name_cell.text, "skipping aggregate row");
        out.excluded += 1;
        continue;
      }

      let identity = RowIdentity {
        kind:         EntityKind::Player,
        display_name: name_cell.text.clone(),
        source_id:    self.player_source_id(name_cell),
      };
      out
        .drafts
        .push(draft(table, sig, identity, row, &bindings, &untracked, false));
    }

    if let Some(footer) = &table.footer {
      out.drafts.push(draft(
        table,
        sig,
        team_identity(table),
        footer,
        &bindings,
        &untracked,
        true,
      ));
    }

    out
  }

  /// `data-append-csv` first, then the id embedded in the player link.
  fn player_source_id(&self, cell: &RawCell) -> Option<SourceId> {
    if let Some(csv) = &cell.append_csv
      && let Ok(id) = SourceId::parse(csv)
    {
      return Some(id);
    }
    let href = cell.href.as_deref()?;
    let caps = self.player_link.captures(href)?;
    SourceId::parse(&caps[1]).ok()
  }
}

// ─── Column binding ──────────────────────────────────────────────────────────

/// Map each header to a field the version carries. A field is bound to the
/// first column naming it.
fn bind(headers: &[String], sig: &Signature) -> Vec<Binding> {
  let mut bound = HashSet::new();
  headers
    .iter()
    .enumerate()
    .filter_map(|(column, header)| {
      let field = FIELDS
        .iter()
        .find(|f| sig.fields.contains(&f.name) && f.matches_header(header))?;
      bound.insert(field.name).then_some(Binding { column, field })
    })
    .collect()
}

fn name_column(headers: &[String], table: &RawTable) -> usize {
  if let Some(i) = headers.iter().position(|h| h == "Player") {
    return i;
  }
  table
    .rows
    .first()
    .and_then(|row| {
      row
        .cells
        .iter()
        .position(|c| c.data_stat.as_deref() == Some("player"))
    })
    .unwrap_or(0)
}

fn is_aggregate(name: &str) -> bool {
  let name = name.trim();
  if name.is_empty() {
    return true;
  }
  let lower = name.to_lowercase();
  if AGGREGATE_LABELS.contains(&lower.as_str()) {
    return true;
  }
  // "14 Players"
  lower
    .strip_suffix(" players")
    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// The team a table belongs to: source id from the table id, display name
/// from the caption (`Arsenal Player Stats Table` → `Arsenal`).
pub fn team_identity(table: &RawTable) -> RowIdentity {
  RowIdentity {
    kind:         EntityKind::Team,
    display_name: team_name(table),
    source_id:    Some(table.team_source_id.clone()),
  }
}

/// Caption endings that name the table rather than the team, one per stats
/// table kind.
const CAPTION_SUFFIXES: &[&str] = &[
  "Player Stats",
  "Passing",
  "Pass Types",
  "Defensive Actions",
  "Possession",
  "Miscellaneous Stats",
  "Goalkeeper Stats",
];

fn team_name(table: &RawTable) -> String {
  let caption = table.caption.as_deref().unwrap_or_default().trim();
  let body = caption.strip_suffix("Table").unwrap_or(caption).trim_end();
  let name = CAPTION_SUFFIXES
    .iter()
    .find_map(|suffix| body.strip_suffix(suffix))
    .unwrap_or(body)
    .trim();
  if name.is_empty() { caption.to_owned() } else { name.to_owned() }
}

fn draft(
  table: &RawTable,
  sig: &Signature,
  identity: RowIdentity,
  row: &RawRow,
  bindings: &[Binding],
  untracked: &[&'static CanonicalField],
  team: bool,
) -> StatDraft {
  let mut fields = FieldMap::new();
  let mut diagnostics = Vec::new();

  for binding in bindings {
    if team && PLAYER_ONLY.contains(&binding.field.name) {
      continue;
    }
    let raw = row
      .cells
      .get(binding.column)
      .map(|c| c.text.as_str())
      .unwrap_or_default();
    let observation = match coerce(binding.field, raw) {
      Ok(obs) => obs,
      Err(err) => {
        debug!(table_id = %table.id, field = binding.field.name, raw, "coercion failed");
        diagnostics.push(err);
        Observation::Null(NullReason::CoercionFailed)
      }
    };
    fields.insert(binding.field.name.to_owned(), observation);
  }

  for field in untracked {
    fields.insert(field.name.to_owned(), Observation::Null(NullReason::NotTracked));
  }

  StatDraft {
    table_id: table.id.clone(),
    version: sig.version,
    identity,
    fields,
    diagnostics,
  }
}

// ─── Coercion ────────────────────────────────────────────────────────────────

/// Read one cell as `field`.
pub fn coerce(
  field: &CanonicalField,
  raw: &str,
) -> Result<Observation, FieldCoercionError> {
  let text = raw.trim();
  if BLANK_PLACEHOLDERS.contains(&text) {
    return Ok(Observation::Null(NullReason::Blank));
  }

  let value = match field.kind {
    FieldKind::Integer => parse_integer(text).map(FieldValue::Integer),
    FieldKind::Decimal => parse_decimal(text).map(FieldValue::Decimal),
    FieldKind::Text => Some(FieldValue::Text(text.to_owned())),
    FieldKind::Age => parse_age(text).map(FieldValue::Integer),
    FieldKind::Nation => parse_nation(text).map(FieldValue::Text),
  };

  value.map(Observation::Measured).ok_or_else(|| FieldCoercionError {
    field: field.name.to_owned(),
    kind:  field.kind,
    raw:   raw.to_owned(),
  })
}

fn parse_integer(text: &str) -> Option<i64> { text.replace(',', "").parse().ok() }

fn parse_decimal(text: &str) -> Option<f64> {
  let text = text.strip_suffix('%').unwrap_or(text).trim_end();
  text.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `28-123` (years-days) or `28`.
fn parse_age(text: &str) -> Option<i64> {
  let years = match text.split_once('-') {
    Some((years, days)) => {
      days.parse::<u16>().ok()?;
      years
    }
    None => text,
  };
  years.parse::<i64>().ok().filter(|y| *y >= 0)
}

/// `eng ENG` → `ENG`. The leading token is a flag code and is ignored.
fn parse_nation(text: &str) -> Option<String> {
  let code = text.split_whitespace().last()?;
  let valid = (2..=3).contains(&code.len())
    && code.bytes().all(|b| b.is_ascii_alphabetic());
  valid.then(|| code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
  use matchstat_core::{field::field, schema::SchemaVersion};

  use super::*;
  use crate::{
    header::reconcile,
    testing::{legacy_summary_headers, raw_row},
  };

  fn obs(field_name: &str, raw: &str) -> Result<Observation, FieldCoercionError> {
    coerce(field(field_name).unwrap(), raw)
  }

  fn int(n: i64) -> Observation { Observation::Measured(FieldValue::Integer(n)) }

  fn legacy_table(rows: Vec<RawRow>, footer: Option<RawRow>) -> RawTable {
    RawTable {
      id: "stats_361ca564_summary".into(),
      category: matchstat_core::schema::StatCategory::Summary,
      team_source_id: SourceId::parse("361ca564").unwrap(),
      caption: Some("Tottenham Hotspur Player Stats Table".into()),
      header_rows: legacy_summary_headers(),
      rows,
      footer,
    }
  }

  fn normalize(table: &RawTable) -> NormalizedTable {
    let headers = reconcile(&table.header_rows);
    let sig = SchemaVersion::Legacy24.signature();
    RowNormalizer::new().unwrap().normalize(table, &headers, sig)
  }

  // ── Coercion ──────────────────────────────────────────────────────────

  #[test]
  fn placeholders_are_blank() {
    for raw in ["", "  ", "-", "\u{2014}", "\u{2013}"] {
      assert_eq!(obs("goals", raw).unwrap(), Observation::Null(NullReason::Blank));
    }
  }

  #[test]
  fn integers_accept_thousands_separators() {
    assert_eq!(obs("pass_total_distance", "1,234").unwrap(), int(1234));
    assert_eq!(obs("goals", "0").unwrap(), int(0));
  }

  #[test]
  fn decimals_accept_percent() {
    assert_eq!(
      obs("pass_completion_pct", "83.3%").unwrap(),
      Observation::Measured(FieldValue::Decimal(83.3))
    );
    assert_eq!(obs("expected_goals", "0.4").unwrap().as_f64(), Some(0.4));
  }

  #[test]
  fn age_and_nation() {
    assert_eq!(obs("age", "28-123").unwrap(), int(28));
    assert_eq!(obs("age", "19").unwrap(), int(19));
    assert_eq!(obs("nation", "eng ENG").unwrap().as_text(), Some("ENG"));
    assert_eq!(obs("position", "FW,MF").unwrap().as_text(), Some("FW,MF"));
  }

  #[test]
  fn unreadable_cell_is_a_field_error() {
    let err = obs("goals", "two").unwrap_err();
    assert_eq!(err.field, "goals");
    assert_eq!(err.kind, FieldKind::Integer);
    assert_eq!(err.raw, "two");
    assert!(obs("age", "28-abc").is_err());
    assert!(obs("nation", "England 1966").is_err());
  }

  // ── Rows ──────────────────────────────────────────────────────────────

  #[test]
  fn legacy_row_tracks_nulls_explicitly() {
    let table = legacy_table(vec![raw_row("Jane Doe", &["1", "-"], 24)], None);
    let out = normalize(&table);
    assert_eq!(out.drafts.len(), 1);

    let draft = &out.drafts[0];
    assert_eq!(draft.version, SchemaVersion::Legacy24);
    assert_eq!(draft.identity.display_name, "Jane Doe");
    assert_eq!(draft.get("goals"), Some(&int(1)));
    assert_eq!(draft.get("assists"), Some(&Observation::Null(NullReason::Blank)));
    assert_eq!(
      draft.get("expected_goals"),
      Some(&Observation::Null(NullReason::NotTracked))
    );
    assert!(draft.get("touches").unwrap().is_not_tracked());
    assert!(draft.diagnostics.is_empty());
  }

  #[test]
  fn bad_cell_degrades_one_field_only() {
    let table = legacy_table(vec![raw_row("Jane Doe", &["x", "2"], 24)], None);
    let draft = &normalize(&table).drafts[0];
    assert_eq!(
      draft.get("goals"),
      Some(&Observation::Null(NullReason::CoercionFailed))
    );
    assert_eq!(draft.get("assists"), Some(&int(2)));
    assert_eq!(draft.diagnostics.len(), 1);
    assert_eq!(draft.diagnostics[0].field, "goals");
  }

  #[test]
  fn aggregate_rows_are_excluded() {
    let table = legacy_table(
      vec![
        raw_row("Jane Doe", &["1", "0"], 24),
        raw_row("14 Players", &["3", "2"], 24),
        raw_row("Squad Total", &["3", "2"], 24),
        raw_row("", &["0", "0"], 24),
      ],
      None,
    );
    let out = normalize(&table);
    assert_eq!(out.drafts.len(), 1);
    assert_eq!(out.excluded, 3);
  }

  #[test]
  fn player_source_id_from_attribute_or_link() {
    let mut by_attr = raw_row("Jane Doe", &["1", "0"], 24);
    by_attr.cells[0].append_csv = Some("A1B2C3D4".into());
    let mut by_link = raw_row("John Roe", &["0", "0"], 24);
    by_link.cells[0].href = Some("/en/players/0b1c2d3e/John-Roe".into());
    let table = legacy_table(vec![by_attr, by_link], None);

    let out = normalize(&table);
    let ids: Vec<_> = out
      .drafts
      .iter()
      .map(|d| d.identity.source_id.as_ref().map(|s| s.as_str().to_owned()))
      .collect();
    assert_eq!(ids, [Some("a1b2c3d4".to_owned()), Some("0b1c2d3e".to_owned())]);
  }

  #[test]
  fn footer_becomes_team_draft() {
    let table = legacy_table(
      vec![raw_row("Jane Doe", &["1", "0"], 24)],
      Some(raw_row("14 Players", &["3", "2"], 24)),
    );
    let out = normalize(&table);
    assert_eq!(out.drafts.len(), 2);

    let team = &out.drafts[1];
    assert_eq!(team.identity.kind, EntityKind::Team);
    assert_eq!(team.identity.display_name, "Tottenham Hotspur");
    assert_eq!(team.identity.source_id.as_ref().unwrap().as_str(), "361ca564");
    assert_eq!(team.get("goals"), Some(&int(3)));
    assert!(team.get("age").is_none());
    assert!(team.get("shirt_number").is_none());
  }

  #[test]
  fn team_name_from_every_caption_kind() {
    let captions = [
      "Tottenham Hotspur Player Stats Table",
      "Tottenham Hotspur Passing Table",
      "Tottenham Hotspur Pass Types Table",
      "Tottenham Hotspur Defensive Actions Table",
      "Tottenham Hotspur Possession Table",
      "Tottenham Hotspur Miscellaneous Stats Table",
      "Tottenham Hotspur Goalkeeper Stats Table",
      "Tottenham Hotspur",
    ];
    for caption in captions {
      let mut table = legacy_table(Vec::new(), None);
      table.caption = Some(caption.into());
      assert_eq!(team_identity(&table).display_name, "Tottenham Hotspur", "{caption}");
    }

    let mut bare = legacy_table(Vec::new(), None);
    bare.caption = Some("Player Stats Table".into());
    assert_eq!(team_identity(&bare).display_name, "Player Stats Table");
  }
}
