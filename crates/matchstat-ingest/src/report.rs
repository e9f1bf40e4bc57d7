//! The structured per-document report handed back to batch drivers.
//!
//! Processing a document never raises; everything that went wrong is listed
//! in [`DocumentReport::errors`] and the driver decides whether to retry,
//! skip, or flag the document for review.

use chrono::{DateTime, Utc};
use matchstat_core::{
  field::FieldKind,
  identity::EntityKind,
  ids::{MatchId, SeasonId, SourceId},
  record::{StatDraft, UpsertOutcome},
};
use serde::Serialize;
use uuid::Uuid;

use crate::resolve::UnresolvedReason;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
  pub match_id:           MatchId,
  pub season:             SeasonId,
  pub processed_at:       DateTime<Utc>,
  /// Candidate statistics tables, classified or not.
  pub tables_found:       usize,
  pub tables_rejected:    usize,
  /// Drafts produced from body and totals rows.
  pub rows_normalized:    usize,
  /// Summary rows dropped before normalization.
  pub rows_excluded:      usize,
  pub rows_resolved:      usize,
  pub rows_unresolved:    usize,
  pub records_inserted:   usize,
  pub records_updated:    usize,
  /// Unresolved rows still unwritten when the report is handed back. Drops
  /// below `rows_unresolved` once rows are accepted as new entities.
  pub skipped_unresolved: usize,
  /// Cells that could not be coerced and were stored as null.
  pub field_errors:       usize,
  pub errors:             Vec<ReportError>,
  /// Rows held back for manual reconciliation.
  pub unresolved:         Vec<UnresolvedRow>,
}

impl DocumentReport {
  pub fn new(match_id: MatchId, season: SeasonId) -> Self {
    Self {
      match_id,
      season,
      processed_at: Utc::now(),
      tables_found: 0,
      tables_rejected: 0,
      rows_normalized: 0,
      rows_excluded: 0,
      rows_resolved: 0,
      rows_unresolved: 0,
      records_inserted: 0,
      records_updated: 0,
      skipped_unresolved: 0,
      field_errors: 0,
      errors: Vec::new(),
      unresolved: Vec::new(),
    }
  }

  pub fn record_outcome(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Inserted(_) => self.records_inserted += 1,
      UpsertOutcome::Updated(_) => self.records_updated += 1,
    }
  }

  /// `true` when nothing at all could be read from the document.
  pub fn is_fatal(&self) -> bool {
    self
      .errors
      .iter()
      .any(|e| matches!(e, ReportError::NoStatisticsTables | ReportError::Extraction { .. }))
  }
}

/// One entry of the error taxonomy, as surfaced to the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportError {
  NoStatisticsTables,
  /// The document could not be read for a reason other than missing tables.
  Extraction { message: String },
  UnrecognizedSchema { table_id: String, columns: usize },
  FieldCoercion {
    table_id: String,
    row:      String,
    field:    String,
    #[serde(rename = "field_kind")]
    kind:     FieldKind,
    raw:      String,
  },
  UnresolvedIdentity {
    table_id:     String,
    display_name: String,
    source_id:    Option<SourceId>,
    #[serde(flatten)]
    reason:       UnresolvedReason,
  },
  PersistenceConflict { entity_id: Uuid, message: String },
  Store { message: String },
}

/// A normalized row that could not be tied to an entity. Nothing was written
/// for it.
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedRow {
  pub reason:  UnresolvedReason,
  /// Resolved team of the row's table, if any.
  pub team_id: Option<Uuid>,
  pub draft:   StatDraft,
}

impl UnresolvedRow {
  pub fn key(&self) -> RowKey {
    let identity = &self.draft.identity;
    match &identity.source_id {
      Some(id) => RowKey::Source(identity.kind, id.clone()),
      None => RowKey::Name(
        identity.kind,
        identity.display_name.trim().to_lowercase(),
        self.team_id,
      ),
    }
  }
}

/// Rows of one document with equal keys name the same entity: same source
/// id, or same name and team when the site gave no id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
  Source(EntityKind, SourceId),
  Name(EntityKind, String, Option<Uuid>),
}
