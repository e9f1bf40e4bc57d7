//! Per-document pipeline: extract, resolve, persist, report.
//!
//! `Located → HeaderReconciled → VersionClassified → RowNormalized →
//! {Resolved | Unresolved} → Persisted`. Rows of every table that resolve to
//! the same entity are folded into one write, so a document produces exactly
//! one upsert per (match, entity) pair.

use std::collections::HashMap;

use matchstat_core::{
  field::Observation,
  identity::{Entity, EntityKind, IdentityMapping, NewEntity},
  ids::{MatchId, SeasonId, SourceId},
  record::{FieldMap, StatWrite, UpsertOutcome},
  schema::Era,
  store::MatchStore,
};
use matchstat_html::{ExtractedTable, Extractor};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, IngestConfig, Result,
  report::{DocumentReport, ReportError, RowKey, UnresolvedRow},
  resolve::{self, Resolution},
  upsert,
};

/// Everything resolved to one entity within one document.
struct PendingWrite {
  entity_id: Uuid,
  team_id:   Option<Uuid>,
  fields:    FieldMap,
  staged:    Vec<IdentityMapping>,
}

impl PendingWrite {
  fn absorb(&mut self, fields: FieldMap, staged: Option<IdentityMapping>) {
    fold_fields(&mut self.fields, fields);
    if let Some(mapping) = staged
      && !self.staged.contains(&mapping)
    {
      self.staged.push(mapping);
    }
  }
}

/// Fold a later table's fields into `into`. A measured value is never
/// replaced by a null from another table of the same document.
fn fold_fields(into: &mut FieldMap, from: FieldMap) {
  for (name, obs) in from {
    match into.get(&name) {
      Some(Observation::Measured(_)) if obs.is_null() => {}
      _ => {
        into.insert(name, obs);
      }
    }
  }
}

/// Merge unresolved rows that name the same entity, in first-seen order,
/// folding their fields table by table. The first known team wins.
pub fn fold_unresolved<'a>(
  rows: impl IntoIterator<Item = &'a UnresolvedRow>,
) -> Vec<(RowKey, UnresolvedRow)> {
  let mut folded: Vec<(RowKey, UnresolvedRow)> = Vec::new();
  let mut by_key: HashMap<RowKey, usize> = HashMap::new();
  for row in rows {
    let key = row.key();
    match by_key.get(&key) {
      Some(&i) => {
        let into = &mut folded[i].1;
        fold_fields(&mut into.draft.fields, row.draft.fields.clone());
        into.team_id = into.team_id.or(row.team_id);
      }
      None => {
        by_key.insert(key.clone(), folded.len());
        folded.push((key, row.clone()));
      }
    }
  }
  folded
}

pub struct Pipeline<S> {
  config:    IngestConfig,
  store:     S,
  extractor: Extractor,
}

impl<S: MatchStore> Pipeline<S> {
  pub fn new(config: IngestConfig, store: S) -> Result<Self> {
    Ok(Self { config, store, extractor: Extractor::new()? })
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &IngestConfig { &self.config }

  /// Run one match document through the pipeline.
  ///
  /// Never fails: extraction, resolution and persistence problems are
  /// collected in the returned report. `hint` overrides the configured
  /// schema hint. Running the same document again yields the same stored
  /// values and no new records.
  pub fn process_document(
    &self,
    match_id: &MatchId,
    season: SeasonId,
    html: &str,
    hint: Option<Era>,
  ) -> DocumentReport {
    let mut report = DocumentReport::new(match_id.clone(), season);

    let extraction = match self.extractor.extract(html, hint.or(self.config.schema_hint)) {
      Ok(extraction) => extraction,
      Err(matchstat_html::Error::NoStatisticsTables) => {
        warn!(%match_id, "no statistics tables");
        report.errors.push(ReportError::NoStatisticsTables);
        return report;
      }
      Err(e) => {
        warn!(%match_id, error = %e, "extraction failed");
        report.errors.push(ReportError::Extraction { message: e.to_string() });
        return report;
      }
    };

    report.tables_found = extraction.tables_found();
    report.tables_rejected = extraction.rejected.len();
    for rejected in &extraction.rejected {
      report.errors.push(match &rejected.error {
        matchstat_html::Error::UnrecognizedSchema { table_id, columns } => {
          ReportError::UnrecognizedSchema { table_id: table_id.clone(), columns: *columns }
        }
        other => ReportError::Extraction { message: other.to_string() },
      });
    }

    let mut teams: HashMap<Option<SourceId>, Resolution> = HashMap::new();
    let mut pending: Vec<PendingWrite> = Vec::new();
    let mut by_entity: HashMap<Uuid, usize> = HashMap::new();

    for table in extraction.tables {
      report.rows_excluded += table.excluded;
      let team = self.team_resolution(&mut teams, &table, season, &mut report);
      let team_id = team.as_ref().and_then(Resolution::entity_id);

      for draft in table.drafts {
        report.rows_normalized += 1;
        report.field_errors += draft.diagnostics.len();
        for diag in &draft.diagnostics {
          report.errors.push(ReportError::FieldCoercion {
            table_id: draft.table_id.clone(),
            row:      draft.identity.display_name.clone(),
            field:    diag.field.clone(),
            kind:     diag.kind,
            raw:      diag.raw.clone(),
          });
        }

        let resolution = match draft.identity.kind {
          EntityKind::Team => team.clone(),
          EntityKind::Player => {
            match resolve::resolve(&self.store, &draft.identity, team_id, season) {
              Ok(resolution) => Some(resolution),
              Err(e) => {
                warn!(%match_id, name = %draft.identity.display_name, error = %e, "identity lookup failed");
                report.errors.push(ReportError::Store { message: e.to_string() });
                None
              }
            }
          }
        };
        let Some(resolution) = resolution else {
          continue;
        };

        match resolution {
          Resolution::Resolved { entity_id, staged, .. } => {
            report.rows_resolved += 1;
            let row_team = match draft.identity.kind {
              EntityKind::Player => team_id,
              EntityKind::Team => None,
            };
            match by_entity.get(&entity_id) {
              Some(&i) => pending[i].absorb(draft.fields, staged),
              None => {
                by_entity.insert(entity_id, pending.len());
                pending.push(PendingWrite {
                  entity_id,
                  team_id: row_team,
                  fields: draft.fields,
                  staged: staged.into_iter().collect(),
                });
              }
            }
          }
          Resolution::Unresolved(reason) => {
            report.rows_unresolved += 1;
            report.skipped_unresolved += 1;
            report.errors.push(ReportError::UnresolvedIdentity {
              table_id:     draft.table_id.clone(),
              display_name: draft.identity.display_name.clone(),
              source_id:    draft.identity.source_id.clone(),
              reason:       reason.clone(),
            });
            report.unresolved.push(UnresolvedRow { reason, team_id, draft });
          }
        }
      }
    }

    for write in pending {
      self.persist(match_id, season, write, &mut report);
    }

    info!(
      %match_id,
      season,
      tables = report.tables_found,
      rows = report.rows_normalized,
      inserted = report.records_inserted,
      updated = report.records_updated,
      unresolved = report.rows_unresolved,
      errors = report.errors.len(),
      "processed document"
    );
    report
  }

  /// Register an unresolved row, possibly folded from several tables with
  /// [`fold_unresolved`], as a new entity and write its record. This
  /// is the only path through which the pipeline creates identities, and it
  /// runs only on the caller's explicit request.
  pub fn accept_unresolved(
    &self,
    match_id: &MatchId,
    season: SeasonId,
    row: &UnresolvedRow,
  ) -> Result<(Entity, UpsertOutcome)> {
    let identity = &row.draft.identity;
    let mut input = NewEntity::new(identity.kind, identity.display_name.as_str());
    if let Some(id) = &identity.source_id {
      input = input.with_source_id(id.clone());
    }
    let team_id = match identity.kind {
      EntityKind::Player => row.team_id,
      EntityKind::Team => None,
    };
    if let Some(team) = team_id {
      input = input.with_affiliation(team, season);
    }

    let entity = self.store.register_entity(input).map_err(Error::store)?;
    let write = StatWrite {
      match_id: match_id.clone(),
      entity_id: entity.entity_id,
      season,
      team_id,
      fields: row.draft.fields.clone(),
    };
    let outcome = upsert::upsert(&self.store, &write, &[], self.config.conflict_retries)?;
    info!(%match_id, entity_id = %entity.entity_id, name = %entity.display_name, "accepted unresolved row");
    Ok((entity, outcome))
  }

  // ─── Internals ─────────────────────────────────────────────────────────────

  /// Resolve the team of `table` once per document.
  fn team_resolution(
    &self,
    cache: &mut HashMap<Option<SourceId>, Resolution>,
    table: &ExtractedTable,
    season: SeasonId,
    report: &mut DocumentReport,
  ) -> Option<Resolution> {
    let key = table.team.source_id.clone();
    if let Some(hit) = cache.get(&key) {
      return Some(hit.clone());
    }
    match resolve::resolve(&self.store, &table.team, None, season) {
      Ok(resolution) => {
        if let Resolution::Unresolved(reason) = &resolution {
          warn!(table_id = %table.table_id, team = %table.team.display_name, ?reason, "team unresolved");
        }
        cache.insert(key, resolution.clone());
        Some(resolution)
      }
      Err(e) => {
        warn!(table_id = %table.table_id, error = %e, "team lookup failed");
        report.errors.push(ReportError::Store { message: e.to_string() });
        None
      }
    }
  }

  fn persist(
    &self,
    match_id: &MatchId,
    season: SeasonId,
    pending: PendingWrite,
    report: &mut DocumentReport,
  ) {
    let write = StatWrite {
      match_id: match_id.clone(),
      entity_id: pending.entity_id,
      season,
      team_id: pending.team_id,
      fields: pending.fields,
    };
    match upsert::upsert(&self.store, &write, &pending.staged, self.config.conflict_retries) {
      Ok(outcome) => report.record_outcome(outcome),
      Err(e @ Error::PersistenceConflict { .. }) => {
        warn!(%match_id, entity_id = %write.entity_id, error = %e, "giving up on record");
        report.errors.push(ReportError::PersistenceConflict {
          entity_id: write.entity_id,
          message:   e.to_string(),
        });
      }
      Err(e) => {
        warn!(%match_id, entity_id = %write.entity_id, error = %e, "record write failed");
        report.errors.push(ReportError::Store { message: e.to_string() });
      }
    }
  }
}

