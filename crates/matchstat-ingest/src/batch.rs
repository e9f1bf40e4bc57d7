//! File-level driver: one match document per file, failures isolated per
//! file.

use std::path::{Path, PathBuf};

use matchstat_core::{
  identity::EntityKind,
  ids::{MatchId, SeasonId},
  record::UpsertOutcome,
  schema::Era,
  store::MatchStore,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Pipeline,
  pipeline::fold_unresolved,
  report::{DocumentReport, ReportError},
};

/// Match id encoded in a document file name: `match_<id>.html` or
/// `<prefix>_match_<id>.html`.
pub fn match_id_from_path(path: &Path) -> Option<MatchId> {
  let stem = path.file_stem()?.to_str()?;
  let (_, id) = stem.rsplit_once("match_")?;
  MatchId::parse(id).ok()
}

/// Per-run settings shared by every file of a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
  pub season:            SeasonId,
  pub era:               Option<Era>,
  /// Overrides the id derived from the file name.
  pub match_id:          Option<MatchId>,
  /// Register every unresolved row as a new entity.
  pub accept_unresolved: bool,
}

/// A row registered as a new entity under `--accept-unresolved`.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedRow {
  pub entity_id:    Uuid,
  pub kind:         EntityKind,
  pub display_name: String,
  #[serde(flatten)]
  pub outcome:      UpsertOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileReport {
  Processed {
    path:     PathBuf,
    #[serde(flatten)]
    report:   DocumentReport,
    accepted: Vec<AcceptedRow>,
  },
  Failed {
    path:  PathBuf,
    error: String,
  },
}

/// Read and process one file. Never fails; problems are in the report.
pub fn ingest_file<S: MatchStore>(
  pipeline: &Pipeline<S>,
  path: &Path,
  opts: &BatchOptions,
) -> FileReport {
  let failed = |error: String| {
    warn!(path = %path.display(), %error, "skipping file");
    FileReport::Failed { path: path.to_path_buf(), error }
  };

  let Some(match_id) = opts.match_id.clone().or_else(|| match_id_from_path(path)) else {
    return failed("cannot derive a match id from the file name".into());
  };
  let html = match std::fs::read_to_string(path) {
    Ok(html) => html,
    Err(e) => return failed(format!("failed to read file: {e}")),
  };

  let mut report = pipeline.process_document(&match_id, opts.season, &html, opts.era);
  let mut accepted = Vec::new();

  if opts.accept_unresolved && !report.unresolved.is_empty() {
    // Teams first: once a team exists its players can be matched by name,
    // so the document is processed again before any player is registered.
    let before = report.errors.len();
    let teams = accept(pipeline, &mut report, EntityKind::Team);
    if !teams.is_empty() {
      let failures = report.errors.split_off(before);
      accepted = teams;
      report = pipeline.process_document(&match_id, opts.season, &html, opts.era);
      report.errors.extend(failures);
    }
    accepted.extend(accept(pipeline, &mut report, EntityKind::Player));
  }

  info!(path = %path.display(), %match_id, accepted = accepted.len(), "ingested file");
  FileReport::Processed { path: path.to_path_buf(), report, accepted }
}

/// Register every unresolved entity of `kind` once, however many tables list
/// it, and drop its rows from the report.
fn accept<S: MatchStore>(
  pipeline: &Pipeline<S>,
  report: &mut DocumentReport,
  kind: EntityKind,
) -> Vec<AcceptedRow> {
  let groups = fold_unresolved(
    report
      .unresolved
      .iter()
      .filter(|row| row.draft.identity.kind == kind),
  );

  let mut accepted = Vec::new();
  for (key, row) in groups {
    match pipeline.accept_unresolved(&report.match_id, report.season, &row) {
      Ok((entity, outcome)) => {
        let before = report.unresolved.len();
        report.unresolved.retain(|r| r.key() != key);
        let removed = before - report.unresolved.len();
        report.skipped_unresolved = report.skipped_unresolved.saturating_sub(removed);
        accepted.push(AcceptedRow {
          entity_id: entity.entity_id,
          kind: entity.kind,
          display_name: entity.display_name,
          outcome,
        });
      }
      Err(e) => {
        warn!(match_id = %report.match_id, name = %row.draft.identity.display_name, error = %e, "could not accept row");
        report.errors.push(ReportError::Store { message: e.to_string() });
      }
    }
  }
  accepted
}
