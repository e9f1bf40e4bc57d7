//! HTML statistics-table codec for matchstat.
//!
//! Locates the per-player statistics tables of one match document,
//! reconciles their headers, classifies each against the schema-version
//! registry, and normalizes body rows into [`StatDraft`]s. Pure synchronous;
//! no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use matchstat_html::Extractor;
//!
//! let html = std::fs::read_to_string("match_414d2972.html").unwrap();
//! let extraction = Extractor::new().unwrap().extract(&html, None).unwrap();
//! for table in &extraction.tables {
//!   println!("{} → {} ({} rows)", table.table_id, table.version, table.drafts.len());
//! }
//! ```

pub mod classify;
pub mod error;
pub mod header;
pub mod locate;
pub mod normalize;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use locate::{RawCell, RawRow, RawTable};
use locate::TableLocator;
use matchstat_core::{
  record::{RowIdentity, StatDraft},
  schema::{Era, SchemaVersion, StatCategory},
};
use normalize::RowNormalizer;
use tracing::warn;

// ─── Public types ────────────────────────────────────────────────────────────

/// One table that made it through classification.
#[derive(Debug, Clone)]
pub struct ExtractedTable {
  pub table_id: String,
  pub category: StatCategory,
  pub version:  SchemaVersion,
  /// The team whose players the table lists.
  pub team:     RowIdentity,
  /// Reconciled header, one name per column.
  pub headers:  Vec<String>,
  pub drafts:   Vec<StatDraft>,
  /// Summary rows dropped by the aggregate heuristic.
  pub excluded: usize,
}

/// A located table that could not be classified.
#[derive(Debug)]
pub struct RejectedTable {
  pub table_id: String,
  pub error:    Error,
}

/// Everything read from one document.
#[derive(Debug, Default)]
pub struct Extraction {
  pub tables:   Vec<ExtractedTable>,
  pub rejected: Vec<RejectedTable>,
}

impl Extraction {
  pub fn tables_found(&self) -> usize { self.tables.len() + self.rejected.len() }

  pub fn drafts(&self) -> impl Iterator<Item = &StatDraft> {
    self.tables.iter().flat_map(|t| &t.drafts)
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Compiled patterns for reading match documents. Build once, reuse per
/// document.
pub struct Extractor {
  locator:    TableLocator,
  normalizer: RowNormalizer,
}

impl Extractor {
  pub fn new() -> Result<Self> {
    Ok(Self {
      locator:    TableLocator::new()?,
      normalizer: RowNormalizer::new()?,
    })
  }

  /// Read every statistics table in `html`.
  ///
  /// Fails only with [`Error::NoStatisticsTables`]; a table whose header
  /// matches no signature is listed in [`Extraction::rejected`] and the
  /// remaining tables are still read.
  pub fn extract(&self, html: &str, era: Option<Era>) -> Result<Extraction> {
    let mut extraction = Extraction::default();

    for table in self.locator.locate(html)? {
      let headers = header::reconcile(&table.header_rows);
      match classify::classify(&table.id, table.category, &headers, era) {
        Ok(sig) => {
          let normalized = self.normalizer.normalize(&table, &headers, sig);
          let team = normalize::team_identity(&table);
          extraction.tables.push(ExtractedTable {
            table_id: table.id,
            category: table.category,
            version: sig.version,
            team,
            headers,
            drafts: normalized.drafts,
            excluded: normalized.excluded,
          });
        }
        Err(error) => {
          warn!(table_id = %table.id, %error, "rejecting table");
          extraction.rejected.push(RejectedTable { table_id: table.id, error });
        }
      }
    }

    Ok(extraction)
  }
}
