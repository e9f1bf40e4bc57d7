//! Table locator: finds per-player statistics tables by identifier pattern.
//!
//! The statistics site names its tables `stats_<team>_<category>` and
//! `keeper_stats_<team>`, where `<team>` is the team's 8-hex source id. Some
//! of them are shipped inside HTML comments and only un-commented by script
//! on the live page; those are parsed too.

use std::collections::HashSet;

use matchstat_core::{ids::SourceId, schema::StatCategory};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{Error, Result};

const STATS_TABLE_ID: &str =
  r"^stats_([0-9a-f]{8})_(summary|passing|defense|possession|misc)$";
const KEEPER_TABLE_ID: &str = r"^keeper_stats_([0-9a-f]{8})$";

/// Body rows carrying these classes repeat the header or separate groups.
const SKIPPED_ROW_CLASSES: &[&str] =
  &["thead", "spacer", "over_header", "partial_table"];

/// Upper bound on a single cell's `colspan`.
const MAX_COLSPAN: usize = 64;

// ─── Raw table ───────────────────────────────────────────────────────────────

/// One `th`/`td` cell, read verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
  /// Text content with whitespace runs collapsed.
  pub text:       String,
  pub data_stat:  Option<String>,
  /// The site's own id for the row entity, when the cell carries one.
  pub append_csv: Option<String>,
  /// `href` of the first link inside the cell.
  pub href:       Option<String>,
  pub is_header:  bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
  pub cells: Vec<RawCell>,
}

/// A located statistics table. Lives only while one document is processed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
  pub id:             String,
  pub category:       StatCategory,
  /// The team whose players the table lists, taken from the table id.
  pub team_source_id: SourceId,
  pub caption:        Option<String>,
  /// Header rows top to bottom, with `colspan` already expanded so every row
  /// is positionally aligned with the body.
  pub header_rows:    Vec<Vec<String>>,
  pub rows:           Vec<RawRow>,
  /// The `tfoot` totals row, if any.
  pub footer:         Option<RawRow>,
}

// ─── Locator ─────────────────────────────────────────────────────────────────

pub(crate) struct TableLocator {
  stats_id:  Regex,
  keeper_id: Regex,
  anchor:    Selector,
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
  Selector::parse(css).map_err(|e| Error::Selector(e.to_string()))
}

impl TableLocator {
  pub fn new() -> Result<Self> {
    Ok(Self {
      stats_id:  Regex::new(STATS_TABLE_ID)?,
      keeper_id: Regex::new(KEEPER_TABLE_ID)?,
      anchor:    selector("a[href]")?,
    })
  }

  /// Every statistics table in `html`, in document order. A table id seen
  /// twice (once live, once commented) is kept only the first time.
  pub fn locate(&self, html: &str) -> Result<Vec<RawTable>> {
    let doc = Html::parse_document(html);
    let mut tables = Vec::new();
    let mut seen = HashSet::new();
    self.collect(&doc, true, &mut tables, &mut seen);

    if tables.is_empty() {
      return Err(Error::NoStatisticsTables);
    }
    Ok(tables)
  }

  fn collect(
    &self,
    doc: &Html,
    open_comments: bool,
    out: &mut Vec<RawTable>,
    seen: &mut HashSet<String>,
  ) {
    for node in doc.tree.root().descendants() {
      if let Some(element) = ElementRef::wrap(node) {
        if element.value().name() == "table"
          && let Some(table) = self.read_table(element)
          && seen.insert(table.id.clone())
        {
          out.push(table);
        }
      } else if open_comments
        && let Some(comment) = node.value().as_comment()
      {
        let body: &str = comment;
        if body.contains("<table") {
          let fragment = Html::parse_fragment(body);
          self.collect(&fragment, false, out, seen);
        }
      }
    }
  }

  fn match_id(&self, id: &str) -> Option<(StatCategory, SourceId)> {
    if let Some(caps) = self.stats_id.captures(id) {
      let category = caps[2].parse().ok()?;
      let team = SourceId::parse(&caps[1]).ok()?;
      return Some((category, team));
    }
    let caps = self.keeper_id.captures(id)?;
    Some((StatCategory::Keeper, SourceId::parse(&caps[1]).ok()?))
  }

  fn read_table(&self, table: ElementRef<'_>) -> Option<RawTable> {
    let id = table.value().id()?;
    let (category, team_source_id) = self.match_id(id)?;

    let mut caption = None;
    let mut header_rows = Vec::new();
    let mut rows = Vec::new();
    let mut footer = None;
    let mut has_body = false;

    for section in table.children().filter_map(ElementRef::wrap) {
      match section.value().name() {
        "caption" => caption = Some(text_of(section)),
        "thead" => {
          header_rows.extend(rows_of(section).map(expand_header_row));
        }
        "tbody" => {
          has_body = true;
          rows.extend(
            rows_of(section)
              .filter(|tr| !is_skipped(*tr))
              .map(|tr| self.read_row(tr)),
          );
        }
        "tfoot" => footer = rows_of(section).last().map(|tr| self.read_row(tr)),
        _ => {}
      }
    }

    if !has_body {
      debug!(table_id = id, "statistics table has no body, skipping");
      return None;
    }

    debug!(
      table_id = id,
      %category,
      header_rows = header_rows.len(),
      rows = rows.len(),
      "located statistics table"
    );

    Some(RawTable {
      id: id.to_owned(),
      category,
      team_source_id,
      caption,
      header_rows,
      rows,
      footer,
    })
  }

  fn read_row(&self, tr: ElementRef<'_>) -> RawRow {
    let mut cells = Vec::new();
    for cell in cells_of(tr) {
      let el = cell.value();
      cells.push(RawCell {
        text:       text_of(cell),
        data_stat:  el.attr("data-stat").map(str::to_owned),
        append_csv: el.attr("data-append-csv").map(str::to_owned),
        href:       cell
          .select(&self.anchor)
          .next()
          .and_then(|a| a.value().attr("href"))
          .map(str::to_owned),
        is_header:  el.name() == "th",
      });
      // Keep body columns aligned with an expanded header.
      for _ in 1..colspan(cell) {
        cells.push(RawCell::default());
      }
    }
    RawRow { cells }
  }
}

// ─── DOM helpers ─────────────────────────────────────────────────────────────

fn rows_of<'a>(section: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
  section
    .children()
    .filter_map(ElementRef::wrap)
    .filter(|el| el.value().name() == "tr")
}

fn cells_of<'a>(tr: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
  tr.children()
    .filter_map(ElementRef::wrap)
    .filter(|el| matches!(el.value().name(), "th" | "td"))
}

fn is_skipped(tr: ElementRef<'_>) -> bool {
  tr.value().classes().any(|c| SKIPPED_ROW_CLASSES.contains(&c))
}

fn colspan(cell: ElementRef<'_>) -> usize {
  cell
    .value()
    .attr("colspan")
    .and_then(|s| s.trim().parse::<usize>().ok())
    .unwrap_or(1)
    .clamp(1, MAX_COLSPAN)
}

fn expand_header_row(tr: ElementRef<'_>) -> Vec<String> {
  let mut out = Vec::new();
  for cell in cells_of(tr) {
    let text = text_of(cell);
    for _ in 0..colspan(cell) {
      out.push(text.clone());
    }
  }
  out
}

pub(crate) fn text_of(el: ElementRef<'_>) -> String {
  el.text()
    .flat_map(|t| t.split_whitespace())
    .collect::<Vec<_>>()
    .join(" ")
}
