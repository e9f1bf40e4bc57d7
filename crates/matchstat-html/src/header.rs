//! Header reconciler: flattens one or two header rows into one field name per
//! column.
//!
//! The resulting list is shared by the classifier and the row normalizer, so
//! column `i` of the output always names column `i` of every body row.

/// Flatten `rows` (top to bottom, colspans already expanded).
///
/// - one row: trimmed cell text, blanks become `col_<i>`;
/// - two rows: `<top>_<bottom>` when both are present and differ, otherwise
///   whichever is present, otherwise `col_<i>`;
/// - a top row that only repeats the bottom row or does not line up with it
///   is decorative and ignored. A group label spanning every column is still
///   a group.
///
/// With more than two rows only the last two are considered.
pub fn reconcile(rows: &[Vec<String>]) -> Vec<String> {
  match rows {
    [] => Vec::new(),
    [single] => single_row(single),
    [.., top, bottom] => {
      if is_decorative(top, bottom) {
        single_row(bottom)
      } else {
        top
          .iter()
          .zip(bottom)
          .enumerate()
          .map(|(i, (top, bottom))| combine(i, top.trim(), bottom.trim()))
          .collect()
      }
    }
  }
}

fn single_row(row: &[String]) -> Vec<String> {
  row
    .iter()
    .enumerate()
    .map(|(i, cell)| combine(i, "", cell.trim()))
    .collect()
}

fn combine(i: usize, top: &str, bottom: &str) -> String {
  match (top.is_empty(), bottom.is_empty()) {
    (false, false) if top != bottom => format!("{top}_{bottom}"),
    (_, false) => bottom.to_owned(),
    (false, true) => top.to_owned(),
    (true, true) => placeholder(i),
  }
}

fn placeholder(i: usize) -> String { format!("col_{i}") }

fn is_decorative(top: &[String], bottom: &[String]) -> bool {
  if top.len() != bottom.len() {
    return true;
  }

  top
    .iter()
    .zip(bottom)
    .all(|(t, b)| t.trim().is_empty() || t.trim() == b.trim())
}
