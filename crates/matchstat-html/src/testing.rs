//! Fixtures shared by the unit tests of this crate.

use crate::locate::{RawCell, RawRow};

fn strings(cells: &[&str]) -> Vec<String> {
  cells.iter().map(|c| c.to_string()).collect()
}

fn grouped(leading: usize, groups: &[(&str, &[&str])]) -> Vec<Vec<String>> {
  let mut top = vec![String::new(); leading];
  let mut bottom = strings(&["Player", "#", "Nation", "Pos", "Age", "Min"]);
  bottom.truncate(leading);
  for (group, subs) in groups {
    for sub in *subs {
      top.push(group.to_string());
      bottom.push(sub.to_string());
    }
  }
  vec![top, bottom]
}

/// Current summary layout: 31 columns.
pub fn modern_summary_headers() -> Vec<Vec<String>> {
  grouped(6, &[
    ("Performance", &[
      "Gls", "Ast", "PK", "PKatt", "Sh", "SoT", "CrdY", "CrdR", "Touches", "Tkl",
      "Int", "Blocks",
    ]),
    ("Expected", &["xG", "npxG", "xAG"]),
    ("SCA", &["SCA", "GCA"]),
    ("Passes", &["Cmp", "Att", "Cmp%", "PrgP"]),
    ("Carries", &["Carries", "PrgC"]),
    ("Take-Ons", &["Att", "Succ"]),
  ])
}

/// Pre-tracking-data summary layout: 24 columns.
pub fn legacy_summary_headers() -> Vec<Vec<String>> {
  grouped(6, &[("Performance", &[
    "Gls", "Ast", "PK", "PKatt", "Sh", "SoT", "CrdY", "CrdR", "2CrdY", "Fls", "Fld",
    "Off", "Crs", "TklW", "Int", "OG", "PKwon", "PKcon",
  ])])
}

/// Passing layout: 28 columns.
pub fn passing_headers() -> Vec<Vec<String>> {
  grouped(6, &[
    ("Total", &["Cmp", "Att", "Cmp%", "TotDist", "PrgDist"]),
    ("Short", &["Cmp", "Att", "Cmp%"]),
    ("Medium", &["Cmp", "Att", "Cmp%"]),
    ("Long", &["Cmp", "Att", "Cmp%"]),
    ("", &["Ast", "xAG", "xA", "KP", "1/3", "PPA", "CrsPA", "PrgP"]),
  ])
}

/// Defensive actions layout: 22 columns.
pub fn defense_headers() -> Vec<Vec<String>> {
  grouped(6, &[
    ("Tackles", &["Tkl", "TklW", "Def 3rd", "Mid 3rd", "Att 3rd"]),
    ("Challenges", &["Tkl", "Att", "Tkl%", "Lost"]),
    ("Blocks", &["Blocks", "Sh", "Pass"]),
    ("", &["Int", "Tkl+Int", "Clr", "Err"]),
  ])
}

/// Possession layout: 28 columns.
pub fn possession_headers() -> Vec<Vec<String>> {
  grouped(6, &[
    ("Touches", &[
      "Touches", "Def Pen", "Def 3rd", "Mid 3rd", "Att 3rd", "Att Pen", "Live",
    ]),
    ("Take-Ons", &["Att", "Succ", "Succ%", "Tkld", "Tkld%"]),
    ("Carries", &["Carries", "TotDist", "PrgDist", "PrgC", "1/3", "CPA", "Mis", "Dis"]),
    ("Receiving", &["Rec", "PrgR"]),
  ])
}

/// Miscellaneous layout: 22 columns.
pub fn misc_headers() -> Vec<Vec<String>> {
  grouped(6, &[
    ("Performance", &[
      "CrdY", "CrdR", "2CrdY", "Fls", "Fld", "Off", "Crs", "Int", "TklW", "PKwon",
      "PKcon", "OG", "Recov",
    ]),
    ("Aerial Duels", &["Won", "Lost", "Won%"]),
  ])
}

/// Goalkeeping layout with post-shot and distribution columns: 26 columns.
pub fn keeper_modern_headers() -> Vec<Vec<String>> {
  grouped(6, &[
    ("Shot Stopping", &["SoTA", "GA", "Saves", "Save%", "PSxG"]),
    ("Launched", &["Cmp", "Att", "Cmp%"]),
    ("Passes", &["Att (GK)", "Thr", "Launch%", "AvgLen"]),
    ("Goal Kicks", &["Att", "Launch%", "AvgLen"]),
    ("Crosses", &["Opp", "Stp", "Stp%"]),
    ("Sweeper", &["#OPA", "AvgDist"]),
  ])
}

/// Goalkeeping layout before distribution tracking: 10 columns.
pub fn keeper_legacy_headers() -> Vec<Vec<String>> {
  grouped(6, &[("Shot Stopping", &["SoTA", "GA", "Saves", "Save%"])])
}

/// A body row: `name`, fixed person columns, then `stats` from the first
/// statistic column on, padded with `0` to `width`.
pub fn raw_row(name: &str, stats: &[&str], width: usize) -> RawRow {
  let mut cells = vec![RawCell {
    text: name.to_owned(),
    data_stat: Some("player".into()),
    is_header: true,
    ..RawCell::default()
  }];
  for text in ["7", "eng ENG", "FW", "28-100", "90"].iter().chain(stats) {
    cells.push(RawCell { text: text.to_string(), ..RawCell::default() });
  }
  while cells.len() < width {
    cells.push(RawCell { text: "0".into(), ..RawCell::default() });
  }
  RawRow { cells }
}

/// Render a statistics table. Consecutive equal top-row labels become one
/// `colspan` cell. Each body row is `(name, source id, stat cells)`.
pub fn table_html(
  id: &str,
  caption: &str,
  header_rows: &[Vec<String>],
  body: &[(&str, &str, Vec<String>)],
  footer: Option<Vec<String>>,
) -> String {
  let mut html = format!("<table id=\"{id}\"><caption>{caption}</caption><thead>");
  for row in header_rows {
    html.push_str("<tr>");
    let mut i = 0;
    while i < row.len() {
      let span = row[i..].iter().take_while(|c| **c == row[i]).count();
      if span > 1 && !row[i].is_empty() {
        html.push_str(&format!("<th colspan=\"{span}\">{}</th>", row[i]));
        i += span;
      } else {
        html.push_str(&format!("<th>{}</th>", row[i]));
        i += 1;
      }
    }
    html.push_str("</tr>");
  }
  html.push_str("</thead><tbody>");
  for (name, source_id, cells) in body {
    html.push_str(&format!(
      "<tr><th data-stat=\"player\" data-append-csv=\"{source_id}\">\
       <a href=\"/en/players/{source_id}/{}\">{name}</a></th>",
      name.replace(' ', "-")
    ));
    for cell in cells {
      html.push_str(&format!("<td>{cell}</td>"));
    }
    html.push_str("</tr>");
  }
  html.push_str("</tbody>");
  if let Some(cells) = footer {
    html.push_str("<tfoot><tr><th>Squad Total</th>");
    for cell in cells {
      html.push_str(&format!("<td>{cell}</td>"));
    }
    html.push_str("</tr></tfoot>");
  }
  html.push_str("</table>");
  html
}

/// Stat cells for a row of `headers`: person columns, then `stats`, then `0`.
pub fn cells(headers: &[Vec<String>], stats: &[&str]) -> Vec<String> {
  let width = headers.last().map(Vec::len).unwrap_or_default();
  let mut out = strings(&["7", "eng ENG", "FW", "28-100", "90"]);
  out.extend(strings(stats));
  out.resize(width.saturating_sub(1), "0".into());
  out
}
