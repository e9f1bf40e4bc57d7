//! The canonical field registry and per-field observations.
//!
//! Every statistic any historical table format carries is registered exactly
//! once here, with its semantic type, its home category, and the reconciled
//! header names it may appear under. Schema versions (see [`crate::schema`])
//! select subsets of this registry.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::schema::StatCategory;

// ─── Semantic types ──────────────────────────────────────────────────────────

/// How a cell's text is coerced into a [`FieldValue`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
  /// Whole number; thousands separators are accepted.
  Integer,
  /// Decimal number; a trailing `%` is accepted.
  Decimal,
  /// Verbatim trimmed text.
  Text,
  /// `YY-DDD` (years-days) or plain years; stored as integer years.
  Age,
  /// Flag prefix plus three-letter code (`us USA`); stored as the code.
  Nation,
}

/// One named, typed statistic in the unified record schema.
///
/// Every canonical field is nullable: a value may be blank in the source, fail
/// coercion, or not be tracked by an older table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalField {
  pub name:     &'static str,
  pub kind:     FieldKind,
  /// The category whose tables define this field. Legacy tables can carry
  /// fields from other categories.
  pub category: StatCategory,
  /// Reconciled header names this field is read from, most specific first.
  pub headers:  &'static [&'static str],
}

impl CanonicalField {
  pub fn matches_header(&self, header: &str) -> bool {
    self.headers.iter().any(|h| *h == header)
  }
}

const fn f(
  name: &'static str,
  kind: FieldKind,
  category: StatCategory,
  headers: &'static [&'static str],
) -> CanonicalField {
  CanonicalField { name, kind, category, headers }
}

// ─── Registry ────────────────────────────────────────────────────────────────

use FieldKind::{Age, Decimal, Integer, Nation, Text};
use StatCategory::{Defense, Keeper, Misc, Passing, Possession, Summary};

#[rustfmt::skip]
pub static FIELDS: &[CanonicalField] = &[
  // ── Summary ───────────────────────────────────────────────────────────
  f("shirt_number",               Integer, Summary, &["#"]),
  f("nation",                     Nation,  Summary, &["Nation"]),
  f("position",                   Text,    Summary, &["Pos"]),
  f("age",                        Age,     Summary, &["Age"]),
  f("minutes_played",             Integer, Summary, &["Min"]),
  f("goals",                      Integer, Summary, &["Performance_Gls", "Gls"]),
  f("assists",                    Integer, Summary, &["Performance_Ast", "Ast"]),
  f("penalty_kicks_made",         Integer, Summary, &["Performance_PK", "PK"]),
  f("penalty_kicks_attempted",    Integer, Summary, &["Performance_PKatt", "PKatt"]),
  f("shots",                      Integer, Summary, &["Performance_Sh", "Sh"]),
  f("shots_on_target",            Integer, Summary, &["Performance_SoT", "SoT"]),
  f("yellow_cards",               Integer, Summary, &["Performance_CrdY", "CrdY"]),
  f("red_cards",                  Integer, Summary, &["Performance_CrdR", "CrdR"]),
  f("touches",                    Integer, Summary, &["Performance_Touches", "Touches_Touches", "Touches"]),
  f("tackles",                    Integer, Summary, &["Performance_Tkl", "Tackles_Tkl", "Tkl"]),
  f("interceptions",              Integer, Summary, &["Performance_Int", "Int"]),
  f("blocks",                     Integer, Summary, &["Performance_Blocks", "Blocks_Blocks", "Blocks"]),
  f("expected_goals",             Decimal, Summary, &["Expected_xG", "xG"]),
  f("non_penalty_expected_goals", Decimal, Summary, &["Expected_npxG", "npxG"]),
  f("expected_assisted_goals",    Decimal, Summary, &["Expected_xAG", "xAG"]),
  f("shot_creating_actions",      Integer, Summary, &["SCA_SCA", "SCA"]),
  f("goal_creating_actions",      Integer, Summary, &["SCA_GCA", "GCA"]),
  f("passes_completed",           Integer, Summary, &["Passes_Cmp", "Total_Cmp", "Cmp"]),
  f("passes_attempted",           Integer, Summary, &["Passes_Att", "Total_Att"]),
  f("pass_completion_pct",        Decimal, Summary, &["Passes_Cmp%", "Total_Cmp%", "Cmp%"]),
  f("progressive_passes",         Integer, Summary, &["Passes_PrgP", "PrgP"]),
  f("carries",                    Integer, Summary, &["Carries_Carries", "Carries"]),
  f("progressive_carries",        Integer, Summary, &["Carries_PrgC", "PrgC"]),
  f("take_ons_attempted",         Integer, Summary, &["Take-Ons_Att"]),
  f("take_ons_successful",        Integer, Summary, &["Take-Ons_Succ", "Succ"]),

  // ── Passing ───────────────────────────────────────────────────────────
  f("pass_total_distance",        Integer, Passing, &["Total_TotDist"]),
  f("pass_progressive_distance",  Integer, Passing, &["Total_PrgDist"]),
  f("short_passes_completed",     Integer, Passing, &["Short_Cmp"]),
  f("short_passes_attempted",     Integer, Passing, &["Short_Att"]),
  f("short_pass_completion_pct",  Decimal, Passing, &["Short_Cmp%"]),
  f("medium_passes_completed",    Integer, Passing, &["Medium_Cmp"]),
  f("medium_passes_attempted",    Integer, Passing, &["Medium_Att"]),
  f("medium_pass_completion_pct", Decimal, Passing, &["Medium_Cmp%"]),
  f("long_passes_completed",      Integer, Passing, &["Long_Cmp"]),
  f("long_passes_attempted",      Integer, Passing, &["Long_Att"]),
  f("long_pass_completion_pct",   Decimal, Passing, &["Long_Cmp%"]),
  f("expected_assists",           Decimal, Passing, &["xA"]),
  f("key_passes",                 Integer, Passing, &["KP"]),
  f("passes_into_final_third",    Integer, Passing, &["1/3"]),
  f("passes_into_penalty_area",   Integer, Passing, &["PPA"]),
  f("crosses_into_penalty_area",  Integer, Passing, &["CrsPA"]),

  // ── Defense ───────────────────────────────────────────────────────────
  f("tackles_def_third",          Integer, Defense, &["Tackles_Def 3rd"]),
  f("tackles_mid_third",          Integer, Defense, &["Tackles_Mid 3rd"]),
  f("tackles_att_third",          Integer, Defense, &["Tackles_Att 3rd"]),
  f("challenges_tackled",         Integer, Defense, &["Challenges_Tkl"]),
  f("challenges_attempted",       Integer, Defense, &["Challenges_Att"]),
  f("challenge_success_pct",      Decimal, Defense, &["Challenges_Tkl%"]),
  f("challenges_lost",            Integer, Defense, &["Challenges_Lost"]),
  f("shots_blocked",              Integer, Defense, &["Blocks_Sh"]),
  f("passes_blocked",             Integer, Defense, &["Blocks_Pass"]),
  f("tackles_plus_interceptions", Integer, Defense, &["Tkl+Int"]),
  f("clearances",                 Integer, Defense, &["Clr"]),
  f("errors",                     Integer, Defense, &["Err"]),

  // ── Possession ────────────────────────────────────────────────────────
  f("touches_def_pen",            Integer, Possession, &["Touches_Def Pen"]),
  f("touches_def_third",          Integer, Possession, &["Touches_Def 3rd"]),
  f("touches_mid_third",          Integer, Possession, &["Touches_Mid 3rd"]),
  f("touches_att_third",          Integer, Possession, &["Touches_Att 3rd"]),
  f("touches_att_pen",            Integer, Possession, &["Touches_Att Pen"]),
  f("touches_live",               Integer, Possession, &["Touches_Live"]),
  f("take_on_success_pct",        Decimal, Possession, &["Take-Ons_Succ%"]),
  f("take_ons_tackled",           Integer, Possession, &["Take-Ons_Tkld"]),
  f("take_ons_tackled_pct",       Decimal, Possession, &["Take-Ons_Tkld%"]),
  f("carry_total_distance",       Integer, Possession, &["Carries_TotDist"]),
  f("carry_progressive_distance", Integer, Possession, &["Carries_PrgDist"]),
  f("carries_into_final_third",   Integer, Possession, &["Carries_1/3"]),
  f("carries_into_penalty_area",  Integer, Possession, &["Carries_CPA"]),
  f("miscontrols",                Integer, Possession, &["Carries_Mis"]),
  f("dispossessed",               Integer, Possession, &["Carries_Dis"]),
  f("passes_received",            Integer, Possession, &["Receiving_Rec"]),
  f("progressive_passes_received", Integer, Possession, &["Receiving_PrgR"]),

  // ── Misc ──────────────────────────────────────────────────────────────
  f("second_yellow_cards",        Integer, Misc, &["Performance_2CrdY", "2CrdY"]),
  f("fouls_committed",            Integer, Misc, &["Performance_Fls", "Fls"]),
  f("fouls_drawn",                Integer, Misc, &["Performance_Fld", "Fld"]),
  f("offsides",                   Integer, Misc, &["Performance_Off", "Off"]),
  f("crosses",                    Integer, Misc, &["Performance_Crs", "Crs"]),
  f("tackles_won",                Integer, Misc, &["Performance_TklW", "Tackles_TklW", "TklW"]),
  f("own_goals",                  Integer, Misc, &["Performance_OG", "OG"]),
  f("penalties_won",              Integer, Misc, &["Performance_PKwon", "PKwon"]),
  f("penalties_conceded",         Integer, Misc, &["Performance_PKcon", "PKcon"]),
  f("ball_recoveries",            Integer, Misc, &["Performance_Recov", "Recov"]),
  f("aerials_won",                Integer, Misc, &["Aerial Duels_Won"]),
  f("aerials_lost",               Integer, Misc, &["Aerial Duels_Lost"]),
  f("aerials_won_pct",            Decimal, Misc, &["Aerial Duels_Won%"]),

  // ── Goalkeeping ───────────────────────────────────────────────────────
  f("gk_shots_on_target_against", Integer, Keeper, &["Shot Stopping_SoTA", "SoTA"]),
  f("gk_goals_against",           Integer, Keeper, &["Shot Stopping_GA", "GA"]),
  f("gk_saves",                   Integer, Keeper, &["Shot Stopping_Saves", "Saves"]),
  f("gk_save_pct",                Decimal, Keeper, &["Shot Stopping_Save%", "Save%"]),
  f("gk_post_shot_xg",            Decimal, Keeper, &["Shot Stopping_PSxG", "PSxG"]),
  f("gk_launched_completed",      Integer, Keeper, &["Launched_Cmp"]),
  f("gk_launched_attempted",      Integer, Keeper, &["Launched_Att"]),
  f("gk_launched_pct",            Decimal, Keeper, &["Launched_Cmp%"]),
  f("gk_passes_attempted",        Integer, Keeper, &["Passes_Att (GK)", "Att (GK)"]),
  f("gk_throws",                  Integer, Keeper, &["Passes_Thr", "Thr"]),
  f("gk_pass_launch_pct",         Decimal, Keeper, &["Passes_Launch%"]),
  f("gk_pass_avg_length",         Decimal, Keeper, &["Passes_AvgLen"]),
  f("gk_goal_kicks",              Integer, Keeper, &["Goal Kicks_Att"]),
  f("gk_goal_kick_launch_pct",    Decimal, Keeper, &["Goal Kicks_Launch%"]),
  f("gk_goal_kick_avg_length",    Decimal, Keeper, &["Goal Kicks_AvgLen"]),
  f("gk_crosses_faced",           Integer, Keeper, &["Crosses_Opp", "Opp"]),
  f("gk_crosses_stopped",         Integer, Keeper, &["Crosses_Stp", "Stp"]),
  f("gk_crosses_stopped_pct",     Decimal, Keeper, &["Crosses_Stp%", "Stp%"]),
  f("gk_def_actions_outside_pen", Integer, Keeper, &["Sweeper_#OPA", "#OPA"]),
  f("gk_avg_def_action_distance", Decimal, Keeper, &["Sweeper_AvgDist", "AvgDist"]),
];

/// Look up a canonical field by name.
pub fn field(name: &str) -> Option<&'static CanonicalField> {
  FIELDS.iter().find(|f| f.name == name)
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A coerced, non-null field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
  Integer(i64),
  Decimal(f64),
  Text(String),
}

/// Why a field holds no value.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NullReason {
  /// The cell was empty or a dash placeholder.
  Blank,
  /// The table format of this era does not carry the field at all.
  NotTracked,
  /// The cell had text that could not be parsed; see the record diagnostics.
  CoercionFailed,
}

/// The state of one canonical field inside a record.
///
/// "Measured as zero" is `Measured(Integer(0))`; "not tracked in this era" is
/// `Null(NotTracked)`. The two are never conflated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Observation {
  Measured(FieldValue),
  Null(NullReason),
}

impl Observation {
  pub fn value(&self) -> Option<&FieldValue> {
    match self {
      Self::Measured(v) => Some(v),
      Self::Null(_) => None,
    }
  }

  pub fn is_null(&self) -> bool { matches!(self, Self::Null(_)) }

  pub fn is_not_tracked(&self) -> bool {
    matches!(self, Self::Null(NullReason::NotTracked))
  }

  /// The discriminant stored in the `state` column.
  pub fn state(&self) -> &'static str {
    match self {
      Self::Measured(_) => "measured",
      Self::Null(NullReason::Blank) => "blank",
      Self::Null(NullReason::NotTracked) => "not_tracked",
      Self::Null(NullReason::CoercionFailed) => "coercion_failed",
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Measured(FieldValue::Integer(n)) => Some(*n),
      _ => None,
    }
  }

  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Measured(FieldValue::Decimal(n)) => Some(*n),
      Self::Measured(FieldValue::Integer(n)) => Some(*n as f64),
      _ => None,
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Measured(FieldValue::Text(s)) => Some(s),
      _ => None,
    }
  }
}

// ─── Diagnostics ─────────────────────────────────────────────────────────────

/// A per-field coercion failure. Never fatal: the field becomes
/// `Null(CoercionFailed)` and this error rides along with the record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("cannot read {raw:?} as {kind} for field {field}")]
pub struct FieldCoercionError {
  pub field: String,
  pub kind:  FieldKind,
  pub raw:   String,
}
