//! Statistics categories, schema versions, and the signature registry used to
//! classify a reconciled header.
//!
//! A [`Signature`] pairs a tolerated column-count range with the canonical
//! fields a header must expose. Each version also declares the exact field
//! subset it carries; everything else in the category it covers is
//! explicitly `NotTracked` for records of that version.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::field::{CanonicalField, FIELDS};

// ─── Category ────────────────────────────────────────────────────────────────

/// Which per-match statistics table a [`Signature`] applies to. Mirrors the
/// suffix of the table identifier on the source page.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatCategory {
  Summary,
  Passing,
  Defense,
  Possession,
  Misc,
  Keeper,
}

/// The broad data era of a table format. Callers may pin a document to one
/// era when they already know it.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Era {
  Legacy,
  Modern,
}

// ─── Versions ────────────────────────────────────────────────────────────────

/// A specific historical table format.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SchemaVersion {
  /// Pre-tracking-data summary table: basic performance plus discipline.
  Legacy24,
  /// Summary table with expected-goals, shot-creation, passing and carrying.
  Modern37,
  PassingModern,
  DefenseModern,
  PossessionModern,
  MiscModern,
  /// Shot-stopping only.
  KeeperLegacy,
  KeeperModern,
}

impl SchemaVersion {
  pub fn signature(self) -> &'static Signature {
    // Every variant has exactly one entry; see `every_version_has_a_signature`.
    SIGNATURES
      .iter()
      .find(|s| s.version == self)
      .unwrap_or(&SIGNATURES[0])
  }

  pub fn category(self) -> StatCategory { self.signature().category }

  pub fn era(self) -> Era { self.signature().era }

  /// Canonical fields this version carries.
  pub fn fields(self) -> impl Iterator<Item = &'static CanonicalField> {
    let sig = self.signature();
    FIELDS.iter().filter(move |f| sig.fields.contains(&f.name))
  }

  /// Fields of the covered category this version does not carry; records of
  /// this version hold them as `Null(NotTracked)`.
  pub fn not_tracked(self) -> impl Iterator<Item = &'static CanonicalField> {
    let sig = self.signature();
    FIELDS
      .iter()
      .filter(move |f| f.category == sig.category && !sig.fields.contains(&f.name))
  }
}

// ─── Signatures ──────────────────────────────────────────────────────────────

/// A (column-count, required-field-subset) classification signature.
#[derive(Debug, Clone)]
pub struct Signature {
  pub version:  SchemaVersion,
  pub category: StatCategory,
  pub era:      Era,
  /// Tolerated number of reconciled header columns, identity column included.
  pub columns:  RangeInclusive<usize>,
  /// Canonical fields that must all be resolvable from the header.
  pub required: &'static [&'static str],
  /// Canonical fields the version carries.
  pub fields:   &'static [&'static str],
}

impl Signature {
  /// Ordering key: more required fields first, then the narrower column range.
  pub fn specificity(&self) -> (usize, std::cmp::Reverse<usize>) {
    let width = self.columns.end().saturating_sub(*self.columns.start());
    (self.required.len(), std::cmp::Reverse(width))
  }
}

#[rustfmt::skip]
const LEGACY24_FIELDS: &[&str] = &[
  "shirt_number", "nation", "position", "age", "minutes_played",
  "goals", "assists", "penalty_kicks_made", "penalty_kicks_attempted",
  "shots", "shots_on_target", "yellow_cards", "red_cards",
  "second_yellow_cards", "fouls_committed", "fouls_drawn", "offsides",
  "crosses", "tackles_won", "interceptions", "own_goals",
  "penalties_won", "penalties_conceded",
];

#[rustfmt::skip]
const MODERN37_FIELDS: &[&str] = &[
  "shirt_number", "nation", "position", "age", "minutes_played",
  "goals", "assists", "penalty_kicks_made", "penalty_kicks_attempted",
  "shots", "shots_on_target", "yellow_cards", "red_cards",
  "touches", "tackles", "interceptions", "blocks",
  "expected_goals", "non_penalty_expected_goals", "expected_assisted_goals",
  "shot_creating_actions", "goal_creating_actions",
  "passes_completed", "passes_attempted", "pass_completion_pct", "progressive_passes",
  "carries", "progressive_carries",
  "take_ons_attempted", "take_ons_successful",
];

#[rustfmt::skip]
const PASSING_FIELDS: &[&str] = &[
  "passes_completed", "passes_attempted", "pass_completion_pct",
  "pass_total_distance", "pass_progressive_distance",
  "short_passes_completed", "short_passes_attempted", "short_pass_completion_pct",
  "medium_passes_completed", "medium_passes_attempted", "medium_pass_completion_pct",
  "long_passes_completed", "long_passes_attempted", "long_pass_completion_pct",
  "expected_assists", "key_passes", "passes_into_final_third",
  "passes_into_penalty_area", "crosses_into_penalty_area", "progressive_passes",
];

#[rustfmt::skip]
const DEFENSE_FIELDS: &[&str] = &[
  "tackles", "tackles_won", "tackles_def_third", "tackles_mid_third", "tackles_att_third",
  "challenges_tackled", "challenges_attempted", "challenge_success_pct", "challenges_lost",
  "blocks", "shots_blocked", "passes_blocked",
  "interceptions", "tackles_plus_interceptions", "clearances", "errors",
];

#[rustfmt::skip]
const POSSESSION_FIELDS: &[&str] = &[
  "touches", "touches_def_pen", "touches_def_third", "touches_mid_third",
  "touches_att_third", "touches_att_pen", "touches_live",
  "take_ons_attempted", "take_ons_successful", "take_on_success_pct",
  "take_ons_tackled", "take_ons_tackled_pct",
  "carries", "carry_total_distance", "carry_progressive_distance", "progressive_carries",
  "carries_into_final_third", "carries_into_penalty_area", "miscontrols", "dispossessed",
  "passes_received", "progressive_passes_received",
];

#[rustfmt::skip]
const MISC_FIELDS: &[&str] = &[
  "yellow_cards", "red_cards", "second_yellow_cards", "fouls_committed",
  "fouls_drawn", "offsides", "crosses", "interceptions", "tackles_won",
  "penalties_won", "penalties_conceded", "own_goals", "ball_recoveries",
  "aerials_won", "aerials_lost", "aerials_won_pct",
];

#[rustfmt::skip]
const KEEPER_LEGACY_FIELDS: &[&str] = &[
  "gk_shots_on_target_against", "gk_goals_against", "gk_saves", "gk_save_pct",
];

#[rustfmt::skip]
const KEEPER_MODERN_FIELDS: &[&str] = &[
  "gk_shots_on_target_against", "gk_goals_against", "gk_saves", "gk_save_pct",
  "gk_post_shot_xg", "gk_launched_completed", "gk_launched_attempted", "gk_launched_pct",
  "gk_passes_attempted", "gk_throws", "gk_pass_launch_pct", "gk_pass_avg_length",
  "gk_goal_kicks", "gk_goal_kick_launch_pct", "gk_goal_kick_avg_length",
  "gk_crosses_faced", "gk_crosses_stopped", "gk_crosses_stopped_pct",
  "gk_def_actions_outside_pen", "gk_avg_def_action_distance",
];

/// Every known table format.
pub static SIGNATURES: &[Signature] = &[
  Signature {
    version:  SchemaVersion::Modern37,
    category: StatCategory::Summary,
    era:      Era::Modern,
    columns:  29..=40,
    required: &[
      "minutes_played",
      "goals",
      "assists",
      "expected_goals",
      "shot_creating_actions",
      "passes_completed",
    ],
    fields:   MODERN37_FIELDS,
  },
  Signature {
    version:  SchemaVersion::Legacy24,
    category: StatCategory::Summary,
    era:      Era::Legacy,
    columns:  22..=26,
    required: &["minutes_played", "goals", "assists", "shots", "yellow_cards"],
    fields:   LEGACY24_FIELDS,
  },
  Signature {
    version:  SchemaVersion::PassingModern,
    category: StatCategory::Passing,
    era:      Era::Modern,
    columns:  24..=32,
    required: &["pass_total_distance", "short_passes_completed", "key_passes"],
    fields:   PASSING_FIELDS,
  },
  Signature {
    version:  SchemaVersion::DefenseModern,
    category: StatCategory::Defense,
    era:      Era::Modern,
    columns:  18..=26,
    required: &["tackles_def_third", "challenges_attempted", "clearances"],
    fields:   DEFENSE_FIELDS,
  },
  Signature {
    version:  SchemaVersion::PossessionModern,
    category: StatCategory::Possession,
    era:      Era::Modern,
    columns:  24..=32,
    required: &["touches_def_pen", "carry_total_distance", "passes_received"],
    fields:   POSSESSION_FIELDS,
  },
  Signature {
    version:  SchemaVersion::MiscModern,
    category: StatCategory::Misc,
    era:      Era::Modern,
    columns:  18..=26,
    required: &["fouls_committed", "ball_recoveries", "aerials_won"],
    fields:   MISC_FIELDS,
  },
  Signature {
    version:  SchemaVersion::KeeperModern,
    category: StatCategory::Keeper,
    era:      Era::Modern,
    columns:  20..=28,
    required: &["gk_saves", "gk_post_shot_xg", "gk_launched_attempted"],
    fields:   KEEPER_MODERN_FIELDS,
  },
  Signature {
    version:  SchemaVersion::KeeperLegacy,
    category: StatCategory::Keeper,
    era:      Era::Legacy,
    columns:  6..=12,
    required: &["gk_shots_on_target_against", "gk_goals_against", "gk_saves"],
    fields:   KEEPER_LEGACY_FIELDS,
  },
];

/// Signatures applicable to `category`, most specific first.
pub fn signatures_for(category: StatCategory) -> Vec<&'static Signature> {
  let mut sigs: Vec<_> =
    SIGNATURES.iter().filter(|s| s.category == category).collect();
  sigs.sort_by(|a, b| b.specificity().cmp(&a.specificity()));
  sigs
}
