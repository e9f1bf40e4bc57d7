//! Identifier newtypes.
//!
//! The statistics site keys matches, players and teams by short lowercase hex
//! fragments. Those fragments are unstable across time for players and teams,
//! so they only ever appear as [`SourceId`]s; durable identities are
//! [`uuid::Uuid`]s owned by the reference store.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A season tag, e.g. `2022`.
pub type SeasonId = u16;

// ─── MatchId ─────────────────────────────────────────────────────────────────

/// An 8-character lowercase hexadecimal match identifier.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId(String);

impl MatchId {
  pub const LEN: usize = 8;

  pub fn parse(s: &str) -> Result<Self> {
    let valid = s.len() == Self::LEN
      && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if valid {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidMatchId(s.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for MatchId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for MatchId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<MatchId> for String {
  fn from(id: MatchId) -> Self { id.0 }
}

impl fmt::Display for MatchId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── SourceId ────────────────────────────────────────────────────────────────

/// An identifier fragment assigned by the external statistics site.
///
/// Only lightly validated: non-empty, no whitespace. Stored lowercased so
/// `A1B2C3D4` and `a1b2c3d4` refer to the same mapping.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
  pub fn parse(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
      return Err(Error::InvalidSourceId(s.to_owned()));
    }
    Ok(Self(trimmed.to_ascii_lowercase()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for SourceId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for SourceId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<SourceId> for String {
  fn from(id: SourceId) -> Self { id.0 }
}

impl fmt::Display for SourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
