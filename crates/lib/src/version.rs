//! Package versions and version ranges.
//!
//! Versions are dot-separated segments compared one segment at a time:
//! - two numeric segments compare numerically (`4.10 > 4.9`)
//! - two alphanumeric segments compare lexicographically (`p04 < p05`)
//! - a numeric segment sorts below an alphanumeric one
//! - a missing segment sorts below any present one (`4.9 < 4.9.6`)
//!
//! Ranges use the recipe syntax:
//!
//! | text    | meaning                       |
//! |---------|-------------------------------|
//! | `X`     | exactly `X`                   |
//! | `X:`    | `X` or newer                  |
//! | `X:Y`   | between `X` and `Y` inclusive |
//! | `:Y`    | `Y` or older                  |
//! | `:`     | any version                   |

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
  #[error("empty version string")]
  Empty,

  #[error("invalid version '{0}': empty segment")]
  EmptySegment(String),

  #[error("invalid version '{version}': unexpected character '{ch}'")]
  InvalidChar { version: String, ch: char },

  #[error("invalid range '{range}': lower bound {lower} is above upper bound {upper}")]
  InvertedRange { range: String, lower: String, upper: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
  Numeric(u64),
  Alpha(String),
}

impl Ord for Segment {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
      (Segment::Alpha(a), Segment::Alpha(b)) => a.cmp(b),
      (Segment::Numeric(_), Segment::Alpha(_)) => Ordering::Less,
      (Segment::Alpha(_), Segment::Numeric(_)) => Ordering::Greater,
    }
  }
}

impl PartialOrd for Segment {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

/// A declared package version such as `5.34.25`, `4.9.6.p04` or `2013-07-31`.
#[derive(Debug, Clone)]
pub struct Version {
  text: String,
  segments: Vec<Segment>,
}

impl Version {
  pub fn parse(text: &str) -> Result<Self, VersionError> {
    let text = text.trim();
    if text.is_empty() {
      return Err(VersionError::Empty);
    }

    let mut segments = Vec::new();
    for part in text.split('.') {
      if part.is_empty() {
        return Err(VersionError::EmptySegment(text.to_string()));
      }
      if let Some(ch) = part.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_')) {
        return Err(VersionError::InvalidChar {
          version: text.to_string(),
          ch,
        });
      }
      let segment = match part.parse::<u64>() {
        Ok(n) => Segment::Numeric(n),
        Err(_) => Segment::Alpha(part.to_string()),
      };
      segments.push(segment);
    }

    Ok(Self {
      text: text.to_string(),
      segments,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.text
  }

  /// Number of dot-separated segments.
  pub fn len(&self) -> usize {
    self.segments.len()
  }

  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.segments == other.segments
  }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.segments.hash(state);
  }
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    // Vec's lexicographic ordering already treats a missing segment as lower.
    self.segments.cmp(&other.segments)
  }
}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.text)
  }
}

impl FromStr for Version {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl Serialize for Version {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.text)
  }
}

impl<'de> Deserialize<'de> for Version {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let text = String::deserialize(deserializer)?;
    Version::parse(&text).map_err(serde::de::Error::custom)
  }
}

/// A constraint on acceptable versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionRange {
  Any,
  Exact(Version),
  AtLeast(Version),
  AtMost(Version),
  Between(Version, Version),
}

impl VersionRange {
  pub fn parse(text: &str) -> Result<Self, VersionError> {
    let text = text.trim();
    if text.is_empty() {
      return Err(VersionError::Empty);
    }

    let Some((lower, upper)) = text.split_once(':') else {
      return Ok(VersionRange::Exact(Version::parse(text)?));
    };

    match (lower.trim(), upper.trim()) {
      ("", "") => Ok(VersionRange::Any),
      (lo, "") => Ok(VersionRange::AtLeast(Version::parse(lo)?)),
      ("", hi) => Ok(VersionRange::AtMost(Version::parse(hi)?)),
      (lo, hi) => {
        let lo = Version::parse(lo)?;
        let hi = Version::parse(hi)?;
        if lo > hi {
          return Err(VersionError::InvertedRange {
            range: text.to_string(),
            lower: lo.to_string(),
            upper: hi.to_string(),
          });
        }
        Ok(VersionRange::Between(lo, hi))
      }
    }
  }

  pub fn contains(&self, version: &Version) -> bool {
    match self {
      VersionRange::Any => true,
      VersionRange::Exact(v) => version == v,
      VersionRange::AtLeast(lo) => version >= lo,
      VersionRange::AtMost(hi) => version <= hi,
      VersionRange::Between(lo, hi) => version >= lo && version <= hi,
    }
  }
}

impl fmt::Display for VersionRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionRange::Any => write!(f, ":"),
      VersionRange::Exact(v) => write!(f, "{}", v),
      VersionRange::AtLeast(lo) => write!(f, "{}:", lo),
      VersionRange::AtMost(hi) => write!(f, ":{}", hi),
      VersionRange::Between(lo, hi) => write!(f, "{}:{}", lo, hi),
    }
  }
}

impl FromStr for VersionRange {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl Serialize for VersionRange {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for VersionRange {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let text = String::deserialize(deserializer)?;
    VersionRange::parse(&text).map_err(serde::de::Error::custom)
  }
}
