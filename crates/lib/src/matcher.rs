//! `when` predicates and their evaluation against candidate specs.
//!
//! A predicate is a conjunction: an optional version range plus any number
//! of required variant values. Matching is total and only consults values
//! the candidate has already settled; an unsettled version or variant makes
//! its clause false.

use std::collections::BTreeMap;
use std::fmt;

use crate::syntax::{SyntaxError, parse_clause};
use crate::version::{Version, VersionRange};

/// `+` for an enabled variant, `~` for a disabled one.
pub fn variant_sigil(value: bool) -> char {
  if value { '+' } else { '~' }
}

/// Read access to a spec that may still be under construction.
pub trait SpecView {
  fn package(&self) -> &str;

  fn version(&self) -> Option<&Version>;

  fn variant(&self, name: &str) -> Option<bool>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
  pub version: Option<VersionRange>,
  pub variants: BTreeMap<String, bool>,
}

impl Predicate {
  /// Parse a predicate such as `@5.35:`, `+cxx14` or `@4.2.3 ~debug`.
  ///
  /// Package names are not allowed: a predicate always refers to the spec
  /// that declares it.
  pub fn parse(text: &str) -> Result<Self, SyntaxError> {
    let clause = parse_clause(text)?;
    if let Some(name) = clause.name {
      let pos = text.find(name.as_str()).unwrap_or(0);
      return Err(SyntaxError::Unexpected {
        text: text.to_string(),
        pos,
        ch: name.chars().next().unwrap_or(' '),
      });
    }

    Ok(Self {
      version: clause.range,
      variants: clause.variants.into_iter().collect(),
    })
  }

  pub fn matches(&self, spec: &impl SpecView) -> bool {
    if let Some(range) = &self.version {
      match spec.version() {
        Some(version) if range.contains(version) => {}
        _ => return false,
      }
    }

    self
      .variants
      .iter()
      .all(|(name, wanted)| spec.variant(name) == Some(*wanted))
  }

  /// Variant names this predicate refers to.
  pub fn referenced_variants(&self) -> impl Iterator<Item = &str> {
    self.variants.keys().map(String::as_str)
  }
}

impl fmt::Display for Predicate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut parts = Vec::new();
    if let Some(range) = &self.version {
      parts.push(format!("@{}", range));
    }
    for (name, value) in &self.variants {
      parts.push(format!("{}{}", variant_sigil(*value), name));
    }
    write!(f, "{}", parts.join(" "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Candidate {
    version: Option<Version>,
    variants: BTreeMap<String, bool>,
  }

  impl Candidate {
    fn new(version: Option<&str>) -> Self {
      Self {
        version: version.map(|v| Version::parse(v).unwrap()),
        variants: BTreeMap::new(),
      }
    }

    fn with(mut self, name: &str, value: bool) -> Self {
      self.variants.insert(name.to_string(), value);
      self
    }
  }

  impl SpecView for Candidate {
    fn package(&self) -> &str {
      "candidate"
    }

    fn version(&self) -> Option<&Version> {
      self.version.as_ref()
    }

    fn variant(&self, name: &str) -> Option<bool> {
      self.variants.get(name).copied()
    }
  }

  #[test]
  fn version_clause() {
    let pred = Predicate::parse("@5.35:").unwrap();
    assert!(pred.matches(&Candidate::new(Some("5.36"))));
    assert!(!pred.matches(&Candidate::new(Some("5.34.25"))));
  }

  #[test]
  fn exact_version_clause() {
    let pred = Predicate::parse("@4.9.6.p04").unwrap();
    assert!(pred.matches(&Candidate::new(Some("4.9.6.p04"))));
    assert!(!pred.matches(&Candidate::new(Some("4.10.2"))));
  }

  #[test]
  fn variant_clauses() {
    let pred = Predicate::parse("+cxx14 ~debug").unwrap();
    let both = Candidate::new(Some("1.0")).with("cxx14", true).with("debug", false);
    let wrong = Candidate::new(Some("1.0")).with("cxx14", true).with("debug", true);
    assert!(pred.matches(&both));
    assert!(!pred.matches(&wrong));
  }

  #[test]
  fn unsettled_values_do_not_match() {
    let pred = Predicate::parse("@1: +cxx14").unwrap();
    assert!(!pred.matches(&Candidate::new(None).with("cxx14", true)));
    assert!(!pred.matches(&Candidate::new(Some("1.0"))));
  }

  #[test]
  fn empty_predicate_always_matches() {
    let pred = Predicate::default();
    assert!(pred.matches(&Candidate::new(None)));
  }

  #[test]
  fn package_names_are_rejected() {
    assert!(matches!(
      Predicate::parse("xrootd+debug"),
      Err(SyntaxError::Unexpected { pos: 0, ch: 'x', .. })
    ));
  }

  #[test]
  fn display_is_canonical() {
    let pred = Predicate::parse("~debug   @5.35: +cxx14").unwrap();
    assert_eq!(pred.to_string(), "@5.35: +cxx14 ~debug");
  }

  #[test]
  fn sigils_match_request_syntax() {
    assert_eq!(variant_sigil(true), '+');
    assert_eq!(variant_sigil(false), '~');
    let pred = Predicate::parse(&format!("{}cxx14 {}debug", variant_sigil(true), variant_sigil(false))).unwrap();
    assert_eq!(pred.variants.get("cxx14"), Some(&true));
    assert_eq!(pred.variants.get("debug"), Some(&false));
  }
}
