//! What the user asks to build.
//!
//! Textual form: `name[@range][+v|~v ...] [^dep[@range][+v|~v ...]]...`,
//! e.g. `root@5.34.25 +cxx14 ^xrootd~debug`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::matcher::variant_sigil;
use crate::syntax::{SyntaxError, parse_clause};
use crate::version::VersionRange;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
  #[error("empty request")]
  Empty,

  #[error("missing package name in '{0}'")]
  MissingName(String),

  #[error("package '{0}' constrained more than once")]
  DuplicatePackage(String),

  #[error(transparent)]
  Syntax(#[from] SyntaxError),
}

/// Explicit constraints on one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraint {
  pub version: Option<VersionRange>,
  pub variants: BTreeMap<String, bool>,
}

impl Constraint {
  pub fn is_empty(&self) -> bool {
    self.version.is_none() && self.variants.is_empty()
  }
}

/// A root package with explicit constraints, plus explicit constraints on
/// any package in its closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub root: String,
  pub constraint: Constraint,
  pub dependencies: BTreeMap<String, Constraint>,
}

impl Request {
  pub fn new(root: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      constraint: Constraint::default(),
      dependencies: BTreeMap::new(),
    }
  }

  pub fn version(mut self, range: VersionRange) -> Self {
    self.constraint.version = Some(range);
    self
  }

  pub fn variant(mut self, name: impl Into<String>, value: bool) -> Self {
    self.constraint.variants.insert(name.into(), value);
    self
  }

  /// Constrain a dependency, as `^dep` does in the textual form.
  pub fn dependency(mut self, name: impl Into<String>, constraint: Constraint) -> Self {
    self.dependencies.insert(name.into(), constraint);
    self
  }

  /// Explicit constraints for `package`, whether it is the root or not.
  pub fn constraint_for(&self, package: &str) -> Option<&Constraint> {
    if package == self.root {
      Some(&self.constraint)
    } else {
      self.dependencies.get(package)
    }
  }

  pub fn parse(text: &str) -> Result<Self, RequestError> {
    if text.trim().is_empty() {
      return Err(RequestError::Empty);
    }

    let mut parts = text.split('^');
    let (root, constraint) = parse_part(parts.next().unwrap_or_default())?;
    let mut request = Request::new(root);
    request.constraint = constraint;

    for part in parts {
      let (name, constraint) = parse_part(part)?;
      if name == request.root || request.dependencies.contains_key(&name) {
        return Err(RequestError::DuplicatePackage(name));
      }
      request.dependencies.insert(name, constraint);
    }

    Ok(request)
  }
}

fn parse_part(text: &str) -> Result<(String, Constraint), RequestError> {
  let clause = parse_clause(text)?;
  let name = clause.name.ok_or_else(|| RequestError::MissingName(text.trim().to_string()))?;
  Ok((
    name,
    Constraint {
      version: clause.range,
      variants: clause.variants.into_iter().collect(),
    },
  ))
}

fn write_constraint(f: &mut fmt::Formatter<'_>, name: &str, c: &Constraint) -> fmt::Result {
  write!(f, "{}", name)?;
  if let Some(range) = &c.version {
    write!(f, "@{}", range)?;
  }
  for (variant, value) in &c.variants {
    write!(f, "{}{}", variant_sigil(*value), variant)?;
  }
  Ok(())
}

impl fmt::Display for Request {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_constraint(f, &self.root, &self.constraint)?;
    for (name, constraint) in &self.dependencies {
      write!(f, " ^")?;
      write_constraint(f, name, constraint)?;
    }
    Ok(())
  }
}

impl FromStr for Request {
  type Err = RequestError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}
