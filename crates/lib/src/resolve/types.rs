//! Error types for closure resolution.

use std::fmt;

use thiserror::Error;

use crate::matcher::variant_sigil;
use crate::recipe::DefinitionError;
use crate::version::{Version, VersionRange};

/// The chain of packages that led to a node, root first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyPath(pub Vec<String>);

impl DependencyPath {
  pub fn packages(&self) -> &[String] {
    &self.0
  }
}

impl fmt::Display for DependencyPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.join(" -> "))
  }
}

/// Errors that make a request unsatisfiable.
#[derive(Debug, Error)]
pub enum ResolutionError {
  #[error("unknown package '{package}'")]
  UnknownPackage { package: String },

  #[error("package '{package}' has no variant '{variant}'")]
  UnknownVariant { package: String, variant: String },

  /// No declared version lies inside every applicable range.
  #[error("no version of '{package}' satisfies {constraints} (via {path})")]
  NoMatchingVersion {
    package: String,
    constraints: String,
    path: DependencyPath,
  },

  /// Two paths reach the same package with different effective values.
  #[error(
    "conflicting values for variant '{variant}' of '{package}': {}{variant} via {first_path}, {}{variant} via {second_path}",
    variant_sigil(*.first_value),
    variant_sigil(*.second_value)
  )]
  VariantConflict {
    package: String,
    variant: String,
    first_path: DependencyPath,
    first_value: bool,
    second_path: DependencyPath,
    second_value: bool,
  },

  /// A later edge rules out the version an earlier edge settled on.
  #[error("'{package}@{version}' chosen via {first_path} is outside '@{range}' required via {second_path}")]
  VersionConflict {
    package: String,
    version: Version,
    range: VersionRange,
    first_path: DependencyPath,
    second_path: DependencyPath,
  },

  #[error("dependency cycle: {path}")]
  DependencyCycle { path: DependencyPath },

  /// A `^dep` constraint names a package the closure never reaches.
  #[error("'{package}' is constrained by the request but is not a dependency of it")]
  NotInClosure { package: String },

  #[error(transparent)]
  Definition(#[from] DefinitionError),
}
