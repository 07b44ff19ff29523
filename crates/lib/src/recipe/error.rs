use std::path::PathBuf;

use thiserror::Error;

use crate::placeholder::PlaceholderError;
use crate::syntax::SyntaxError;
use crate::version::VersionError;

/// A malformed recipe. Raised while loading, never during resolution.
#[derive(Debug, Error)]
pub enum DefinitionError {
  #[error("failed to read recipe {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse recipe {origin}: {source}")]
  Parse {
    origin: String,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid package name '{0}': only ASCII letters, digits, '-' and '_' are allowed")]
  InvalidName(String),

  #[error("recipe {path} declares package '{package}' but its file name says '{expected}'")]
  NameMismatch {
    path: PathBuf,
    package: String,
    expected: String,
  },

  #[error("package '{0}' declares no versions")]
  NoVersions(String),

  #[error("package '{package}': invalid version '{text}': {source}")]
  InvalidVersion {
    package: String,
    text: String,
    #[source]
    source: VersionError,
  },

  #[error("package '{package}': version {version} declared twice")]
  DuplicateVersion { package: String, version: String },

  #[error("package '{package}': version {version} {reason}")]
  InvalidSource {
    package: String,
    version: String,
    reason: String,
  },

  #[error("package '{package}': variant '{variant}' declared twice")]
  DuplicateVariant { package: String, variant: String },

  #[error("package '{package}': {context} refers to unknown variant '{variant}'")]
  UnknownVariant {
    package: String,
    variant: String,
    context: String,
  },

  #[error("package '{package}': invalid constraint '{text}': {source}")]
  InvalidConstraint {
    package: String,
    text: String,
    #[source]
    source: SyntaxError,
  },

  #[error("package '{package}': invalid dependency '{text}': {reason}")]
  InvalidDependency {
    package: String,
    text: String,
    reason: String,
  },

  #[error("package '{package}': patch entry has an empty file name")]
  EmptyPatch { package: String },

  #[error("package '{package}': invalid placeholder in '{text}': {source}")]
  InvalidPlaceholder {
    package: String,
    text: String,
    #[source]
    source: PlaceholderError,
  },

  #[error("package '{0}' is defined more than once in the same repository")]
  DuplicatePackage(String),

  #[error("package '{package}' depends on '{dependency}', which no repository defines")]
  MissingDependency { package: String, dependency: String },
}
