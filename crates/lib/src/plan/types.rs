//! Build plan data and compilation errors.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::placeholder::PlaceholderError;
use crate::util::hash::{HashError, Hashable, ObjectHash};
use crate::version::Version;

/// Directory a tool runs in, relative to the executor's staging layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkDir {
  /// The unpacked source tree.
  Source,
  /// An out-of-source build directory inside the stage.
  Build(String),
}

impl fmt::Display for WorkDir {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WorkDir::Source => write!(f, "source"),
      WorkDir::Build(dir) => write!(f, "build:{}", dir),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
  pub tool: String,
  pub args: Vec<String>,
  pub cwd: WorkDir,
}

impl ToolInvocation {
  pub fn new(tool: impl Into<String>, cwd: WorkDir) -> Self {
    Self {
      tool: tool.into(),
      args: Vec::new(),
      cwd,
    }
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

/// One action of a build plan. Steps run strictly in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  /// Set an environment variable for every later step.
  ///
  /// `origin` names the dependency that exported the value; `None` means the
  /// package's own variants set it.
  SetEnv {
    key: String,
    value: String,
    origin: Option<String>,
  },
  Invoke(ToolInvocation),
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Step::SetEnv { key, value, origin } => {
        write!(f, "env {}={}", key, value)?;
        if let Some(origin) = origin {
          write!(f, "  (from {})", origin)?;
        }
        Ok(())
      }
      Step::Invoke(inv) => {
        write!(f, "[{}] {}", inv.cwd, inv.tool)?;
        for arg in &inv.args {
          write!(f, " {}", arg)?;
        }
        Ok(())
      }
    }
  }
}

/// Everything an executor needs to build one resolved spec.
///
/// Values only known at build time are left as placeholders (see
/// [`crate::placeholder`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
  pub package: String,
  pub version: Version,
  /// Hash of the resolved spec this plan was compiled from.
  pub spec_hash: ObjectHash,
  pub steps: Vec<Step>,
  /// Values this package exports into the environment of its dependents.
  pub exports: BTreeMap<String, String>,
}

impl Hashable for BuildPlan {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
  /// Parallel jobs passed to `make` as `-jN`. `None` leaves it to make.
  pub jobs: Option<NonZeroUsize>,
}

#[derive(Debug, Error)]
pub enum CompileError {
  /// The spec was not produced by resolving against this registry.
  #[error("spec '{package}' is not fully resolved: {reason}")]
  NotFullyResolved { package: String, reason: String },

  #[error("placeholder error in '{package}': {source}")]
  Placeholder {
    package: String,
    #[source]
    source: PlaceholderError,
  },

  #[error("dependency cycle detected")]
  CycleDetected,

  #[error("failed to hash spec: {0}")]
  Hash(#[from] HashError),
}
