use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::matcher::Predicate;
use crate::version::{Version, VersionRange};

/// Where the sources of one version are retrieved from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
  Url { url: String },
  Git { url: String, reference: GitReference },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitReference {
  Commit(String),
  Tag(String),
  Branch(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDecl {
  pub version: Version,
  pub source: Option<Source>,
  /// Digest of the retrieved archive. Verification belongs to the fetcher.
  pub checksum: Option<String>,
  /// Chosen when nothing constrains the version.
  pub preferred: bool,
}

/// Environment mutations and tool arguments contributed by one variant state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effect {
  pub env: BTreeMap<String, String>,
  pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
  pub name: String,
  pub default: bool,
  pub description: String,
  /// Applied when the variant is on.
  pub enabled: Effect,
  /// Applied when the variant is off.
  pub disabled: Effect,
}

impl Variant {
  pub fn effect(&self, value: bool) -> &Effect {
    if value { &self.enabled } else { &self.disabled }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDecl {
  pub package: String,
  pub range: Option<VersionRange>,
  /// Evaluated against the depending spec.
  pub when: Option<Predicate>,
  /// Variant names whose values are copied from the depending spec.
  pub inherit: Vec<String>,
}

impl DependencyDecl {
  pub fn applies_to(&self, spec: &impl crate::matcher::SpecView) -> bool {
    self.when.as_ref().is_none_or(|w| w.matches(spec))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDecl {
  pub file: String,
  pub when: Option<Predicate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
  /// `configure --prefix=...`, `make`, `make install`
  #[default]
  Autotools,
  /// `cmake <source> ...`, `make`, `make install`
  Cmake,
}

impl BuildSystem {
  pub fn as_str(&self) -> &'static str {
    match self {
      BuildSystem::Autotools => "autotools",
      BuildSystem::Cmake => "cmake",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRecipe {
  pub system: BuildSystem,
  /// Out-of-source build directory, relative to the stage.
  pub build_dir: Option<String>,
  /// Arguments appended after every variant contribution.
  pub args: Vec<String>,
}

/// An immutable, validated package recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDefinition {
  pub name: String,
  pub homepage: Option<String>,
  pub description: Option<String>,
  /// In declaration order.
  pub versions: Vec<VersionDecl>,
  /// In declaration order; plans are compiled in this order.
  pub variants: Vec<Variant>,
  pub dependencies: Vec<DependencyDecl>,
  pub patches: Vec<PatchDecl>,
  pub build: BuildRecipe,
  /// Values exported into the environment of dependents.
  pub exports: BTreeMap<String, String>,
  /// Directory holding the recipe file, when loaded from disk.
  pub recipe_dir: Option<PathBuf>,
}

impl PackageDefinition {
  pub fn variant(&self, name: &str) -> Option<&Variant> {
    self.variants.iter().find(|v| v.name == name)
  }

  pub fn has_variant(&self, name: &str) -> bool {
    self.variant(name).is_some()
  }

  pub fn version(&self, version: &Version) -> Option<&VersionDecl> {
    self.versions.iter().find(|d| &d.version == version)
  }

  /// Pick the version to build under the given ranges.
  ///
  /// With no ranges the first version marked preferred wins, falling back to
  /// the highest declared version. With ranges, the highest version inside
  /// all of them wins.
  pub fn select_version(&self, ranges: &[&VersionRange]) -> Option<&Version> {
    if ranges.is_empty()
      && let Some(preferred) = self.versions.iter().find(|d| d.preferred)
    {
      return Some(&preferred.version);
    }

    self
      .versions
      .iter()
      .map(|d| &d.version)
      .filter(|v| ranges.iter().all(|r| r.contains(v)))
      .max()
  }
}
