//! Dependency closure resolution.
//!
//! Resolution walks recipe declarations depth-first from the requested
//! package. Each node gets a version and a value for every declared variant,
//! with explicit request constraints taking precedence over inherited values
//! and inherited values over recipe defaults. There is no search: the first
//! consistent choice is the only one considered, and any contradiction is an
//! error.
//!
//! Within one resolution every package name maps to at most one node. When a
//! second path reaches a package already resolved, only the values that path
//! pins (explicitly or by inheritance) are checked against the existing node,
//! and the same `Arc` is reused. A default never conflicts: if a later edge
//! pins a variant that an earlier edge left at its default, resolution starts
//! over with that value held.

mod batch;
mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::inherit::{ForcedVariants, propagate};
use crate::recipe::{DefinitionError, PackageDefinition, Registry};
use crate::request::{Constraint, Request};
use crate::spec::{PartialSpec, Spec};
use crate::version::VersionRange;

pub use batch::resolve_batch;
pub use types::{DependencyPath, ResolutionError};

/// Resolves requests against one registry. Cheap to create and `Sync`.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
  registry: &'r Registry,
}

impl<'r> Resolver<'r> {
  pub fn new(registry: &'r Registry) -> Self {
    Self { registry }
  }

  pub fn registry(&self) -> &'r Registry {
    self.registry
  }

  /// Resolve the full closure of `request`.
  ///
  /// # Errors
  ///
  /// See [`ResolutionError`]. Recipe defects surfacing during resolution
  /// are wrapped in [`ResolutionError::Definition`].
  pub fn resolve(&self, request: &Request) -> Result<Arc<Spec>, ResolutionError> {
    self.check_request(request)?;

    let mut hints = Hints::new();
    loop {
      let mut session = Session {
        registry: self.registry,
        request,
        hints,
        stack: Vec::new(),
        memo: BTreeMap::new(),
      };
      match session.visit(&request.root, None, ForcedVariants::new()) {
        Ok(root) => return session.finish(root),
        Err(Interrupt::Failed(err)) => return Err(err),
        Err(Interrupt::Restart { package, variant, hint }) => {
          debug!(%package, %variant, value = hint.value, path = %hint.path, "restarting with pinned variant");
          hints = session.hints;
          hints.entry(package).or_default().insert(variant, hint);
        }
      }
    }
  }

  /// Every explicitly constrained package must exist and declare the
  /// variants it is constrained on.
  fn check_request(&self, request: &Request) -> Result<(), ResolutionError> {
    let explicit = std::iter::once((&request.root, &request.constraint)).chain(request.dependencies.iter());
    for (package, constraint) in explicit {
      let def = self
        .registry
        .get(package)
        .ok_or_else(|| ResolutionError::UnknownPackage {
          package: package.clone(),
        })?;
      if let Some(variant) = constraint.variants.keys().find(|v| !def.has_variant(v)) {
        return Err(ResolutionError::UnknownVariant {
          package: package.clone(),
          variant: variant.clone(),
        });
      }
    }
    Ok(())
  }
}

struct Resolved {
  spec: Arc<Spec>,
  path: DependencyPath,
  /// Variants fixed by an explicit constraint or by inheritance, with the
  /// first path that fixed them.
  pinned: BTreeMap<String, (bool, DependencyPath)>,
}

/// A value carried into the next attempt for a variant that an earlier edge
/// left at its default and a later edge pinned.
#[derive(Debug, Clone)]
struct Hint {
  value: bool,
  path: DependencyPath,
}

type Hints = BTreeMap<String, BTreeMap<String, Hint>>;

/// Why a visit stopped early.
enum Interrupt {
  Failed(ResolutionError),
  /// Start over with `variant` of `package` held at `hint.value`. Every
  /// restart adds a hint for a variant that had none, so attempts are bounded.
  Restart {
    package: String,
    variant: String,
    hint: Hint,
  },
}

impl From<ResolutionError> for Interrupt {
  fn from(err: ResolutionError) -> Self {
    Interrupt::Failed(err)
  }
}

impl From<DefinitionError> for Interrupt {
  fn from(err: DefinitionError) -> Self {
    Interrupt::Failed(err.into())
  }
}

/// State private to one resolution attempt.
struct Session<'a> {
  registry: &'a Registry,
  request: &'a Request,
  hints: Hints,
  /// Packages currently being resolved, outermost first.
  stack: Vec<String>,
  memo: BTreeMap<String, Resolved>,
}

impl Session<'_> {
  fn path_to(&self, package: &str) -> DependencyPath {
    let mut path = self.stack.clone();
    path.push(package.to_string());
    DependencyPath(path)
  }

  fn finish(self, root: Arc<Spec>) -> Result<Arc<Spec>, ResolutionError> {
    for package in self.request.dependencies.keys() {
      if !self.memo.contains_key(package) {
        return Err(ResolutionError::NotInClosure {
          package: package.clone(),
        });
      }
    }

    debug!(root = %root.short(), nodes = self.memo.len(), "resolved request");
    Ok(root)
  }

  fn visit(
    &mut self,
    package: &str,
    range: Option<&VersionRange>,
    forced: ForcedVariants,
  ) -> Result<Arc<Spec>, Interrupt> {
    if let Some(start) = self.stack.iter().position(|p| p == package) {
      let mut cycle = self.stack[start..].to_vec();
      cycle.push(package.to_string());
      return Err(
        ResolutionError::DependencyCycle {
          path: DependencyPath(cycle),
        }
        .into(),
      );
    }

    let (registry, request) = (self.registry, self.request);
    let def = registry
      .get(package)
      .ok_or_else(|| ResolutionError::UnknownPackage {
        package: package.to_string(),
      })?;
    let explicit = request.constraint_for(package);
    let pinned = pinned_variants(explicit, forced);
    let path = self.path_to(package);

    if let Some(existing) = self.memo.get_mut(package) {
      return reuse(existing, self.hints.get(package), range, &pinned, path);
    }

    let ranges: Vec<&VersionRange> = explicit.and_then(|c| c.version.as_ref()).into_iter().chain(range).collect();
    let Some(version) = def.select_version(&ranges) else {
      return Err(
        ResolutionError::NoMatchingVersion {
          package: package.to_string(),
          constraints: describe_ranges(&ranges),
          path,
        }
        .into(),
      );
    };

    let mut partial = PartialSpec::new(package);
    partial.set_version(version.clone());
    for (name, value) in effective_variants(def, &pinned, self.hints.get(package)) {
      partial.set_variant(name, value);
    }

    self.stack.push(package.to_string());
    for decl in &def.dependencies {
      if !decl.applies_to(&partial) {
        trace!(package, dependency = %decl.package, "dependency condition not met");
        continue;
      }
      let child_def = registry
        .get(&decl.package)
        .ok_or_else(|| DefinitionError::MissingDependency {
          package: package.to_string(),
          dependency: decl.package.clone(),
        })?;
      let forced = propagate(&partial, def, decl, child_def)?;
      let child = self.visit(&decl.package, decl.range.as_ref(), forced)?;
      partial.add_dependency(child);
    }
    self.stack.pop();

    let spec = Arc::new(partial.finish().ok_or_else(|| ResolutionError::NoMatchingVersion {
      package: package.to_string(),
      constraints: describe_ranges(&ranges),
      path: path.clone(),
    })?);
    debug!(spec = %spec.short(), path = %path, "resolved node");

    let pinned = pinned.into_iter().map(|(name, value)| (name, (value, path.clone()))).collect();
    self.memo.insert(
      package.to_string(),
      Resolved {
        spec: spec.clone(),
        path,
        pinned,
      },
    );
    Ok(spec)
  }
}

/// Check a second path into an already resolved package.
///
/// Only the values this edge pins are compared. A pinned value that differs
/// from one pinned before is a conflict. One that differs from a default is
/// adopted by restarting.
fn reuse(
  existing: &mut Resolved,
  hints: Option<&BTreeMap<String, Hint>>,
  range: Option<&VersionRange>,
  pinned: &BTreeMap<String, bool>,
  path: DependencyPath,
) -> Result<Arc<Spec>, Interrupt> {
  let package = existing.spec.name().to_string();
  if let Some(range) = range
    && !range.contains(existing.spec.version())
  {
    return Err(
      ResolutionError::VersionConflict {
        package,
        version: existing.spec.version().clone(),
        range: range.clone(),
        first_path: existing.path.clone(),
        second_path: path,
      }
      .into(),
    );
  }

  for (name, &value) in pinned {
    let current = existing.spec.variant(name).unwrap_or(value);
    if current == value {
      existing.pinned.entry(name.clone()).or_insert_with(|| (value, path.clone()));
      continue;
    }

    let earlier = existing
      .pinned
      .get(name)
      .map(|(_, first)| first)
      .or_else(|| hints.and_then(|h| h.get(name)).map(|hint| &hint.path));
    return Err(match earlier {
      Some(first_path) => ResolutionError::VariantConflict {
        package,
        variant: name.clone(),
        first_path: first_path.clone(),
        first_value: current,
        second_path: path,
        second_value: value,
      }
      .into(),
      None => Interrupt::Restart {
        package,
        variant: name.clone(),
        hint: Hint { value, path },
      },
    });
  }

  trace!(%package, "reusing resolved node");
  Ok(existing.spec.clone())
}

/// Values an edge fixes: explicit constraints over inherited ones.
fn pinned_variants(explicit: Option<&Constraint>, mut forced: ForcedVariants) -> BTreeMap<String, bool> {
  if let Some(constraint) = explicit {
    forced.extend(constraint.variants.iter().map(|(name, value)| (name.clone(), *value)));
  }
  forced
}

/// Variant values for a new node: pinned, then carried over from an earlier
/// attempt, then default.
fn effective_variants(
  def: &PackageDefinition,
  pinned: &BTreeMap<String, bool>,
  hints: Option<&BTreeMap<String, Hint>>,
) -> BTreeMap<String, bool> {
  def
    .variants
    .iter()
    .map(|variant| {
      let value = pinned
        .get(&variant.name)
        .copied()
        .or_else(|| hints.and_then(|h| h.get(&variant.name)).map(|hint| hint.value))
        .unwrap_or(variant.default);
      (variant.name.clone(), value)
    })
    .collect()
}

fn describe_ranges(ranges: &[&VersionRange]) -> String {
  if ranges.is_empty() {
    return "any version".to_string();
  }
  ranges.iter().map(|r| format!("@{}", r)).collect::<Vec<_>>().join(" and ")
}
