//! Resolved specs: one concrete node of a dependency closure.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::matcher::{SpecView, variant_sigil};
use crate::util::hash::{HashError, Hashable, ObjectHash, digest};
use crate::version::Version;

/// A fully resolved package: one version, a value for every declared
/// variant, and its resolved dependencies.
///
/// Specs are immutable once the resolver hands them out. A node reachable
/// along several paths of a closure is the same `Arc`.
///
/// Each spec carries a content hash over its own values and the hashes of
/// its direct dependencies, fixed at construction. The serialized form lists
/// dependencies as `name -> hash`; [`Spec::traverse`] yields the nodes those
/// hashes refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spec {
  name: String,
  version: Version,
  variants: BTreeMap<String, bool>,
  #[serde(serialize_with = "dependency_hashes")]
  dependencies: BTreeMap<String, Arc<Spec>>,
  hash: ObjectHash,
}

impl Hashable for Spec {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    Ok(self.hash.clone())
  }
}

fn dependency_hashes<S>(dependencies: &BTreeMap<String, Arc<Spec>>, serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  serializer.collect_map(dependencies.iter().map(|(name, dep)| (name, &dep.hash)))
}

fn short_form(name: &str, version: &Version, variants: &BTreeMap<String, bool>) -> String {
  let mut out = format!("{}@{}", name, version);
  for (name, value) in variants {
    out.push(variant_sigil(*value));
    out.push_str(name);
  }
  out
}

fn seal(
  name: String,
  version: Version,
  variants: BTreeMap<String, bool>,
  dependencies: BTreeMap<String, Arc<Spec>>,
) -> Spec {
  let mut content = short_form(&name, &version, &variants);
  for (dep, spec) in &dependencies {
    content.push_str(&format!(" ^{}={}", dep, spec.hash));
  }
  Spec {
    hash: digest(content.as_bytes()),
    name,
    version,
    variants,
    dependencies,
  }
}

impl Spec {
  /// Assemble a spec without checking it against any registry.
  ///
  /// The resolver is the normal way to obtain specs; this exists for
  /// executors and tests that rebuild specs from stored data.
  pub fn from_parts(
    name: impl Into<String>,
    version: Version,
    variants: BTreeMap<String, bool>,
    dependencies: impl IntoIterator<Item = Arc<Spec>>,
  ) -> Self {
    seal(
      name.into(),
      version,
      variants,
      dependencies.into_iter().map(|d| (d.name.clone(), d)).collect(),
    )
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn version(&self) -> &Version {
    &self.version
  }

  pub fn variants(&self) -> &BTreeMap<String, bool> {
    &self.variants
  }

  pub fn variant(&self, name: &str) -> Option<bool> {
    self.variants.get(name).copied()
  }

  /// Direct dependencies, keyed by package name.
  pub fn dependencies(&self) -> &BTreeMap<String, Arc<Spec>> {
    &self.dependencies
  }

  pub fn dependency(&self, name: &str) -> Option<&Arc<Spec>> {
    self.dependencies.get(name)
  }

  /// Content hash of this node and everything below it.
  pub fn hash(&self) -> &ObjectHash {
    &self.hash
  }

  /// Every distinct node of the closure, dependencies before dependents.
  ///
  /// Siblings are visited in name order, so the result is deterministic.
  pub fn traverse(&self) -> Vec<&Spec> {
    fn visit<'a>(spec: &'a Spec, seen: &mut BTreeSet<&'a str>, out: &mut Vec<&'a Spec>) {
      if !seen.insert(spec.name.as_str()) {
        return;
      }
      for dep in spec.dependencies.values() {
        visit(dep, seen, out);
      }
      out.push(spec);
    }

    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    visit(self, &mut seen, &mut out);
    out
  }

  /// `name@version+a~b`, the compact request syntax for this node.
  pub fn short(&self) -> String {
    short_form(&self.name, &self.version, &self.variants)
  }

  /// An indented rendering of the whole closure, one node per line.
  /// Nodes already printed are marked with `(shared)`.
  pub fn tree(&self) -> String {
    fn walk(spec: &Spec, depth: usize, seen: &mut BTreeSet<String>, out: &mut String) {
      let shared = !seen.insert(spec.name.clone());
      out.push_str(&"  ".repeat(depth));
      if depth > 0 {
        out.push('^');
      }
      out.push_str(&spec.short());
      if shared {
        out.push_str(" (shared)\n");
        return;
      }
      out.push('\n');
      for dep in spec.dependencies.values() {
        walk(dep, depth + 1, seen, out);
      }
    }

    let mut out = String::new();
    walk(self, 0, &mut BTreeSet::new(), &mut out);
    out
  }
}

impl fmt::Display for Spec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

impl SpecView for Spec {
  fn package(&self) -> &str {
    &self.name
  }

  fn version(&self) -> Option<&Version> {
    Some(&self.version)
  }

  fn variant(&self, name: &str) -> Option<bool> {
    self.variants.get(name).copied()
  }
}

/// Value of variant `name` on `spec`, if declared.
pub fn variant_value(spec: &Spec, name: &str) -> Option<bool> {
  spec.variant(name)
}

pub fn resolved_version(spec: &Spec) -> &Version {
  spec.version()
}

/// A spec under construction inside the resolver.
///
/// Values are settled one at a time; predicates evaluated against a partial
/// spec only see what has been settled so far.
#[derive(Debug, Clone)]
pub struct PartialSpec {
  name: String,
  version: Option<Version>,
  variants: BTreeMap<String, bool>,
  dependencies: BTreeMap<String, Arc<Spec>>,
}

impl PartialSpec {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: None,
      variants: BTreeMap::new(),
      dependencies: BTreeMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_version(&mut self, version: Version) {
    self.version = Some(version);
  }

  pub fn set_variant(&mut self, name: impl Into<String>, value: bool) {
    self.variants.insert(name.into(), value);
  }

  pub fn variants(&self) -> &BTreeMap<String, bool> {
    &self.variants
  }

  pub fn add_dependency(&mut self, spec: Arc<Spec>) {
    self.dependencies.insert(spec.name.clone(), spec);
  }

  /// Freeze into a [`Spec`]. Returns `None` while the version is unset.
  pub fn finish(self) -> Option<Spec> {
    Some(seal(self.name, self.version?, self.variants, self.dependencies))
  }
}

impl SpecView for PartialSpec {
  fn package(&self) -> &str {
    &self.name
  }

  fn version(&self) -> Option<&Version> {
    self.version.as_ref()
  }

  fn variant(&self, name: &str) -> Option<bool> {
    self.variants.get(name).copied()
  }
}
