use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use walkdir::WalkDir;

use super::error::DefinitionError;
use super::load::{load_recipe, parse_recipe};
use super::types::PackageDefinition;
use crate::consts::{RECIPE_EXTENSION, RECIPE_FILE_NAME};

/// The immutable set of package recipes every resolution reads from.
///
/// A registry is validated as a whole on construction: names are unique and
/// every dependency declaration names a package it contains. It is never
/// mutated afterwards, so one registry can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Registry {
  packages: BTreeMap<String, Arc<PackageDefinition>>,
}

impl Registry {
  pub fn new(definitions: impl IntoIterator<Item = PackageDefinition>) -> Result<Self, DefinitionError> {
    let mut packages = BTreeMap::new();
    for def in definitions {
      if packages.contains_key(&def.name) {
        return Err(DefinitionError::DuplicatePackage(def.name));
      }
      packages.insert(def.name.clone(), Arc::new(def));
    }

    let registry = Self { packages };
    registry.check_dependencies()?;
    Ok(registry)
  }

  /// Build a registry from in-memory recipe texts.
  pub fn from_recipes<'a>(texts: impl IntoIterator<Item = &'a str>) -> Result<Self, DefinitionError> {
    let defs = texts
      .into_iter()
      .enumerate()
      .map(|(i, text)| parse_recipe(text, &format!("recipe #{}", i)))
      .collect::<Result<Vec<_>, _>>()?;
    Self::new(defs)
  }

  /// Load every recipe in one repository directory.
  pub fn load_dir(path: &Path) -> Result<Self, DefinitionError> {
    Self::load_dirs(&[path.to_path_buf()])
  }

  /// Load several repositories. A package defined in more than one
  /// repository is taken from the first one listed.
  pub fn load_dirs(paths: &[PathBuf]) -> Result<Self, DefinitionError> {
    let mut packages: BTreeMap<String, Arc<PackageDefinition>> = BTreeMap::new();

    for repo in paths {
      let mut seen = BTreeSet::new();
      for def in scan_repo(repo)? {
        if !seen.insert(def.name.clone()) {
          return Err(DefinitionError::DuplicatePackage(def.name));
        }
        if packages.contains_key(&def.name) {
          debug!(package = %def.name, repo = ?repo, "shadowed by an earlier repository");
          continue;
        }
        packages.insert(def.name.clone(), Arc::new(def));
      }
    }

    let registry = Self { packages };
    registry.check_dependencies()?;
    info!(packages = registry.len(), repos = paths.len(), "loaded recipe registry");
    Ok(registry)
  }

  fn check_dependencies(&self) -> Result<(), DefinitionError> {
    for def in self.packages.values() {
      for dep in &def.dependencies {
        if !self.packages.contains_key(&dep.package) {
          return Err(DefinitionError::MissingDependency {
            package: def.name.clone(),
            dependency: dep.package.clone(),
          });
        }
      }
    }
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Arc<PackageDefinition>> {
    self.packages.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.packages.contains_key(name)
  }

  /// Package names in sorted order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.packages.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<PackageDefinition>> {
    self.packages.values()
  }

  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }
}

/// Recipe files in a repository: `<name>.toml` at the top level and
/// `<name>/package.toml` one level down, in file-name order.
fn scan_repo(repo: &Path) -> Result<Vec<PackageDefinition>, DefinitionError> {
  let mut defs = Vec::new();

  for entry in WalkDir::new(repo).min_depth(1).max_depth(2).sort_by_file_name() {
    let entry = entry.map_err(|e| DefinitionError::Read {
      path: e.path().map(Path::to_path_buf).unwrap_or_else(|| repo.to_path_buf()),
      source: e.into(),
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let path = entry.path();
    let is_recipe = match entry.depth() {
      1 => path.extension().is_some_and(|ext| ext == RECIPE_EXTENSION),
      _ => entry.file_name() == RECIPE_FILE_NAME,
    };
    if is_recipe {
      defs.push(load_recipe(path)?);
    }
  }

  Ok(defs)
}
