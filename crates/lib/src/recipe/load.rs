//! TOML recipe files and their validation into [`PackageDefinition`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::error::DefinitionError;
use super::types::{
  BuildRecipe, BuildSystem, DependencyDecl, Effect, GitReference, PackageDefinition, PatchDecl, Source, Variant,
  VersionDecl,
};
use crate::consts::RECIPE_FILE_NAME;
use crate::matcher::Predicate;
use crate::placeholder;
use crate::syntax::parse_clause;
use crate::version::Version;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeFile {
  name: String,
  homepage: Option<String>,
  description: Option<String>,
  /// Download URL template for versions without their own source.
  /// `{version}` is replaced with the version string.
  url: Option<String>,
  #[serde(default, rename = "version")]
  versions: Vec<VersionEntry>,
  #[serde(default, rename = "variant")]
  variants: Vec<VariantEntry>,
  #[serde(default)]
  depends: Vec<DependsEntry>,
  #[serde(default, rename = "patch")]
  patches: Vec<PatchEntry>,
  #[serde(default)]
  build: BuildEntry,
  #[serde(default)]
  export: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionEntry {
  version: String,
  url: Option<String>,
  git: Option<String>,
  commit: Option<String>,
  tag: Option<String>,
  branch: Option<String>,
  checksum: Option<String>,
  #[serde(default)]
  preferred: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantEntry {
  name: String,
  #[serde(default)]
  default: bool,
  #[serde(default)]
  description: String,
  #[serde(default)]
  env: BTreeMap<String, String>,
  #[serde(default)]
  args: Vec<String>,
  #[serde(default)]
  env_off: BTreeMap<String, String>,
  #[serde(default)]
  args_off: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DependsEntry {
  spec: String,
  when: Option<String>,
  #[serde(default)]
  inherit: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatchEntry {
  file: String,
  when: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildEntry {
  #[serde(default)]
  system: BuildSystem,
  build_dir: Option<String>,
  #[serde(default)]
  args: Vec<String>,
}

pub(crate) fn is_valid_name(name: &str) -> bool {
  !name.is_empty()
    && !name.starts_with('-')
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse and validate one recipe. `origin` names the source in errors.
pub fn parse_recipe(text: &str, origin: &str) -> Result<PackageDefinition, DefinitionError> {
  let file: RecipeFile = toml::from_str(text).map_err(|source| DefinitionError::Parse {
    origin: origin.to_string(),
    source,
  })?;
  validate(file)
}

/// Read a recipe from disk.
///
/// The package name must match the file stem for `<name>.toml`, or the
/// directory name for `<name>/package.toml`.
pub fn load_recipe(path: &Path) -> Result<PackageDefinition, DefinitionError> {
  let text = std::fs::read_to_string(path).map_err(|source| DefinitionError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let mut def = parse_recipe(&text, &path.display().to_string())?;

  let expected = if path.file_name().is_some_and(|f| f == RECIPE_FILE_NAME) {
    path.parent().and_then(|p| p.file_name())
  } else {
    path.file_stem()
  };
  let expected = expected.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
  if expected != def.name {
    return Err(DefinitionError::NameMismatch {
      path: path.to_path_buf(),
      package: def.name,
      expected,
    });
  }

  def.recipe_dir = path.parent().map(Path::to_path_buf);
  debug!(package = %def.name, path = ?path, "loaded recipe");
  Ok(def)
}

fn validate(file: RecipeFile) -> Result<PackageDefinition, DefinitionError> {
  let name = file.name;
  if !is_valid_name(&name) {
    return Err(DefinitionError::InvalidName(name));
  }
  if file.versions.is_empty() {
    return Err(DefinitionError::NoVersions(name));
  }

  let versions = validate_versions(&name, file.url.as_deref(), file.versions)?;
  let variants = validate_variants(&name, file.variants)?;
  let declared: BTreeSet<&str> = variants.iter().map(|v| v.name.as_str()).collect();

  let mut dependencies = Vec::with_capacity(file.depends.len());
  for entry in file.depends {
    dependencies.push(validate_dependency(&name, &declared, entry)?);
  }

  let mut patches = Vec::with_capacity(file.patches.len());
  for entry in file.patches {
    if entry.file.trim().is_empty() {
      return Err(DefinitionError::EmptyPatch { package: name });
    }
    let when = validate_when(&name, &declared, entry.when.as_deref(), || {
      format!("patch '{}'", entry.file)
    })?;
    patches.push(PatchDecl { file: entry.file, when });
  }

  for arg in &file.build.args {
    check_placeholders(&name, arg)?;
  }
  for value in file.export.values() {
    check_placeholders(&name, value)?;
  }

  Ok(PackageDefinition {
    name,
    homepage: file.homepage,
    description: file.description,
    versions,
    variants,
    dependencies,
    patches,
    build: BuildRecipe {
      system: file.build.system,
      build_dir: file.build.build_dir,
      args: file.build.args,
    },
    exports: file.export,
    recipe_dir: None,
  })
}

fn validate_versions(
  package: &str,
  url_template: Option<&str>,
  entries: Vec<VersionEntry>,
) -> Result<Vec<VersionDecl>, DefinitionError> {
  let mut versions: Vec<VersionDecl> = Vec::with_capacity(entries.len());

  for entry in entries {
    let version = Version::parse(&entry.version).map_err(|source| DefinitionError::InvalidVersion {
      package: package.to_string(),
      text: entry.version.clone(),
      source,
    })?;
    if versions.iter().any(|d| d.version == version) {
      return Err(DefinitionError::DuplicateVersion {
        package: package.to_string(),
        version: entry.version,
      });
    }

    let invalid = |reason: &str| DefinitionError::InvalidSource {
      package: package.to_string(),
      version: entry.version.clone(),
      reason: reason.to_string(),
    };

    let refs: Vec<GitReference> = [
      entry.commit.clone().map(GitReference::Commit),
      entry.tag.clone().map(GitReference::Tag),
      entry.branch.clone().map(GitReference::Branch),
    ]
    .into_iter()
    .flatten()
    .collect();

    let source = match (entry.url.clone(), entry.git.clone()) {
      (Some(_), Some(_)) => return Err(invalid("has both a url and a git source")),
      (Some(url), None) => {
        if !refs.is_empty() {
          return Err(invalid("sets commit, tag or branch without a git source"));
        }
        Some(Source::Url { url })
      }
      (None, Some(url)) => {
        let mut refs = refs.into_iter();
        let (Some(reference), None) = (refs.next(), refs.next()) else {
          return Err(invalid("needs exactly one of commit, tag or branch for its git source"));
        };
        Some(Source::Git { url, reference })
      }
      (None, None) => {
        if !refs.is_empty() {
          return Err(invalid("sets commit, tag or branch without a git source"));
        }
        url_template.map(|t| Source::Url {
          url: t.replace("{version}", version.as_str()),
        })
      }
    };

    versions.push(VersionDecl {
      version,
      source,
      checksum: entry.checksum,
      preferred: entry.preferred,
    });
  }

  Ok(versions)
}

fn validate_variants(package: &str, entries: Vec<VariantEntry>) -> Result<Vec<Variant>, DefinitionError> {
  let mut variants: Vec<Variant> = Vec::with_capacity(entries.len());

  for entry in entries {
    if !is_valid_name(&entry.name) {
      return Err(DefinitionError::InvalidName(entry.name));
    }
    if variants.iter().any(|v| v.name == entry.name) {
      return Err(DefinitionError::DuplicateVariant {
        package: package.to_string(),
        variant: entry.name,
      });
    }

    for text in entry
      .env
      .values()
      .chain(entry.env_off.values())
      .chain(entry.args.iter())
      .chain(entry.args_off.iter())
    {
      check_placeholders(package, text)?;
    }

    variants.push(Variant {
      name: entry.name,
      default: entry.default,
      description: entry.description,
      enabled: Effect {
        env: entry.env,
        args: entry.args,
      },
      disabled: Effect {
        env: entry.env_off,
        args: entry.args_off,
      },
    });
  }

  Ok(variants)
}

fn validate_dependency(
  package: &str,
  declared: &BTreeSet<&str>,
  entry: DependsEntry,
) -> Result<DependencyDecl, DefinitionError> {
  let invalid = |reason: &str| DefinitionError::InvalidDependency {
    package: package.to_string(),
    text: entry.spec.clone(),
    reason: reason.to_string(),
  };

  let clause = parse_clause(&entry.spec).map_err(|source| DefinitionError::InvalidConstraint {
    package: package.to_string(),
    text: entry.spec.clone(),
    source,
  })?;
  let Some(target) = clause.name else {
    return Err(invalid("missing package name"));
  };
  if !clause.variants.is_empty() {
    return Err(invalid("variant values are set with `inherit`, not in the dependency spec"));
  }
  if target == package {
    return Err(invalid("a package cannot depend on itself"));
  }

  let when = validate_when(package, declared, entry.when.as_deref(), || {
    format!("dependency '{}'", target)
  })?;

  for variant in &entry.inherit {
    if !declared.contains(variant.as_str()) {
      return Err(DefinitionError::UnknownVariant {
        package: package.to_string(),
        variant: variant.clone(),
        context: format!("inherit list of dependency '{}'", target),
      });
    }
  }

  Ok(DependencyDecl {
    package: target,
    range: clause.range,
    when,
    inherit: entry.inherit,
  })
}

fn validate_when(
  package: &str,
  declared: &BTreeSet<&str>,
  text: Option<&str>,
  context: impl Fn() -> String,
) -> Result<Option<Predicate>, DefinitionError> {
  let Some(text) = text else {
    return Ok(None);
  };

  let predicate = Predicate::parse(text).map_err(|source| DefinitionError::InvalidConstraint {
    package: package.to_string(),
    text: text.to_string(),
    source,
  })?;

  if let Some(unknown) = predicate.referenced_variants().find(|v| !declared.contains(v)) {
    return Err(DefinitionError::UnknownVariant {
      package: package.to_string(),
      variant: unknown.to_string(),
      context: format!("`when` of {}", context()),
    });
  }

  Ok(Some(predicate))
}

fn check_placeholders(package: &str, text: &str) -> Result<(), DefinitionError> {
  placeholder::parse(text)
    .map(|_| ())
    .map_err(|source| DefinitionError::InvalidPlaceholder {
      package: package.to_string(),
      text: text.to_string(),
      source,
    })
}
