use std::path::PathBuf;

use spackle_lib::recipe::Registry;
use spackle_lib::request::Request;
use spackle_lib::resolve::{ResolutionError, Resolver};
use spackle_lib::spec::Spec;
use std::sync::Arc;

/// The recipe repository shipped with the tests.
pub fn fixture_repo() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join("repo")
}

pub fn fixture_registry() -> Registry {
  Registry::load_dir(&fixture_repo()).expect("fixture repository should load")
}

pub fn resolve(registry: &Registry, request: &str) -> Result<Arc<Spec>, ResolutionError> {
  let request = Request::parse(request).expect("request should parse");
  Resolver::new(registry).resolve(&request)
}

/// A minimal recipe: one version, the given variants (all default off) and
/// dependencies given as `(spec, inherited variants)` pairs, the variants
/// separated by spaces.
pub fn recipe(name: &str, variants: &[&str], deps: &[(&str, &str)]) -> String {
  let mut text = format!("name = \"{}\"\n[[version]]\nversion = \"1.0\"\n", name);
  for variant in variants {
    text.push_str(&format!("[[variant]]\nname = \"{}\"\n", variant));
  }
  for (spec, inherit) in deps {
    let inherit: Vec<String> = inherit.split_whitespace().map(|v| format!("\"{}\"", v)).collect();
    text.push_str(&format!("[[depends]]\nspec = \"{}\"\ninherit = [{}]\n", spec, inherit.join(", ")));
  }
  text
}

pub fn registry_of(recipes: &[String]) -> Registry {
  Registry::from_recipes(recipes.iter().map(String::as_str)).expect("recipes should be valid")
}
