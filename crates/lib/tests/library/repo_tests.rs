use std::fs;

use spackle_lib::recipe::{DefinitionError, GitReference, Registry, Source};

use super::common::{fixture_registry, fixture_repo};

#[test]
fn loads_every_fixture_recipe() {
  let registry = fixture_registry();
  let names: Vec<&str> = registry.names().collect();
  assert_eq!(
    names,
    [
      "clhep", "cmake", "cppunit", "fftw", "gccxml", "geant", "gsl", "jpeg", "libpng", "libtiff", "libxml2", "python",
      "root", "xerces-c", "xrootd",
    ]
  );
}

#[test]
fn nested_recipe_keeps_its_directory() {
  let registry = fixture_registry();
  let xrootd = registry.get("xrootd").unwrap();
  let dir = xrootd.recipe_dir.as_ref().unwrap();
  assert!(dir.join(&xrootd.patches[0].file).is_file());
}

#[test]
fn sources_are_expanded() {
  let registry = fixture_registry();

  let xrootd = registry.get("xrootd").unwrap();
  assert_eq!(
    xrootd.versions[0].source,
    Some(Source::Url {
      url: "http://xrootd.org/download/v4.2.3/xrootd-4.2.3.tar.gz".to_string()
    })
  );

  let gccxml = registry.get("gccxml").unwrap();
  assert!(matches!(
    &gccxml.versions[0].source,
    Some(Source::Git { reference: GitReference::Commit(c), .. }) if c == "3afa"
  ));
}

#[test]
fn broken_recipe_fails_the_whole_repository() {
  let dir = tempfile::tempdir().unwrap();
  for entry in fs::read_dir(fixture_repo()).unwrap() {
    let entry = entry.unwrap();
    if entry.file_type().unwrap().is_file() {
      fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
  }
  // xrootd lives in a subdirectory and was not copied.
  let err = Registry::load_dir(dir.path()).unwrap_err();
  assert!(matches!(err, DefinitionError::MissingDependency { dependency, .. } if dependency == "xrootd"));

  fs::write(
    dir.path().join("xrootd.toml"),
    "name = \"xrootd\"\n[[version]]\nversion = \"4.2.3\"\n[[variant]]\nname = \"cxx14\"\n[[depends]]\nspec = \"cmake\"\nwhen = \"+debug\"\n",
  )
  .unwrap();
  let err = Registry::load_dir(dir.path()).unwrap_err();
  assert!(matches!(err, DefinitionError::UnknownVariant { package, variant, .. } if package == "xrootd" && variant == "debug"));
}

#[test]
fn later_repository_fills_gaps() {
  let overlay = tempfile::tempdir().unwrap();
  fs::write(
    overlay.path().join("root.toml"),
    "name = \"root\"\n[[version]]\nversion = \"6.06.00\"\n",
  )
  .unwrap();

  let registry = Registry::load_dirs(&[overlay.path().to_path_buf(), fixture_repo()]).unwrap();
  assert_eq!(registry.get("root").unwrap().versions.len(), 1);
  assert!(registry.contains("xrootd"));
}
