use std::sync::Arc;

use spackle_lib::recipe::Registry;
use spackle_lib::request::Request;
use spackle_lib::resolve::{ResolutionError, Resolver, resolve_batch};
use spackle_lib::spec::{Spec, resolved_version, variant_value};
use spackle_lib::util::hash::Hashable;

use super::common::{fixture_registry, recipe, registry_of, resolve};

#[test]
fn cxx14_propagates_to_xrootd() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root+cxx14").unwrap();

  let xrootd = root.dependency("xrootd").unwrap();
  assert_eq!(variant_value(xrootd, "cxx14"), Some(true));
  assert_eq!(variant_value(xrootd, "debug"), Some(false));
}

#[test]
fn conditional_dependencies_follow_root_version() {
  let registry = fixture_registry();

  let old = resolve(&registry, "root@5.34.25").unwrap();
  assert_eq!(resolved_version(old.dependency("gsl").unwrap()).as_str(), "1.16");

  let new = resolve(&registry, "root").unwrap();
  assert_eq!(new.version().as_str(), "6.04.02");
  assert_eq!(resolved_version(new.dependency("gsl").unwrap()).as_str(), "2.1");
}

#[test]
fn preferred_version_wins_without_constraints() {
  let registry = fixture_registry();
  let geant = resolve(&registry, "geant").unwrap();
  assert_eq!(geant.version().as_str(), "4.9.6.p04");
  assert_eq!(geant.dependency("clhep").unwrap().version().as_str(), "2.2.0.5");

  let newer = resolve(&registry, "geant@4.10.2+debug").unwrap();
  let clhep = newer.dependency("clhep").unwrap();
  assert_eq!(clhep.version().as_str(), "2.3.0.0");
  assert_eq!(clhep.variant("debug"), Some(true));
}

#[test]
fn resolution_is_deterministic() {
  let registry = fixture_registry();
  let first = resolve(&registry, "root+cxx14+debug").unwrap();
  let second = resolve(&registry, "root+cxx14+debug").unwrap();

  assert_eq!(first, second);
  assert_eq!(first.compute_hash().unwrap(), second.compute_hash().unwrap());
  assert_eq!(first.tree(), second.tree());
}

#[test]
fn every_node_has_every_declared_variant() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root+debug").unwrap();

  for spec in root.traverse() {
    let def = registry.get(spec.name()).unwrap();
    assert_eq!(spec.variants().len(), def.variants.len(), "{}", spec.name());
    for variant in &def.variants {
      assert!(spec.variant(&variant.name).is_some(), "{} lacks {}", spec.name(), variant.name);
    }
  }
}

#[test]
fn shared_dependency_is_one_node() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root").unwrap();

  let via_root = root.dependency("python").unwrap();
  let via_xrootd = root.dependency("xrootd").unwrap().dependency("python").unwrap();
  assert!(Arc::ptr_eq(via_root, via_xrootd));
  assert_eq!(via_root.version().as_str(), "2.7.9");

  let cmake = root.dependency("cmake").unwrap();
  assert!(Arc::ptr_eq(cmake, root.dependency("xrootd").unwrap().dependency("cmake").unwrap()));
  assert_eq!(root.traverse().iter().filter(|s| s.name() == "cmake").count(), 1);
}

mod shared_nodes {
  use super::*;

  /// `app` passes `debug` on to `lib`; `tool` depends on `lib` without
  /// inheriting anything.
  fn registry(lib_first: bool) -> Registry {
    let mut app_deps = vec![("lib", "debug"), ("tool", "")];
    if !lib_first {
      app_deps.reverse();
    }
    registry_of(&[
      recipe("app", &["debug"], &app_deps),
      recipe("tool", &[], &[("lib", "")]),
      recipe("lib", &["debug"], &[]),
    ])
  }

  fn assert_lib_shared(app: &Spec, debug: bool) {
    let via_app = app.dependency("lib").unwrap();
    let via_tool = app.dependency("tool").unwrap().dependency("lib").unwrap();
    assert!(Arc::ptr_eq(via_app, via_tool));
    assert_eq!(via_app.variant("debug"), Some(debug));
  }

  #[test]
  fn unpinned_edge_reuses_inherited_value() {
    assert_lib_shared(&resolve(&registry(true), "app+debug").unwrap(), true);
    assert_lib_shared(&resolve(&registry(true), "app~debug").unwrap(), false);
  }

  #[test]
  fn inherited_value_replaces_earlier_default() {
    assert_lib_shared(&resolve(&registry(false), "app+debug").unwrap(), true);
    assert_lib_shared(&resolve(&registry(false), "app~debug").unwrap(), false);
  }

  #[test]
  fn replaced_default_reevaluates_conditions() {
    let registry = registry_of(&[
      recipe("app", &["debug"], &[("tool", ""), ("lib", "debug")]),
      recipe("tool", &[], &[("lib", "")]),
      "name = \"lib\"\n[[version]]\nversion = \"1.0\"\n[[variant]]\nname = \"debug\"\n\
       [[depends]]\nspec = \"symbols\"\nwhen = \"+debug\"\n"
        .to_string(),
      recipe("symbols", &[], &[]),
    ]);

    let app = resolve(&registry, "app+debug").unwrap();
    assert_lib_shared(&app, true);
    assert!(app.dependency("lib").unwrap().dependency("symbols").is_some());

    let plain = resolve(&registry, "app").unwrap();
    assert!(plain.dependency("lib").unwrap().dependency("symbols").is_none());
  }
}

mod precedence {
  use super::*;

  fn registry() -> Registry {
    registry_of(&[
      recipe("app", &["debug"], &[("lib", "debug")]),
      "name = \"lib\"\n[[version]]\nversion = \"1.0\"\n[[variant]]\nname = \"debug\"\ndefault = true\n".to_string(),
    ])
  }

  #[test]
  fn default_applies_without_inheritance_or_request() {
    let registry = registry_of(&[
      recipe("app", &["debug"], &[("lib", "")]),
      "name = \"lib\"\n[[version]]\nversion = \"1.0\"\n[[variant]]\nname = \"debug\"\ndefault = true\n".to_string(),
    ]);
    let app = resolve(&registry, "app").unwrap();
    assert_eq!(app.dependency("lib").unwrap().variant("debug"), Some(true));
  }

  #[test]
  fn inherited_beats_default() {
    let app = resolve(&registry(), "app~debug").unwrap();
    assert_eq!(app.dependency("lib").unwrap().variant("debug"), Some(false));
  }

  #[test]
  fn explicit_beats_inherited() {
    let app = resolve(&registry(), "app~debug ^lib+debug").unwrap();
    assert_eq!(app.variant("debug"), Some(false));
    assert_eq!(app.dependency("lib").unwrap().variant("debug"), Some(true));
  }
}

mod errors {
  use super::*;

  #[test]
  fn cycle_is_reported_with_its_path() {
    let registry = registry_of(&[recipe("a", &[], &[("b", "")]), recipe("b", &[], &[("a", "")])]);
    let err = resolve(&registry, "a").unwrap_err();
    match err {
      ResolutionError::DependencyCycle { path } => assert_eq!(path.to_string(), "a -> b -> a"),
      other => panic!("expected a cycle, got {other}"),
    }
  }

  /// `app` forces `debug` onto `lib` directly, `tool` forces its own value.
  fn forced_on_both_paths(lib_first: bool) -> Registry {
    let mut app_deps = vec![("lib", "debug"), ("tool", "")];
    if !lib_first {
      app_deps.reverse();
    }
    registry_of(&[
      recipe("app", &["debug"], &app_deps),
      recipe("tool", &["debug"], &[("lib", "debug")]),
      recipe("lib", &["debug"], &[]),
    ])
  }

  #[test]
  fn diamond_with_different_forced_values_conflicts() {
    let err = resolve(&forced_on_both_paths(true), "app+debug").unwrap_err();
    match err {
      ResolutionError::VariantConflict {
        package,
        variant,
        first_path,
        first_value,
        second_path,
        second_value,
      } => {
        assert_eq!(package, "lib");
        assert_eq!(variant, "debug");
        assert_eq!(first_path.to_string(), "app -> lib");
        assert!(first_value);
        assert_eq!(second_path.to_string(), "app -> tool -> lib");
        assert!(!second_value);
      }
      other => panic!("expected a variant conflict, got {other}"),
    }

    let err = resolve(&forced_on_both_paths(false), "app+debug").unwrap_err();
    assert!(matches!(
      err,
      ResolutionError::VariantConflict { ref first_path, first_value: false, ref second_path, second_value: true, .. }
        if first_path.to_string() == "app -> tool -> lib" && second_path.to_string() == "app -> lib"
    ));
  }

  #[test]
  fn diamond_with_equal_forced_values_shares() {
    let app = resolve(&forced_on_both_paths(true), "app+debug ^tool+debug").unwrap();
    let tool = app.dependency("tool").unwrap();
    assert!(Arc::ptr_eq(app.dependency("lib").unwrap(), tool.dependency("lib").unwrap()));
    assert_eq!(tool.dependency("lib").unwrap().variant("debug"), Some(true));
  }

  #[test]
  fn version_chosen_first_must_satisfy_later_edges() {
    let registry = registry_of(&[
      recipe("app", &[], &[("lib@1.0", ""), ("tool", "")]),
      recipe("tool", &[], &[("lib@2.0:", "")]),
      "name = \"lib\"\n[[version]]\nversion = \"1.0\"\n[[version]]\nversion = \"2.0\"\n".to_string(),
    ]);

    let err = resolve(&registry, "app").unwrap_err();
    assert!(matches!(
      err,
      ResolutionError::VersionConflict { ref package, ref second_path, .. }
        if package == "lib" && second_path.to_string() == "app -> tool -> lib"
    ));
  }

  #[test]
  fn unknown_names() {
    let registry = fixture_registry();
    assert!(matches!(
      resolve(&registry, "root6"),
      Err(ResolutionError::UnknownPackage { .. })
    ));
    assert!(matches!(
      resolve(&registry, "root ^xrootd+shared"),
      Err(ResolutionError::UnknownVariant { package, .. }) if package == "xrootd"
    ));
  }

  #[test]
  fn no_version_in_range() {
    let registry = fixture_registry();
    let err = resolve(&registry, "root ^python@3:").unwrap_err();
    assert!(matches!(err, ResolutionError::NoMatchingVersion { package, .. } if package == "python"));
  }
}

#[test]
fn batch_matches_sequential_resolution() {
  let registry = fixture_registry();
  let requests: Vec<Request> = ["root+cxx14", "geant+debug", "gccxml", "nonexistent", "cppunit+cxx14"]
    .iter()
    .map(|r| Request::parse(r).unwrap())
    .collect();

  let batch = resolve_batch(&registry, &requests);
  let resolver = Resolver::new(&registry);
  for (request, result) in requests.iter().zip(&batch) {
    let sequential = resolver.resolve(request);
    match (result, sequential) {
      (Ok(a), Ok(b)) => assert_eq!(a.as_ref(), b.as_ref()),
      (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
      (a, b) => panic!("batch and sequential disagree for {request}: {a:?} vs {b:?}"),
    }
  }
}

#[test]
fn spec_serializes_to_json() {
  let registry = fixture_registry();
  let gccxml = resolve(&registry, "gccxml").unwrap();
  let json = serde_json::to_value(gccxml.as_ref()).unwrap();
  assert_eq!(json["name"], "gccxml");
  assert_eq!(json["version"], "2013-07-31");
  assert_eq!(json["hash"], gccxml.hash().0);

  let cmake = gccxml.dependency("cmake").unwrap();
  assert_eq!(json["dependencies"]["cmake"], cmake.hash().0);
  assert_eq!(serde_json::to_value(cmake.as_ref()).unwrap()["version"], "3.4.0");
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_types_are_thread_safe() {
  assert_send_sync::<Registry>();
  assert_send_sync::<Spec>();
}
