use std::num::NonZeroUsize;

use spackle_lib::placeholder::{self, PlaceholderError, Resolver as PlaceholderResolver};
use spackle_lib::plan::{BuildPlan, ClosureDag, CompileOptions, Compiler, Step, WorkDir};
use spackle_lib::util::hash::Hashable;

use super::common::{fixture_registry, resolve};

fn tool_calls(plan: &BuildPlan) -> Vec<String> {
  plan
    .steps
    .iter()
    .filter(|s| matches!(s, Step::Invoke(_)))
    .map(|s| s.to_string())
    .collect()
}

#[test]
fn root_plan_matches_its_recipe() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root@5.34.25+cxx14").unwrap();
  let plan = Compiler::new(&registry, &CompileOptions::default()).compile(&root).unwrap();

  assert_eq!(plan.package, "root");
  assert_eq!(plan.version.as_str(), "5.34.25");
  assert_eq!(plan.spec_hash, root.compute_hash().unwrap());
  assert_eq!(plan.exports["ROOTSYS"], "$${prefix}");

  let calls = tool_calls(&plan);
  assert_eq!(
    calls,
    [
      "[build:spack-build] cmake $${source} -DCMAKE_INSTALL_PREFIX:PATH=$${prefix} \
       -DCMAKE_BUILD_TYPE:STRING=RelWithDebInfo -DCMAKE_VERBOSE_MAKEFILE:BOOL=ON \
       -DCMAKE_CXX_FLAGS=$${compiler:cxx14_flag} -Dshadowpw:BOOL=OFF",
      "[build:spack-build] make",
      "[build:spack-build] make install",
    ]
  );
}

#[test]
fn dependency_exports_come_first() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root").unwrap();
  let plan = Compiler::new(&registry, &CompileOptions::default()).compile(&root).unwrap();

  assert_eq!(
    plan.steps[0],
    Step::SetEnv {
      key: "XRDSYS".to_string(),
      value: "$${prefix:xrootd}".to_string(),
      origin: Some("xrootd".to_string()),
    }
  );
  assert!(matches!(&plan.steps[1], Step::Invoke(inv) if inv.tool == "cmake"));
}

#[test]
fn geant_debug_build() {
  let registry = fixture_registry();
  let geant = resolve(&registry, "geant+cxx14+debug").unwrap();
  let plan = Compiler::new(&registry, &CompileOptions { jobs: NonZeroUsize::new(8) })
    .compile(&geant)
    .unwrap();

  let Some(Step::Invoke(cmake)) = plan.steps.iter().find(|s| matches!(s, Step::Invoke(i) if i.tool == "cmake"))
  else {
    panic!("geant plan has no cmake step");
  };
  assert_eq!(cmake.cwd, WorkDir::Build("spack-build".to_string()));
  let cxxstd = cmake.args.iter().position(|a| a == "-DGEANT4_BUILD_CXXSTD=c++11").unwrap();
  let debug = cmake.args.iter().position(|a| a == "-DCMAKE_BUILD_TYPE:STRING=Debug").unwrap();
  let system_clhep = cmake.args.iter().position(|a| a == "-DGEANT4_USE_SYSTEM_CLHEP=ON").unwrap();
  assert!(cxxstd < debug && debug < system_clhep);

  assert!(tool_calls(&plan).contains(&"[build:spack-build] make -j8".to_string()));
}

#[test]
fn xrootd_is_patched_before_configuring() {
  let registry = fixture_registry();
  let xrootd = resolve(&registry, "xrootd").unwrap();
  let plan = Compiler::new(&registry, &CompileOptions::default()).compile(&xrootd).unwrap();

  let calls = tool_calls(&plan);
  assert_eq!(calls[0], "[source] patch -p1 -i $${recipe:xrootd-4.2.3.patch}");
  assert!(calls[1].starts_with("[build:spack-build] cmake"));
}

#[test]
fn cppunit_uses_configure() {
  let registry = fixture_registry();
  let cppunit = resolve(&registry, "cppunit+cxx14").unwrap();
  let plan = Compiler::new(&registry, &CompileOptions::default()).compile(&cppunit).unwrap();

  assert_eq!(
    plan.steps[0],
    Step::SetEnv {
      key: "CXXFLAGS".to_string(),
      value: "$${compiler:cxx14_flag}".to_string(),
      origin: None,
    }
  );
  assert_eq!(
    tool_calls(&plan),
    ["[source] configure --prefix=$${prefix}", "[source] make", "[source] make install"]
  );
}

#[test]
fn closure_plans_are_ordered_and_idempotent() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root+debug").unwrap();
  let compiler = Compiler::new(&registry, &CompileOptions::default());

  let first = compiler.compile_closure(&root).unwrap();
  let second = compiler.compile_closure(&root).unwrap();
  assert_eq!(first, second);
  for (a, b) in first.iter().zip(&second) {
    assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
  }

  let position = |name: &str| first.iter().position(|p| p.package == name).unwrap();
  assert_eq!(first.len(), root.traverse().len());
  assert!(position("cmake") < position("xrootd"));
  assert!(position("python") < position("xrootd"));
  assert!(position("xrootd") < position("root"));
  assert_eq!(first.last().unwrap().package, "root");
}

#[test]
fn closure_waves() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root").unwrap();
  let dag = ClosureDag::from_spec(&root).unwrap();
  let waves = dag.waves().unwrap();

  let names: Vec<Vec<&str>> = waves.iter().map(|w| w.iter().map(|s| s.name()).collect()).collect();
  assert_eq!(names.len(), 3);
  assert_eq!(
    names[0],
    ["cmake", "fftw", "gsl", "jpeg", "libpng", "libtiff", "libxml2", "python"]
  );
  assert_eq!(names[1], ["xrootd"]);
  assert_eq!(names[2], ["root"]);
}

/// Expands placeholders the way an executor with a fixed layout would.
struct Layout;

impl PlaceholderResolver for Layout {
  fn resolve_prefix(&self, package: Option<&str>) -> Result<&str, PlaceholderError> {
    match package {
      None => Ok("/opt/root"),
      Some("xrootd") => Ok("/opt/xrootd"),
      Some(other) => Err(PlaceholderError::Unresolved(format!("prefix:{other}"))),
    }
  }

  fn resolve_source(&self) -> Result<&str, PlaceholderError> {
    Ok("/stage/root/src")
  }

  fn resolve_stage(&self) -> Result<&str, PlaceholderError> {
    Ok("/stage/root")
  }

  fn resolve_compiler_flag(&self, flag: &str) -> Result<&str, PlaceholderError> {
    match flag {
      "cxx14_flag" => Ok("-std=c++14"),
      _ => Err(PlaceholderError::Unresolved(format!("compiler:{flag}"))),
    }
  }

  fn resolve_recipe_file(&self, file: &str) -> Result<&str, PlaceholderError> {
    Err(PlaceholderError::Unresolved(format!("recipe:{file}")))
  }
}

#[test]
fn executor_can_expand_every_step() {
  let registry = fixture_registry();
  let root = resolve(&registry, "root+cxx14").unwrap();
  let plan = Compiler::new(&registry, &CompileOptions::default()).compile(&root).unwrap();

  let mut expanded = Vec::new();
  for step in &plan.steps {
    match step {
      Step::SetEnv { key, value, .. } => {
        expanded.push(format!("{}={}", key, placeholder::substitute(value, &Layout).unwrap()))
      }
      Step::Invoke(inv) => {
        for arg in &inv.args {
          expanded.push(placeholder::substitute(arg, &Layout).unwrap());
        }
      }
    }
  }

  assert!(expanded.contains(&"XRDSYS=/opt/xrootd".to_string()));
  assert!(expanded.contains(&"CXXFLAGS=-std=c++14".to_string()));
  assert!(expanded.contains(&"-DCMAKE_INSTALL_PREFIX:PATH=/opt/root".to_string()));
  assert!(expanded.contains(&"/stage/root/src".to_string()));
}

#[test]
fn plan_serializes_to_json() {
  let registry = fixture_registry();
  let gccxml = resolve(&registry, "gccxml").unwrap();
  let plan = Compiler::new(&registry, &CompileOptions::default()).compile(&gccxml).unwrap();

  let json = serde_json::to_string(&plan).unwrap();
  let back: BuildPlan = serde_json::from_str(&json).unwrap();
  assert_eq!(back, plan);
  let value: serde_json::Value = serde_json::from_str(&json).unwrap();
  assert_eq!(value["steps"][0]["invoke"]["cwd"], "source");
}
