use std::collections::BTreeSet;

use tracing::{debug, info};

use super::dag::ClosureDag;
use super::types::{BuildPlan, CompileError, CompileOptions, Step, ToolInvocation, WorkDir};
use crate::placeholder::{self, Placeholder};
use crate::recipe::{BuildSystem, PackageDefinition, Registry};
use crate::spec::Spec;
use crate::util::hash::Hashable;

/// Arguments every cmake configure step starts with.
const CMAKE_STD_ARGS: [&str; 3] = [
  "-DCMAKE_INSTALL_PREFIX:PATH=$${prefix}",
  "-DCMAKE_BUILD_TYPE:STRING=RelWithDebInfo",
  "-DCMAKE_VERBOSE_MAKEFILE:BOOL=ON",
];

/// Turns resolved specs into build plans. Compilation is pure: the same spec
/// always yields the same plan.
#[derive(Debug, Clone)]
pub struct Compiler<'r> {
  registry: &'r Registry,
  options: CompileOptions,
}

impl<'r> Compiler<'r> {
  pub fn new(registry: &'r Registry, options: &CompileOptions) -> Self {
    Self {
      registry,
      options: options.clone(),
    }
  }

  /// Compile the plan for a single node.
  ///
  /// Steps are, in order: values exported by direct dependencies, variant
  /// environment effects, patches, then the build system's tool invocations.
  ///
  /// # Errors
  ///
  /// [`CompileError::NotFullyResolved`] if `spec` does not match its recipe
  /// exactly (unknown package, undeclared version, missing or extra
  /// variants).
  pub fn compile(&self, spec: &Spec) -> Result<BuildPlan, CompileError> {
    let def = self.definition_for(spec)?;
    let mut steps = Vec::new();

    for dep in spec.dependencies().values() {
      let dep_def = self.definition_for(dep)?;
      for (key, value) in &dep_def.exports {
        let value = placeholder::retarget_prefix(value, dep.name()).map_err(|source| CompileError::Placeholder {
          package: dep.name().to_string(),
          source,
        })?;
        steps.push(Step::SetEnv {
          key: key.clone(),
          value,
          origin: Some(dep.name().to_string()),
        });
      }
    }

    let mut variant_args = Vec::new();
    for variant in &def.variants {
      let value = spec.variant(&variant.name).ok_or_else(|| not_resolved(spec, "variant missing"))?;
      let effect = variant.effect(value);
      for (key, value) in &effect.env {
        steps.push(Step::SetEnv {
          key: key.clone(),
          value: value.clone(),
          origin: None,
        });
      }
      variant_args.extend(effect.args.iter().cloned());
    }

    for patch in &def.patches {
      if patch.when.as_ref().is_none_or(|w| w.matches(spec)) {
        let file = Placeholder::RecipeFile(patch.file.clone()).to_string();
        steps.push(Step::Invoke(
          ToolInvocation::new("patch", WorkDir::Source).args(["-p1".to_string(), "-i".to_string(), file]),
        ));
      }
    }

    let cwd = match &def.build.build_dir {
      Some(dir) if def.build.system == BuildSystem::Cmake => WorkDir::Build(dir.clone()),
      _ => WorkDir::Source,
    };

    let configure = match def.build.system {
      BuildSystem::Cmake => ToolInvocation::new("cmake", cwd.clone())
        .args([Placeholder::Source.to_string()])
        .args(CMAKE_STD_ARGS),
      BuildSystem::Autotools => ToolInvocation::new("configure", cwd.clone()).args([format!(
        "--prefix={}",
        Placeholder::Prefix(None)
      )]),
    };
    steps.push(Step::Invoke(
      configure.args(variant_args).args(def.build.args.iter().cloned()),
    ));

    let jobs = self.options.jobs.map(|n| format!("-j{}", n));
    steps.push(Step::Invoke(ToolInvocation::new("make", cwd.clone()).args(jobs)));
    steps.push(Step::Invoke(ToolInvocation::new("make", cwd).args(["install"])));

    let plan = BuildPlan {
      package: spec.name().to_string(),
      version: spec.version().clone(),
      spec_hash: spec.compute_hash()?,
      steps,
      exports: def.exports.clone(),
    };
    debug!(package = %plan.package, version = %plan.version, steps = plan.steps.len(), "compiled build plan");
    Ok(plan)
  }

  /// Plans for every node of the closure, dependencies before dependents.
  pub fn compile_closure(&self, root: &Spec) -> Result<Vec<BuildPlan>, CompileError> {
    let dag = ClosureDag::from_spec(root)?;
    let plans = dag
      .topological()?
      .into_iter()
      .map(|spec| self.compile(spec))
      .collect::<Result<Vec<_>, _>>()?;
    info!(root = %root.short(), plans = plans.len(), "compiled closure");
    Ok(plans)
  }

  /// The recipe `spec` was resolved from, checked against the spec.
  fn definition_for(&self, spec: &Spec) -> Result<&'r PackageDefinition, CompileError> {
    let def = self
      .registry
      .get(spec.name())
      .ok_or_else(|| not_resolved(spec, "unknown package"))?;

    if def.version(spec.version()).is_none() {
      return Err(not_resolved(spec, &format!("version {} is not declared", spec.version())));
    }

    let declared: BTreeSet<&str> = def.variants.iter().map(|v| v.name.as_str()).collect();
    let set: BTreeSet<&str> = spec.variants().keys().map(String::as_str).collect();
    if let Some(missing) = declared.difference(&set).next() {
      return Err(not_resolved(spec, &format!("variant '{}' has no value", missing)));
    }
    if let Some(extra) = set.difference(&declared).next() {
      return Err(not_resolved(spec, &format!("variant '{}' is not declared", extra)));
    }

    Ok(def)
  }
}

fn not_resolved(spec: &Spec, reason: &str) -> CompileError {
  CompileError::NotFullyResolved {
    package: spec.name().to_string(),
    reason: reason.to_string(),
  }
}
