//! `spackle plan`: compile the build plans for each request's closure.
//!
//! Plans are listed dependencies first, in the order an executor would run
//! them. Placeholders such as `$${prefix}` are printed unexpanded.

use anyhow::{Context, Result};
use serde::Serialize;

use spackle_lib::plan::{BuildPlan, ClosureDag, Compiler};

use super::Session;
use crate::output::{OutputFormat, print_header, print_json, print_stat};

#[derive(Serialize)]
struct ClosurePlans {
  request: String,
  /// Package names grouped so that every group only needs earlier ones.
  waves: Vec<Vec<String>>,
  plans: Vec<BuildPlan>,
}

pub fn cmd_plan(session: &Session, args: &[String], format: OutputFormat) -> Result<()> {
  let resolved = session.resolve_all(args)?;
  let compiler = Compiler::new(&session.registry, &session.options);

  let mut closures = Vec::with_capacity(resolved.len());
  for (request, spec) in &resolved {
    let waves = ClosureDag::from_spec(spec)
      .and_then(|dag| dag.waves())
      .with_context(|| format!("Failed to order the closure of '{}'", request))?
      .into_iter()
      .map(|wave| wave.iter().map(|s| s.name().to_string()).collect())
      .collect();
    let plans = compiler
      .compile_closure(spec)
      .with_context(|| format!("Failed to compile plans for '{}'", request))?;
    closures.push(ClosurePlans {
      request: request.to_string(),
      waves,
      plans,
    });
  }

  if format.is_json() {
    return print_json(&closures);
  }

  for (i, closure) in closures.iter().enumerate() {
    if i > 0 {
      println!();
    }
    println!("# {}", closure.request);
    for (n, wave) in closure.waves.iter().enumerate() {
      print_stat(&format!("wave {}", n + 1), &wave.join(" "));
    }
    for plan in &closure.plans {
      print_plan(plan);
    }
  }
  Ok(())
}

fn print_plan(plan: &BuildPlan) {
  print_header(&format!("{}@{}", plan.package, plan.version), &plan.spec_hash.0);
  for (n, step) in plan.steps.iter().enumerate() {
    println!("  {:>2}. {}", n + 1, step);
  }
  for (key, value) in &plan.exports {
    print_stat("export", &format!("{}={}", key, value));
  }
}
