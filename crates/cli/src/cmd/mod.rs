mod info;
mod list;
mod plan;
mod resolve;

pub use info::cmd_info;
pub use list::cmd_list;
pub use plan::cmd_plan;
pub use resolve::cmd_resolve;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;

use spackle_lib::config::Config;
use spackle_lib::plan::CompileOptions;
use spackle_lib::recipe::Registry;
use spackle_lib::request::Request;
use spackle_lib::resolve::resolve_batch;
use spackle_lib::spec::Spec;

use crate::output::print_error;

/// A loaded registry plus the options every command shares.
pub struct Session {
  pub registry: Registry,
  pub options: CompileOptions,
}

impl Session {
  pub fn open(config: &Config) -> Result<Self> {
    if config.repos.is_empty() {
      bail!("No recipe repository configured; pass --repo or set SPACKLE_REPO");
    }
    let registry = Registry::load_dirs(&config.repos).context("Failed to load recipe repositories")?;
    debug!(packages = registry.len(), repos = config.repos.len(), "opened session");
    Ok(Self {
      registry,
      options: config.compile_options(),
    })
  }

  /// Parse and resolve every request. Failures are reported one per line and
  /// then turned into a single error.
  pub fn resolve_all(&self, args: &[String]) -> Result<Vec<(Request, Arc<Spec>)>> {
    let requests = parse_requests(args)?;
    let results = resolve_batch(&self.registry, &requests);

    let mut resolved = Vec::with_capacity(requests.len());
    let mut failed = 0;
    for (request, result) in requests.into_iter().zip(results) {
      match result {
        Ok(spec) => resolved.push((request, spec)),
        Err(err) => {
          failed += 1;
          print_error(&format!("{}: {}", request, err));
        }
      }
    }

    if failed > 0 {
      bail!("{} of {} request(s) failed to resolve", failed, resolved.len() + failed);
    }
    Ok(resolved)
  }
}

/// Join arguments into request strings: an argument starting with `^` belongs
/// to the request before it.
fn group_requests(args: &[String]) -> Result<Vec<String>> {
  let mut groups: Vec<String> = Vec::new();
  for arg in args {
    if arg.trim_start().starts_with('^') {
      let Some(last) = groups.last_mut() else {
        bail!("Dependency constraint '{}' has no request before it", arg);
      };
      last.push(' ');
      last.push_str(arg);
    } else {
      groups.push(arg.clone());
    }
  }
  Ok(groups)
}

fn parse_requests(args: &[String]) -> Result<Vec<Request>> {
  group_requests(args)?
    .iter()
    .map(|text| Request::parse(text).with_context(|| format!("Invalid request '{}'", text)))
    .collect()
}
