use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use super::{ResolutionError, Resolver};
use crate::recipe::Registry;
use crate::request::Request;
use crate::spec::Spec;

/// Resolve independent requests in parallel.
///
/// Each request gets its own resolution state; only the registry is shared.
/// Results come back in request order and equal what resolving the requests
/// one by one would give.
pub fn resolve_batch(registry: &Registry, requests: &[Request]) -> Vec<Result<Arc<Spec>, ResolutionError>> {
  let resolver = Resolver::new(registry);
  let results: Vec<_> = requests.par_iter().map(|request| resolver.resolve(request)).collect();

  let failed = results.iter().filter(|r| r.is_err()).count();
  info!(requests = requests.len(), failed, "batch resolution finished");
  results
}
