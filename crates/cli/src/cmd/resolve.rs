//! `spackle resolve`: print the resolved dependency tree of each request.

use anyhow::Result;
use serde::Serialize;

use spackle_lib::spec::Spec;
use spackle_lib::util::hash::ObjectHash;

use super::Session;
use crate::output::{OutputFormat, print_header, print_json};

/// One request in JSON output. `nodes` lists the closure once per package,
/// dependencies first; dependency maps refer to other nodes by hash.
#[derive(Serialize)]
struct Resolved<'a> {
  request: String,
  hash: &'a ObjectHash,
  nodes: Vec<&'a Spec>,
  #[serde(skip)]
  root: &'a Spec,
}

pub fn cmd_resolve(session: &Session, args: &[String], format: OutputFormat) -> Result<()> {
  let resolved = session.resolve_all(args)?;

  let entries: Vec<Resolved> = resolved
    .iter()
    .map(|(request, spec)| Resolved {
      request: request.to_string(),
      hash: spec.hash(),
      nodes: spec.traverse(),
      root: spec.as_ref(),
    })
    .collect();

  if format.is_json() {
    return print_json(&entries);
  }

  for (i, entry) in entries.iter().enumerate() {
    if i > 0 {
      println!();
    }
    print_header(&entry.request, &entry.hash.0);
    print!("{}", entry.root.tree());
  }
  Ok(())
}
