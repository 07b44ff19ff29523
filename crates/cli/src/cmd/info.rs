//! `spackle info`: describe one package recipe.

use anyhow::{Result, anyhow};
use owo_colors::{OwoColorize, Stream};

use spackle_lib::matcher::variant_sigil;
use spackle_lib::recipe::{DependencyDecl, GitReference, Source};

use super::Session;
use crate::output::{print_stat, symbols};

pub fn cmd_info(session: &Session, package: &str) -> Result<()> {
  let definition = session
    .registry
    .get(package)
    .ok_or_else(|| anyhow!("Unknown package '{}'", package))?;

  println!("{}", definition.name.if_supports_color(Stream::Stdout, |s| s.bold()));
  if let Some(description) = &definition.description {
    print_stat("Description", description);
  }
  if let Some(homepage) = &definition.homepage {
    print_stat("Homepage", homepage);
  }
  print_stat("Build system", definition.build.system.as_str());

  println!();
  println!("Versions:");
  for decl in &definition.versions {
    let marker = if decl.preferred { " (preferred)" } else { "" };
    match &decl.source {
      Some(source) => println!("  {}{}  {}", decl.version, marker, describe_source(source)),
      None => println!("  {}{}", decl.version, marker),
    }
  }

  if !definition.variants.is_empty() {
    println!();
    println!("Variants:");
    for variant in &definition.variants {
      println!(
        "  {}{:<12} {}",
        variant_sigil(variant.default),
        variant.name,
        variant.description.if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
  }

  if !definition.dependencies.is_empty() {
    println!();
    println!("Dependencies:");
    for decl in &definition.dependencies {
      println!("  {}", describe_dependency(decl));
    }
  }

  Ok(())
}

fn describe_source(source: &Source) -> String {
  match source {
    Source::Url { url } => url.clone(),
    Source::Git { url, reference } => {
      let (kind, value) = match reference {
        GitReference::Commit(c) => ("commit", c),
        GitReference::Tag(t) => ("tag", t),
        GitReference::Branch(b) => ("branch", b),
      };
      format!("git {} ({} {})", url, kind, value)
    }
  }
}

fn describe_dependency(decl: &DependencyDecl) -> String {
  let mut out = decl.package.clone();
  if let Some(range) = &decl.range {
    out.push_str(&format!("@{}", range));
  }
  if let Some(when) = &decl.when {
    out.push_str(&format!(" {} when {}", symbols::ARROW, when));
  }
  if !decl.inherit.is_empty() {
    out.push_str(&format!(" [inherits {}]", decl.inherit.join(", ")));
  }
  out
}
