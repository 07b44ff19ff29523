//! `spackle list`: package names known to the configured repositories.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use super::Session;

pub fn cmd_list(session: &Session) -> Result<()> {
  for definition in session.registry.iter() {
    match &definition.description {
      Some(description) => println!(
        "{:<16} {}",
        definition.name,
        description.if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
      None => println!("{}", definition.name),
    }
  }
  Ok(())
}
