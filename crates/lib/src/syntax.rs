//! Lexing of the compact constraint syntax shared by recipes and requests.
//!
//! A clause is an optional package name followed by any number of
//! `@<range>`, `+<variant>` and `~<variant>` items, with optional whitespace
//! between them: `xrootd@4.2.3 +debug ~cxx14`. A `-` at the start of a word
//! is accepted in place of `~`.

use thiserror::Error;

use crate::version::{VersionError, VersionRange};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
  #[error("empty constraint")]
  Empty,

  #[error("unexpected character '{ch}' at position {pos} in '{text}'")]
  Unexpected { text: String, pos: usize, ch: char },

  #[error("missing {what} after '{marker}' in '{text}'")]
  MissingOperand { text: String, marker: char, what: &'static str },

  #[error("more than one version range in '{0}'")]
  DuplicateRange(String),

  #[error("variant '{variant}' given twice in '{text}'")]
  DuplicateVariant { text: String, variant: String },

  #[error("invalid version range in '{text}': {source}")]
  Range {
    text: String,
    #[source]
    source: VersionError,
  },
}

/// One parsed clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Clause {
  pub name: Option<String>,
  pub range: Option<VersionRange>,
  /// Variant requirements in the order they were written.
  pub variants: Vec<(String, bool)>,
}

fn is_name_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_range_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '-' | '_')
}

pub(crate) fn parse_clause(text: &str) -> Result<Clause, SyntaxError> {
  if text.trim().is_empty() {
    return Err(SyntaxError::Empty);
  }

  let chars: Vec<(usize, char)> = text.char_indices().collect();
  let mut clause = Clause::default();
  let mut i = 0;

  let take_while = |start: usize, pred: fn(char) -> bool| -> (usize, String) {
    let mut end = start;
    let mut out = String::new();
    while end < chars.len() && pred(chars[end].1) {
      out.push(chars[end].1);
      end += 1;
    }
    (end, out)
  };

  while i < chars.len() {
    let (pos, ch) = chars[i];
    match ch {
      c if c.is_whitespace() => i += 1,
      '@' => {
        let (end, range) = take_while(i + 1, is_range_char);
        if range.is_empty() {
          return Err(SyntaxError::MissingOperand {
            text: text.to_string(),
            marker: '@',
            what: "version range",
          });
        }
        if clause.range.is_some() {
          return Err(SyntaxError::DuplicateRange(text.to_string()));
        }
        let parsed = VersionRange::parse(&range).map_err(|source| SyntaxError::Range {
          text: text.to_string(),
          source,
        })?;
        clause.range = Some(parsed);
        i = end;
      }
      '-' if i == 0 || chars[i - 1].1.is_whitespace() => {
        let (end, name) = take_while(i + 1, is_name_char);
        push_variant(&mut clause, text, ch, name, false)?;
        i = end;
      }
      '+' | '~' => {
        let (end, name) = take_while(i + 1, is_name_char);
        push_variant(&mut clause, text, ch, name, ch == '+')?;
        i = end;
      }
      c if is_name_char(c) && clause.name.is_none() && clause.range.is_none() && clause.variants.is_empty() => {
        let (end, name) = take_while(i, is_name_char);
        clause.name = Some(name);
        i = end;
      }
      _ => {
        return Err(SyntaxError::Unexpected {
          text: text.to_string(),
          pos,
          ch,
        });
      }
    }
  }

  Ok(clause)
}

fn push_variant(clause: &mut Clause, text: &str, marker: char, name: String, value: bool) -> Result<(), SyntaxError> {
  if name.is_empty() {
    return Err(SyntaxError::MissingOperand {
      text: text.to_string(),
      marker,
      what: "variant name",
    });
  }
  if clause.variants.iter().any(|(v, _)| *v == name) {
    return Err(SyntaxError::DuplicateVariant {
      text: text.to_string(),
      variant: name,
    });
  }
  clause.variants.push((name, value));
  Ok(())
}
