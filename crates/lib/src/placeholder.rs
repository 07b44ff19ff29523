//! Placeholder parsing and substitution for values only known at build time.
//!
//! Recipes and compiled plans never contain concrete filesystem paths: the
//! install prefix, the unpacked source tree and compiler flags all belong to
//! the executor. They are written as placeholders instead and expanded by the
//! executor through a [`Resolver`].
//!
//! # Placeholder Formats
//!
//! - `$${prefix}` - install prefix of the package being built
//! - `$${prefix:<pkg>}` - install prefix of dependency `<pkg>`
//! - `$${source}` - the unpacked source directory
//! - `$${stage}` - the staging directory that holds the source tree
//! - `$${compiler:<flag>}` - a compiler-specific flag such as `cxx14_flag`
//! - `$${recipe:<file>}` - a file shipped next to the recipe (patches)
//!
//! Single `$` characters pass through unchanged, so `$HOME` needs no escaping.
//! `$$${` produces a literal `$${`.
//!
//! # Example
//!
//! ```
//! use spackle_lib::placeholder::{parse, Placeholder, Segment};
//!
//! let segments = parse("-DCMAKE_INSTALL_PREFIX:PATH=$${prefix}").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Literal("-DCMAKE_INSTALL_PREFIX:PATH=".to_string()),
//!     Segment::Placeholder(Placeholder::Prefix(None)),
//! ]);
//! ```

use thiserror::Error;

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${prefix}` or `$${prefix:<pkg>}`
  Prefix(Option<String>),

  /// `$${source}`
  Source,

  /// `$${stage}`
  Stage,

  /// `$${compiler:<flag>}`
  Compiler(String),

  /// `$${recipe:<file>}`
  RecipeFile(String),
}

impl std::fmt::Display for Placeholder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Placeholder::Prefix(None) => write!(f, "$${{prefix}}"),
      Placeholder::Prefix(Some(pkg)) => write!(f, "$${{prefix:{}}}", pkg),
      Placeholder::Source => write!(f, "$${{source}}"),
      Placeholder::Stage => write!(f, "$${{stage}}"),
      Placeholder::Compiler(flag) => write!(f, "$${{compiler:{}}}", flag),
      Placeholder::RecipeFile(file) => write!(f, "$${{recipe:{}}}", file),
    }
  }
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error("unresolved placeholder: {0}")]
  Unresolved(String),
}

/// Supplies concrete values for placeholders. Implemented by executors.
pub trait Resolver {
  /// Install prefix of the current package (`None`) or of a dependency.
  fn resolve_prefix(&self, package: Option<&str>) -> Result<&str, PlaceholderError>;

  fn resolve_source(&self) -> Result<&str, PlaceholderError>;

  fn resolve_stage(&self) -> Result<&str, PlaceholderError>;

  fn resolve_compiler_flag(&self, flag: &str) -> Result<&str, PlaceholderError>;

  fn resolve_recipe_file(&self, file: &str) -> Result<&str, PlaceholderError>;
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is unclosed, of an unknown type, or
/// missing a required argument.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' || chars.peek().map(|(_, c)| *c) != Some('$') {
      literal.push(ch);
      continue;
    }

    // "$$" seen
    chars.next();
    match chars.peek().map(|(_, c)| *c) {
      Some('$') => {
        chars.next();
        if chars.peek().map(|(_, c)| *c) == Some('{') {
          chars.next();
          literal.push_str("$${");
        } else {
          literal.push_str("$$$");
        }
      }
      Some('{') => {
        chars.next();
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let mut content = String::new();
        let mut closed = false;
        for (_, c) in chars.by_ref() {
          if c == '}' {
            closed = true;
            break;
          }
          content.push(c);
        }
        if !closed {
          return Err(PlaceholderError::Unclosed(pos));
        }

        segments.push(Segment::Placeholder(parse_placeholder_content(&content)?));
      }
      _ => literal.push_str("$$"),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  let (kind, arg) = match content.split_once(':') {
    Some((kind, arg)) => (kind, Some(arg)),
    None => (content, None),
  };

  let required = |arg: Option<&str>| match arg {
    Some(a) if !a.is_empty() => Ok(a.to_string()),
    _ => Err(PlaceholderError::Malformed(format!("'{kind}' placeholder needs an argument: '{content}'"))),
  };

  match (kind, arg) {
    ("prefix", None) => Ok(Placeholder::Prefix(None)),
    ("prefix", arg) => Ok(Placeholder::Prefix(Some(required(arg)?))),
    ("source", None) => Ok(Placeholder::Source),
    ("stage", None) => Ok(Placeholder::Stage),
    ("source" | "stage", Some(_)) => Err(PlaceholderError::Malformed(format!(
      "'{kind}' placeholder takes no argument: '{content}'"
    ))),
    ("compiler", arg) => Ok(Placeholder::Compiler(required(arg)?)),
    ("recipe", arg) => Ok(Placeholder::RecipeFile(required(arg)?)),
    _ => Err(PlaceholderError::UnknownType(kind.to_string())),
  }
}

/// Write parsed segments back out in placeholder syntax.
///
/// Literal `$${` sequences are re-escaped, so `render(parse(s)?)` parses back
/// to the same segments.
pub fn render(segments: &[Segment]) -> String {
  let mut out = String::new();
  for segment in segments {
    match segment {
      Segment::Literal(s) => out.push_str(&s.replace("$${", "$$${")),
      Segment::Placeholder(p) => out.push_str(&p.to_string()),
    }
  }
  out
}

/// Point every `$${prefix}` in `input` at `package`'s prefix instead.
///
/// Used when a value exported by a dependency is copied into the plan of
/// the package that depends on it.
pub fn retarget_prefix(input: &str, package: &str) -> Result<String, PlaceholderError> {
  let segments = parse(input)?
    .into_iter()
    .map(|segment| match segment {
      Segment::Placeholder(Placeholder::Prefix(None)) => {
        Segment::Placeholder(Placeholder::Prefix(Some(package.to_string())))
      }
      other => other,
    })
    .collect::<Vec<_>>();
  Ok(render(&segments))
}

/// Parse and substitute in one step.
pub fn substitute(input: &str, resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> Result<String, PlaceholderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(p) => {
        let value = match p {
          Placeholder::Prefix(pkg) => resolver.resolve_prefix(pkg.as_deref())?,
          Placeholder::Source => resolver.resolve_source()?,
          Placeholder::Stage => resolver.resolve_stage()?,
          Placeholder::Compiler(flag) => resolver.resolve_compiler_flag(flag)?,
          Placeholder::RecipeFile(file) => resolver.resolve_recipe_file(file)?,
        };
        result.push_str(value);
      }
    }
  }

  Ok(result)
}
