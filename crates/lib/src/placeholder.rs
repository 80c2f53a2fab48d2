//! Placeholder parsing and substitution for manifest strings.
//!
//! Manifest targets refer to values that only exist at run time (a commit
//! hash captured by an upstream target, the output directory of the selected
//! configuration). Such references are written as placeholders and resolved
//! against the [`BuildContext`](crate::context::BuildContext) right before a
//! body uses them.
//!
//! # Placeholder Formats
//!
//! - `$${ctx:<key>}` - string value published in the context under `<key>`
//! - `$${dir:<name>}` - one of the run directories: `root`, `build`, `output`, `packages`
//! - `$${configuration}` - the configuration name
//!
//! Single `$` characters pass through unchanged, so shell variables like
//! `$HOME` need no escaping. Use `$$${` to produce a literal `$${`.
//!
//! # Example
//!
//! ```
//! use targetry_lib::placeholder::{parse, Placeholder, Segment};
//!
//! let segments = parse("$${dir:output}/dotnet-$${ctx:Version}.zip").unwrap();
//! assert_eq!(segments[1], Segment::Literal("/dotnet-".to_string()));
//! assert_eq!(segments[2], Segment::Placeholder(Placeholder::Context("Version".to_string())));
//! ```

use std::fmt;

use thiserror::Error;

use crate::context::ContextError;

/// A run directory a placeholder can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
  Root,
  Build,
  Output,
  Packages,
}

impl DirKind {
  fn parse(name: &str) -> Option<Self> {
    match name {
      "root" => Some(Self::Root),
      "build" => Some(Self::Build),
      "output" => Some(Self::Output),
      "packages" => Some(Self::Packages),
      _ => None,
    }
  }
}

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  /// `$${ctx:<key>}`
  Context(String),
  /// `$${dir:<name>}`
  Dir(DirKind),
  /// `$${configuration}`
  Configuration,
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Placeholder(Placeholder),
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unknown placeholder type: {0}")]
  UnknownType(String),

  #[error("unknown directory '{0}': expected root, build, output or packages")]
  UnknownDir(String),

  #[error("malformed placeholder: {0}")]
  Malformed(String),

  #[error(transparent)]
  Context(#[from] ContextError),
}

/// Source of values for placeholders.
pub trait Resolver {
  /// Resolve a string context value.
  fn resolve_context(&self, key: &str) -> Result<String, PlaceholderError>;

  /// Resolve a run directory as a string.
  fn resolve_dir(&self, dir: DirKind) -> Result<String, PlaceholderError>;

  /// Resolve the configuration name.
  fn resolve_configuration(&self) -> Result<String, PlaceholderError>;
}

/// Parse a string containing placeholders into segments.
///
/// # Errors
///
/// Returns an error if a placeholder is unclosed, empty or of an unknown type.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    // A lone `$` is literal text (shell variables).
    if !matches!(chars.peek(), Some((_, '$'))) {
      literal.push('$');
      continue;
    }
    chars.next();

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();
        if matches!(chars.peek(), Some((_, '{'))) {
          // `$$${` escapes a literal `$${`
          chars.next();
          literal.push_str("$${");
        } else {
          literal.push_str("$$$");
        }
      }
      Some((_, '{')) => {
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

/// Parse the content between `$${` and `}`.
fn parse_placeholder_content(content: &str) -> Result<Placeholder, PlaceholderError> {
  let content = content.trim();
  if content == "configuration" {
    return Ok(Placeholder::Configuration);
  }

  let (kind, rest) = content
    .split_once(':')
    .ok_or_else(|| PlaceholderError::Malformed(format!("missing colon in '{content}'")))?;
  let (kind, rest) = (kind.trim(), rest.trim());

  if rest.is_empty() {
    return Err(PlaceholderError::Malformed(format!("empty name in '{content}'")));
  }

  match kind {
    "ctx" => Ok(Placeholder::Context(rest.to_string())),
    "dir" => DirKind::parse(rest)
      .map(Placeholder::Dir)
      .ok_or_else(|| PlaceholderError::UnknownDir(rest.to_string())),
    _ => Err(PlaceholderError::UnknownType(kind.to_string())),
  }
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
          Placeholder::Context(key) => resolver.resolve_context(key)?,
          Placeholder::Dir(dir) => resolver.resolve_dir(*dir)?,
          Placeholder::Configuration => resolver.resolve_configuration()?,
        };
        result.push_str(&value);
      }
    }
  }

  Ok(result)
}

/// Context keys referenced by `input`, in order of appearance.
pub fn context_keys(input: &str) -> Result<Vec<String>, PlaceholderError> {
  Ok(
    parse(input)?
      .into_iter()
      .filter_map(|segment| match segment {
        Segment::Placeholder(Placeholder::Context(key)) => Some(key),
        _ => None,
      })
      .collect(),
  )
}

impl fmt::Display for Placeholder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Context(key) => write!(f, "$${{ctx:{}}}", key),
      Self::Dir(dir) => {
        let name = match dir {
          DirKind::Root => "root",
          DirKind::Build => "build",
          DirKind::Output => "output",
          DirKind::Packages => "packages",
        };
        write!(f, "$${{dir:{}}}", name)
      }
      Self::Configuration => write!(f, "$${{configuration}}"),
    }
  }
}
