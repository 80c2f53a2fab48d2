//! Leaf actions invoked by target bodies.
//!
//! Actions perform the external side effects of a build: running a native
//! tool or maintaining the package cache. Each returns a `Result`; the
//! caller turns any error into a failed target.

pub mod cache;
pub mod cmd;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use cache::{CacheStatus, refresh_cache};
pub use cmd::{CmdSpec, run_cmd};

/// Errors produced by leaf actions.
#[derive(Debug, Error)]
pub enum ActionError {
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("'{program}' exited with {}{}", exit_code(.code), stderr_suffix(.stderr))]
  CmdFailed {
    program: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("'{program}' killed after {}ms: deadline exceeded", .after.as_millis())]
  DeadlineExceeded { program: String, after: Duration },

  #[error("failed to start command runtime: {0}")]
  Runtime(#[source] io::Error),

  #[error("package cache error at {}: {source}", path.display())]
  Cache {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

fn exit_code(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("code {code}"),
    None => "signal".to_string(),
  }
}

fn stderr_suffix(stderr: &str) -> String {
  let last = stderr.lines().rev().find(|line| !line.trim().is_empty());
  match last {
    Some(line) => format!(": {}", line.trim()),
    None => String::new(),
  }
}
