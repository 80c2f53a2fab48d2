//! Command leaf action.
//!
//! Runs a native tool (compiler, package manager, VCS) to completion and
//! returns its trimmed stdout. The child inherits the process environment
//! plus every variable exported into the [`BuildContext`] by earlier targets,
//! then the command's own `env`. When the context carries a deadline the
//! child is killed once the remaining time runs out.

use std::collections::BTreeMap;
use std::panic;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::thread;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::context::BuildContext;

use super::ActionError;

/// A command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdSpec {
  pub program: String,
  pub args: Vec<String>,
  /// Working directory; relative paths are joined to the repository root.
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
}

impl CmdSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      ..Self::default()
    }
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
    self.cwd = Some(cwd.into());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }
}

/// Run `spec` to completion against `ctx`.
///
/// Blocks the calling thread on a current-thread runtime. When the caller is
/// itself inside a tokio runtime, the command is driven from a scoped thread
/// instead, since a runtime cannot be started from within another.
///
/// # Errors
///
/// - `Spawn` if the program cannot be started.
/// - `CmdFailed` with the exit code and captured stderr on non-zero exit.
/// - `DeadlineExceeded` if the context deadline passes while it runs.
pub fn run_cmd(spec: &CmdSpec, ctx: &BuildContext) -> Result<String, ActionError> {
  let cwd = match &spec.cwd {
    Some(dir) if dir.is_relative() => ctx.root().join(dir),
    Some(dir) => dir.clone(),
    None => ctx.root().to_path_buf(),
  };

  let exported = ctx.exported_env();
  let remaining = ctx.remaining();
  let run = || -> Result<String, ActionError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(ActionError::Runtime)?;
    runtime.block_on(execute(spec, &cwd, exported, remaining))
  };

  if tokio::runtime::Handle::try_current().is_err() {
    return run();
  }
  debug!(program = %spec.program, "inside an async runtime, running command on a scoped thread");
  thread::scope(|scope| {
    scope
      .spawn(run)
      .join()
      .unwrap_or_else(|payload| panic::resume_unwind(payload))
  })
}

async fn execute(
  spec: &CmdSpec,
  cwd: &Path,
  exported: &BTreeMap<String, String>,
  remaining: Option<Duration>,
) -> Result<String, ActionError> {
  info!(program = %spec.program, args = ?spec.args, "running command");

  let mut command = Command::new(&spec.program);
  command
    .args(&spec.args)
    .current_dir(cwd)
    .envs(exported)
    .envs(&spec.env)
    .stdin(Stdio::null())
    .kill_on_drop(true);

  debug!(working_dir = ?cwd, exported = exported.len(), "spawning process");

  let output = command.output();
  let output = match remaining {
    Some(limit) => tokio::time::timeout(limit, output)
      .await
      .map_err(|_| ActionError::DeadlineExceeded {
        program: spec.program.clone(),
        after: limit,
      })?,
    None => output.await,
  };
  let output = output.map_err(|source| ActionError::Spawn {
    program: spec.program.clone(),
    source,
  })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    return Err(ActionError::CmdFailed {
      program: spec.program.clone(),
      code: output.status.code(),
      stderr,
    });
  }

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}
