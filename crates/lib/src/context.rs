//! The build context shared by every target in a run.
//!
//! [`BuildContext`] is a single mutable store created once per run. Targets
//! publish values with [`BuildContext::set`] and later targets read them with
//! [`BuildContext::get`]; this is how results flow between targets. A read of
//! a key that no upstream target published fails with
//! [`ContextError::MissingValue`]: the reader is missing a dependency
//! declaration.
//!
//! The context also owns the fixed inputs of the run (configuration, platform,
//! directories, deadline), the environment exported to leaf actions, the
//! per-target result cache used by the engine, and the logging sink.

use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::BuildConfig;
use crate::consts::CHANNEL_KEY;
use crate::placeholder::{DirKind, PlaceholderError, Resolver};
use crate::platform::Platform;
use crate::target::TargetResult;

/// Errors from reading context values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
  /// No target published the key.
  #[error("missing context value '{key}': no upstream target published it")]
  MissingValue { key: String },

  /// The key holds a value of another type.
  #[error("context value '{key}' is a {found}, expected {expected}")]
  WrongType {
    key: String,
    expected: &'static str,
    found: &'static str,
  },
}

/// Directories every run knows about, all derived from the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDirs {
  /// Repository root.
  pub root: PathBuf,
  /// Scratch directory for intermediate build output.
  pub build: PathBuf,
  /// Output directory for the selected configuration.
  pub output: PathBuf,
  /// Directory for package caches and downloaded packages.
  pub packages: PathBuf,
}

impl BuildDirs {
  pub fn from_root(root: impl Into<PathBuf>, configuration: &str) -> Self {
    let root = root.into();
    Self {
      build: root.join("build"),
      output: root.join("artifacts").join(configuration),
      packages: root.join("artifacts").join("packages"),
      root,
    }
  }

  pub fn get(&self, kind: DirKind) -> &Path {
    match kind {
      DirKind::Root => &self.root,
      DirKind::Build => &self.build,
      DirKind::Output => &self.output,
      DirKind::Packages => &self.packages,
    }
  }
}

struct StoredValue {
  value: Box<dyn Any + Send + Sync>,
  type_name: &'static str,
}

/// Mutable state shared by all targets during one run.
///
/// Not synchronized: the engine runs one target at a time and hands each body
/// an exclusive borrow.
pub struct BuildContext {
  configuration: String,
  channel: Option<String>,
  platform: Platform,
  dirs: BuildDirs,
  ci_build: bool,
  cache_time_limit: Duration,
  deadline: Option<Instant>,
  values: HashMap<String, StoredValue>,
  exported_env: BTreeMap<String, String>,
  results: HashMap<String, TargetResult>,
  current_target: Option<String>,
}

impl BuildContext {
  /// Create a context from the startup configuration.
  ///
  /// The deadline, if any, starts counting now. A configured channel is
  /// published under the `Channel` key.
  pub fn new(config: &BuildConfig) -> Self {
    let mut ctx = Self {
      configuration: config.configuration.clone(),
      channel: config.channel.clone(),
      platform: config.platform.clone(),
      dirs: BuildDirs::from_root(&config.root, &config.configuration),
      ci_build: config.ci_build,
      cache_time_limit: config.cache_time_limit,
      deadline: config.timeout.map(|timeout| Instant::now() + timeout),
      values: HashMap::new(),
      exported_env: BTreeMap::new(),
      results: HashMap::new(),
      current_target: None,
    };
    ctx.publish_inputs();
    ctx
  }

  /// A context with default inputs rooted at `root`, for embedding and tests.
  pub fn with_platform(root: impl Into<PathBuf>, configuration: &str, platform: Platform) -> Self {
    Self {
      configuration: configuration.to_string(),
      channel: None,
      platform,
      dirs: BuildDirs::from_root(root, configuration),
      ci_build: false,
      cache_time_limit: Duration::from_secs(crate::consts::DEFAULT_CACHE_TIME_LIMIT_HOURS * 3600),
      deadline: None,
      values: HashMap::new(),
      exported_env: BTreeMap::new(),
      results: HashMap::new(),
      current_target: None,
    }
  }

  fn publish_inputs(&mut self) {
    if let Some(channel) = self.channel.clone() {
      self.set(CHANNEL_KEY, channel);
    }
  }

  /// Forget every published value, exported variable and cached result.
  ///
  /// Fixed inputs are kept, so a long-lived host can start an independent run.
  pub fn reset(&mut self) {
    self.values.clear();
    self.exported_env.clear();
    self.results.clear();
    self.current_target = None;
    self.publish_inputs();
  }

  // === Values ===

  /// Publish `value` under `key`, replacing any previous value.
  pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
    let key = key.into();
    let previous = self.values.insert(
      key.clone(),
      StoredValue {
        value: Box::new(value),
        type_name: type_name::<T>(),
      },
    );
    debug!(
      target_name = self.current_target.as_deref().unwrap_or("-"),
      key = %key,
      overwritten = previous.is_some(),
      "context value set"
    );
  }

  /// Read the value stored under `key` as a `T`.
  pub fn get<T: Any>(&self, key: &str) -> Result<&T, ContextError> {
    let stored = self.values.get(key).ok_or_else(|| ContextError::MissingValue { key: key.to_string() })?;
    stored.value.downcast_ref::<T>().ok_or_else(|| ContextError::WrongType {
      key: key.to_string(),
      expected: type_name::<T>(),
      found: stored.type_name,
    })
  }

  /// Read a string value.
  pub fn get_str(&self, key: &str) -> Result<&str, ContextError> {
    self.get::<String>(key).map(String::as_str)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  /// Published keys, sorted.
  pub fn keys(&self) -> Vec<&str> {
    let mut keys: Vec<_> = self.values.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
  }

  // === Fixed inputs ===

  pub fn configuration(&self) -> &str {
    &self.configuration
  }

  pub fn channel(&self) -> Option<&str> {
    self.channel.as_deref()
  }

  pub fn platform(&self) -> &Platform {
    &self.platform
  }

  pub fn dirs(&self) -> &BuildDirs {
    &self.dirs
  }

  pub fn root(&self) -> &Path {
    &self.dirs.root
  }

  pub fn output_dir(&self) -> &Path {
    &self.dirs.output
  }

  pub fn ci_build(&self) -> bool {
    self.ci_build
  }

  pub fn cache_time_limit(&self) -> Duration {
    self.cache_time_limit
  }

  // === Deadline ===

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub fn set_deadline(&mut self, deadline: Option<Instant>) {
    self.deadline = deadline;
  }

  /// Time left before the deadline; `None` when the run has no deadline.
  pub fn remaining(&self) -> Option<Duration> {
    self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
  }

  pub fn deadline_exceeded(&self) -> bool {
    self.remaining().is_some_and(|left| left.is_zero())
  }

  // === Exported environment ===

  /// Set an environment variable for every command a later target runs.
  pub fn export_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.exported_env.insert(key.into(), value.into());
  }

  pub fn exported_env(&self) -> &BTreeMap<String, String> {
    &self.exported_env
  }

  // === Result cache ===

  /// The cached result of `target`, if it already ran against this context.
  pub fn result(&self, target: &str) -> Option<&TargetResult> {
    self.results.get(target)
  }

  pub(crate) fn record_result(&mut self, target: &str, result: TargetResult) {
    self.results.insert(target.to_string(), result);
  }

  pub(crate) fn enter_target(&mut self, target: &str) {
    self.current_target = Some(target.to_string());
  }

  pub(crate) fn leave_target(&mut self) {
    self.current_target = None;
  }

  /// Name of the target whose body is running, if any.
  pub fn current_target(&self) -> Option<&str> {
    self.current_target.as_deref()
  }

  // === Logging ===

  pub fn info(&self, message: impl fmt::Display) {
    info!(target_name = self.current_target().unwrap_or("-"), "{}", message);
  }

  pub fn verbose(&self, message: impl fmt::Display) {
    debug!(target_name = self.current_target().unwrap_or("-"), "{}", message);
  }

  pub fn warn(&self, message: impl fmt::Display) {
    warn!(target_name = self.current_target().unwrap_or("-"), "{}", message);
  }
}

impl fmt::Debug for BuildContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BuildContext")
      .field("configuration", &self.configuration)
      .field("platform", &self.platform)
      .field("dirs", &self.dirs)
      .field("keys", &self.keys())
      .field("results", &self.results)
      .finish_non_exhaustive()
  }
}

impl Resolver for BuildContext {
  fn resolve_context(&self, key: &str) -> Result<String, PlaceholderError> {
    Ok(self.get_str(key)?.to_string())
  }

  fn resolve_dir(&self, dir: DirKind) -> Result<String, PlaceholderError> {
    Ok(self.dirs.get(dir).to_string_lossy().into_owned())
  }

  fn resolve_configuration(&self) -> Result<String, PlaceholderError> {
    Ok(self.configuration.clone())
  }
}
