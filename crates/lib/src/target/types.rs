//! Target definitions and their outcomes.

use std::fmt;

use serde::Serialize;

use crate::context::BuildContext;
use crate::platform::PlatformConstraint;

/// The executable part of a target.
pub type TargetBody = Box<dyn Fn(&mut BuildContext) -> TargetResult + Send + Sync>;

/// Outcome of a single target.
///
/// Terminal: once produced for a target in a context, the engine caches it
/// and never runs the body again for that context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum TargetResult {
  /// The body completed.
  Success,
  /// The body reported failure, or aborted unexpectedly.
  Failed(String),
  /// The platform constraint was not met; the body never ran.
  Skipped(String),
}

impl TargetResult {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed(message.into())
  }

  pub fn skipped(reason: impl Into<String>) -> Self {
    Self::Skipped(reason.into())
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success)
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Self::Failed(_))
  }

  pub fn is_skipped(&self) -> bool {
    matches!(self, Self::Skipped(_))
  }

  /// Short status label: `success`, `failed` or `skipped`.
  pub fn status(&self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Failed(_) => "failed",
      Self::Skipped(_) => "skipped",
    }
  }
}

/// Lets bodies written with `?` return their `Result` directly.
impl<E: fmt::Display> From<Result<(), E>> for TargetResult {
  fn from(result: Result<(), E>) -> Self {
    match result {
      Ok(()) => Self::Success,
      Err(err) => Self::Failed(err.to_string()),
    }
  }
}

impl fmt::Display for TargetResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Success => write!(f, "success"),
      Self::Failed(message) => write!(f, "failed: {}", message),
      Self::Skipped(reason) => write!(f, "skipped: {}", reason),
    }
  }
}

/// A named build step.
///
/// Identity is the name. Dependencies are kept in declared order, which the
/// resolver uses as its tie-break between independent siblings.
pub struct Target {
  name: String,
  description: Option<String>,
  dependencies: Vec<String>,
  platform: Option<PlatformConstraint>,
  body: TargetBody,
}

impl Target {
  pub fn new<F>(name: impl Into<String>, body: F) -> Self
  where
    F: Fn(&mut BuildContext) -> TargetResult + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      description: None,
      dependencies: Vec::new(),
      platform: None,
      body: Box::new(body),
    }
  }

  /// A target whose body does nothing; it exists to group its dependencies.
  pub fn aggregate(name: impl Into<String>) -> Self {
    Self::new(name, |_| TargetResult::Success)
  }

  pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dependencies.extend(dependencies.into_iter().map(Into::into));
    self
  }

  pub fn with_platform(mut self, constraint: PlatformConstraint) -> Self {
    self.platform = Some(constraint);
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn dependencies(&self) -> &[String] {
    &self.dependencies
  }

  pub fn platform(&self) -> Option<&PlatformConstraint> {
    self.platform.as_ref()
  }

  /// Invoke the body against the shared context.
  pub fn run(&self, ctx: &mut BuildContext) -> TargetResult {
    (self.body)(ctx)
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("name", &self.name)
      .field("dependencies", &self.dependencies)
      .field("platform", &self.platform)
      .finish_non_exhaustive()
  }
}
