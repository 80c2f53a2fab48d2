//! Types for plan resolution and execution.

use serde::Serialize;
use thiserror::Error;

use crate::target::TargetResult;

/// Errors that abort a run before any target executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// The goal, or a name reachable from it, is not registered.
  #[error(
    "unknown target '{name}'{}",
    .required_by.as_ref().map(|by| format!(" (required by '{by}')")).unwrap_or_default()
  )]
  UnknownTarget { name: String, required_by: Option<String> },

  /// The dependency graph reachable from the goal contains a cycle.
  /// `path` starts and ends with the same name.
  #[error("dependency cycle detected: {}", .path.join(" -> "))]
  CyclicDependency { path: Vec<String> },
}

/// Ordered, duplicate-free list of targets needed to satisfy a goal.
///
/// Every target appears after all of its transitive dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
  goal: String,
  steps: Vec<String>,
}

impl ExecutionPlan {
  pub(crate) fn new(goal: impl Into<String>, steps: Vec<String>) -> Self {
    Self {
      goal: goal.into(),
      steps,
    }
  }

  pub fn goal(&self) -> &str {
    &self.goal
  }

  pub fn steps(&self) -> &[String] {
    &self.steps
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.steps.iter().any(|step| step == name)
  }

  /// Position of `name` in the plan.
  pub fn position(&self, name: &str) -> Option<usize> {
    self.steps.iter().position(|step| step == name)
  }
}

/// What happened to one target during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
  pub name: String,
  pub result: TargetResult,
  /// The result came from an earlier run against the same context.
  pub cached: bool,
  pub elapsed_ms: u64,
}

/// The first failing target of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTarget {
  pub name: String,
  pub message: String,
}

/// Aggregated result of running a plan.
///
/// Holds every outcome produced before the run stopped, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub goal: String,
  pub outcomes: Vec<TargetOutcome>,
  pub failure: Option<FailedTarget>,
}

impl RunReport {
  pub fn new(goal: impl Into<String>) -> Self {
    Self {
      goal: goal.into(),
      ..Self::default()
    }
  }

  /// True when no target failed. Skips do not count as failures.
  pub fn is_success(&self) -> bool {
    self.failure.is_none()
  }

  pub fn outcome(&self, name: &str) -> Option<&TargetOutcome> {
    self.outcomes.iter().find(|outcome| outcome.name == name)
  }

  pub fn result(&self, name: &str) -> Option<&TargetResult> {
    self.outcome(name).map(|outcome| &outcome.result)
  }

  /// Names of targets that succeeded, in execution order.
  pub fn succeeded(&self) -> Vec<&str> {
    self.names_where(TargetResult::is_success)
  }

  /// Names of targets skipped for platform reasons, in execution order.
  pub fn skipped(&self) -> Vec<&str> {
    self.names_where(TargetResult::is_skipped)
  }

  /// Number of bodies actually invoked in this run (cache hits excluded).
  pub fn executed(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|outcome| !outcome.cached && !outcome.result.is_skipped())
      .count()
  }

  fn names_where(&self, predicate: impl Fn(&TargetResult) -> bool) -> Vec<&str> {
    self
      .outcomes
      .iter()
      .filter(|outcome| predicate(&outcome.result))
      .map(|outcome| outcome.name.as_str())
      .collect()
  }
}
