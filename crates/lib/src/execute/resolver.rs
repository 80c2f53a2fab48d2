//! Dependency resolution: expands a goal into an execution plan.

use std::collections::HashMap;

use tracing::debug;

use crate::target::{Target, TargetRegistry};

use super::types::{ExecutionPlan, ResolveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
  /// On the current traversal stack.
  InProgress,
  /// Fully expanded and appended to the plan.
  Done,
}

/// Resolves goals against a registry.
///
/// Depth-first, post-order: a target is appended after all its dependencies,
/// visited in declared order. Reaching a name that is still on the stack is a
/// cycle; reaching a finished name is a no-op, which keeps diamond
/// dependencies to a single appearance. The result is deterministic for a
/// given registry.
///
/// The walk keeps its own frame stack, so chain depth is bounded by memory
/// rather than by the thread's call stack.
pub struct DependencyResolver<'a> {
  registry: &'a TargetRegistry,
}

impl<'a> DependencyResolver<'a> {
  pub fn new(registry: &'a TargetRegistry) -> Self {
    Self { registry }
  }

  /// Build the plan for `goal`.
  ///
  /// # Errors
  ///
  /// - `UnknownTarget` if the goal or any name it reaches is not registered.
  /// - `CyclicDependency` with the names forming the cycle, first name repeated last.
  pub fn resolve(&self, goal: &str) -> Result<ExecutionPlan, ResolveError> {
    let mut walk = Walk::default();
    self.enter(goal, None, &mut walk)?;

    while let Some(frame) = walk.frames.last_mut() {
      let target = frame.target;
      let Some(dependency) = target.dependencies().get(frame.next) else {
        walk.frames.pop();
        walk.states.insert(target.name().to_string(), VisitState::Done);
        walk.plan.push(target.name().to_string());
        continue;
      };
      frame.next += 1;

      match walk.states.get(dependency.as_str()).copied() {
        Some(VisitState::Done) => {}
        Some(VisitState::InProgress) => return Err(walk.cycle_through(dependency)),
        None => self.enter(dependency, Some(target.name()), &mut walk)?,
      }
    }

    debug!(goal = %goal, targets = walk.plan.len(), "expanded goal");
    Ok(ExecutionPlan::new(goal, walk.plan))
  }

  fn enter(&self, name: &str, required_by: Option<&str>, walk: &mut Walk<'a>) -> Result<(), ResolveError> {
    let target = self.registry.lookup(name).map_err(|_| ResolveError::UnknownTarget {
      name: name.to_string(),
      required_by: required_by.map(str::to_string),
    })?;

    walk.states.insert(name.to_string(), VisitState::InProgress);
    walk.frames.push(Frame { target, next: 0 });
    Ok(())
  }
}

/// A target being expanded and the index of its next dependency.
struct Frame<'a> {
  target: &'a Target,
  next: usize,
}

#[derive(Default)]
struct Walk<'a> {
  states: HashMap<String, VisitState>,
  frames: Vec<Frame<'a>>,
  plan: Vec<String>,
}

impl Walk<'_> {
  /// The cycle closed by reaching `name` again.
  fn cycle_through(&self, name: &str) -> ResolveError {
    let start = self
      .frames
      .iter()
      .position(|frame| frame.target.name() == name)
      .unwrap_or(0);
    let mut path: Vec<String> = self.frames[start..]
      .iter()
      .map(|frame| frame.target.name().to_string())
      .collect();
    path.push(name.to_string());
    ResolveError::CyclicDependency { path }
  }
}
