//! Plan resolution and execution.
//!
//! A run has two phases:
//! - [`DependencyResolver`] expands a goal into an [`ExecutionPlan`], failing
//!   before anything runs if a name is unknown or the graph has a cycle.
//! - [`ExecutionEngine`] walks the plan against a
//!   [`BuildContext`](crate::context::BuildContext), gating each target on the
//!   host platform and stopping at the first failure.

pub mod engine;
pub mod graph;
pub mod resolver;
pub mod types;

use tracing::info;

use crate::context::BuildContext;
use crate::target::TargetRegistry;

pub use engine::ExecutionEngine;
pub use graph::{plan_graph, to_dot};
pub use resolver::DependencyResolver;
pub use types::{ExecutionPlan, FailedTarget, ResolveError, RunReport, TargetOutcome};

/// Resolve `goal` and run it against `ctx`.
///
/// Resolution errors are returned before any body executes. Target failures
/// are reported in the [`RunReport`].
pub fn run_goal(registry: &TargetRegistry, goal: &str, ctx: &mut BuildContext) -> Result<RunReport, ResolveError> {
  let plan = DependencyResolver::new(registry).resolve(goal)?;
  info!(goal = %goal, plan = ?plan.steps(), "resolved plan");
  Ok(ExecutionEngine::new(registry).run(&plan, ctx))
}
