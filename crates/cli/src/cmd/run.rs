//! Implementation of the default command: run a goal.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

use targetry_lib::context::BuildContext;
use targetry_lib::execute::{DependencyResolver, ExecutionEngine};

use super::{GlobalOpts, Workspace};
use crate::output::{Status, print_json, print_report, print_status};

/// Exit status when a target fails.
const EXIT_TARGET_FAILED: u8 = 1;

/// Resolve `goal` and run it.
///
/// Resolution errors are returned before any target runs. A failed target is
/// reported and turned into exit status 1.
pub fn cmd_run(opts: &GlobalOpts, goal: Option<&str>) -> Result<ExitCode> {
  let workspace = Workspace::load(opts)?;
  let goal = workspace.goal(goal)?;

  let mut ctx = BuildContext::new(&workspace.config);
  info!(
    configuration = %ctx.configuration(),
    output = %ctx.output_dir().display(),
    os = %ctx.platform(),
    "build context ready"
  );

  let plan = DependencyResolver::new(&workspace.registry).resolve(&goal)?;
  if !opts.output.is_json() {
    print_status(Status::Info, &format!("Running {} ({} targets)", goal, plan.len()));
  }

  let started = Instant::now();
  let report = ExecutionEngine::new(&workspace.registry).run(&plan, &mut ctx);

  if opts.output.is_json() {
    print_json(&report)?;
  } else {
    print_report(&report, started.elapsed());
  }

  Ok(if report.is_success() {
    ExitCode::SUCCESS
  } else {
    ExitCode::from(EXIT_TARGET_FAILED)
  })
}
