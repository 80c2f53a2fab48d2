//! Implementation of the `targetry plan` command.
//!
//! Resolves a goal without running anything and prints the ordered plan, or
//! its dependency graph in Graphviz DOT format.

use std::process::ExitCode;

use anyhow::Result;

use targetry_lib::execute::{DependencyResolver, to_dot};

use super::{GlobalOpts, Workspace};
use crate::output::{ARROW, Status, print_json, print_status};

pub fn cmd_plan(opts: &GlobalOpts, goal: Option<&str>, dot: bool) -> Result<ExitCode> {
  let workspace = Workspace::load(opts)?;
  let goal = workspace.goal(goal)?;
  let registry = &workspace.registry;

  let plan = DependencyResolver::new(registry).resolve(&goal)?;

  if dot {
    print!("{}", to_dot(&plan, registry));
    return Ok(ExitCode::SUCCESS);
  }
  if opts.output.is_json() {
    print_json(&plan)?;
    return Ok(ExitCode::SUCCESS);
  }

  print_status(Status::Info, &format!("Plan for {} ({} targets)", goal, plan.len()));
  for (index, name) in plan.iter().enumerate() {
    let target = registry.lookup(name)?;
    let mut line = format!("{:>3}. {}", index + 1, name);
    if !target.dependencies().is_empty() {
      line.push_str(&format!(" {} {}", ARROW, target.dependencies().join(", ")));
    }
    if let Some(constraint) = target.platform() {
      line.push_str(&format!(" [{}]", constraint));
    }
    println!("{}", line);
  }

  Ok(ExitCode::SUCCESS)
}
