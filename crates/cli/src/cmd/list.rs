//! Implementation of the `targetry list` command.

use std::process::ExitCode;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use super::{GlobalOpts, Workspace};
use crate::output::{Status, print_json, print_stat, print_status};

#[derive(Serialize)]
struct TargetSummary<'a> {
  name: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  description: Option<&'a str>,
  dependencies: &'a [String],
  #[serde(skip_serializing_if = "Option::is_none")]
  platform: Option<String>,
  default: bool,
}

pub fn cmd_list(opts: &GlobalOpts) -> Result<ExitCode> {
  let workspace = Workspace::load(opts)?;
  let default_goal = workspace.default_goal.as_deref();

  let summaries: Vec<TargetSummary<'_>> = workspace
    .registry
    .iter()
    .map(|target| TargetSummary {
      name: target.name(),
      description: target.description(),
      dependencies: target.dependencies(),
      platform: target.platform().map(ToString::to_string),
      default: default_goal == Some(target.name()),
    })
    .collect();

  if opts.output.is_json() {
    print_json(&summaries)?;
    return Ok(ExitCode::SUCCESS);
  }

  print_status(
    Status::Info,
    &format!("{} targets in {}", summaries.len(), workspace.manifest_path.display()),
  );
  for summary in &summaries {
    println!();
    let marker = if summary.default { " (default)" } else { "" };
    println!(
      "{}{}",
      summary.name.if_supports_color(Stream::Stdout, |s| s.bold()),
      marker
    );
    if let Some(description) = summary.description {
      print_stat("description", description);
    }
    if !summary.dependencies.is_empty() {
      print_stat("depends on", &summary.dependencies.join(", "));
    }
    if let Some(platform) = &summary.platform {
      print_stat("platform", platform);
    }
  }

  Ok(ExitCode::SUCCESS)
}
