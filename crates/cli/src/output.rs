//! Terminal rendering for targetry.
//!
//! Every human-readable line is a [`Status`] marker followed by a message.
//! Failures and skips go to stderr so stdout carries only what succeeded;
//! `--output json` replaces all of it with one JSON document on stdout.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use targetry_lib::execute::{RunReport, TargetOutcome};
use targetry_lib::target::TargetResult;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Separates a target from its dependencies in plan listings.
pub const ARROW: &str = "→";

/// Kind of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Info,
  Success,
  /// Result reused from earlier in the same run.
  Cached,
  Skipped,
  Failed,
}

impl Status {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Info => "•",
      Self::Success => "✓",
      Self::Cached => "↺",
      Self::Skipped => "⚠",
      Self::Failed => "✗",
    }
  }

  fn on_stderr(self) -> bool {
    matches!(self, Self::Skipped | Self::Failed)
  }

  fn of(outcome: &TargetOutcome) -> Self {
    if outcome.cached {
      return Self::Cached;
    }
    match outcome.result {
      TargetResult::Success => Self::Success,
      TargetResult::Skipped(_) => Self::Skipped,
      TargetResult::Failed(_) => Self::Failed,
    }
  }
}

/// Print `message` behind the marker for `status`.
pub fn print_status(status: Status, message: &str) {
  let stream = if status.on_stderr() { Stream::Stderr } else { Stream::Stdout };
  let symbol = status.symbol();
  let symbol = symbol.if_supports_color(stream, |s| match status {
    Status::Info => s.blue().to_string(),
    Status::Success => s.green().to_string(),
    Status::Cached => s.cyan().to_string(),
    Status::Skipped => s.yellow().to_string(),
    Status::Failed => s.red().to_string(),
  });
  let message = message.if_supports_color(stream, |s| match status {
    Status::Cached => s.dimmed().to_string(),
    Status::Skipped => s.yellow().to_string(),
    Status::Failed => s.red().to_string(),
    Status::Info | Status::Success => s.to_string(),
  });

  if status.on_stderr() {
    eprintln!("{symbol} {message}");
  } else {
    println!("{symbol} {message}");
  }
}

/// Indented `label: value` line under a heading.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}

/// Compact wall-clock time: `850ms`, `4.2s`, `3m07s`.
pub fn format_elapsed(elapsed: Duration) -> String {
  let millis = elapsed.as_millis();
  match millis {
    0..=999 => format!("{millis}ms"),
    1_000..=59_999 => format!("{}.{}s", millis / 1_000, millis % 1_000 / 100),
    _ => {
      let secs = elapsed.as_secs();
      format!("{}m{:02}s", secs / 60, secs % 60)
    }
  }
}

fn outcome_line(outcome: &TargetOutcome) -> String {
  let name = &outcome.name;
  if outcome.cached {
    return format!("{name} (already {})", outcome.result.status());
  }
  match &outcome.result {
    TargetResult::Success => format!(
      "{name} ({})",
      format_elapsed(Duration::from_millis(outcome.elapsed_ms))
    ),
    TargetResult::Skipped(reason) => format!("{name} skipped: {reason}"),
    TargetResult::Failed(message) => format!("{name} failed: {message}"),
  }
}

fn summary_line(report: &RunReport, elapsed: Duration) -> (Status, String) {
  match &report.failure {
    None => (
      Status::Success,
      format!(
        "{} succeeded in {} ({} run, {} skipped)",
        report.goal,
        format_elapsed(elapsed),
        report.executed(),
        report.skipped().len()
      ),
    ),
    Some(failure) => (
      Status::Failed,
      format!("{} failed at {}: {}", report.goal, failure.name, failure.message),
    ),
  }
}

/// One line per target in run order, then the overall verdict.
pub fn print_report(report: &RunReport, elapsed: Duration) {
  for outcome in &report.outcomes {
    print_status(Status::of(outcome), &outcome_line(outcome));
  }

  println!();
  let (status, line) = summary_line(report, elapsed);
  print_status(status, &line);
}
