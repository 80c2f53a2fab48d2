//! The execution engine: runs a resolved plan against a build context.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::context::BuildContext;
use crate::platform::is_satisfied;
use crate::target::{TargetRegistry, TargetResult};

use super::types::{ExecutionPlan, FailedTarget, RunReport, TargetOutcome};

/// Runs plans one target at a time.
///
/// Results are cached in the [`BuildContext`], so a target runs at most once
/// per context even across several `run` calls. The first failure stops the
/// run; platform skips do not.
pub struct ExecutionEngine<'a> {
  registry: &'a TargetRegistry,
}

impl<'a> ExecutionEngine<'a> {
  pub fn new(registry: &'a TargetRegistry) -> Self {
    Self { registry }
  }

  /// Execute `plan` in order against `ctx`.
  ///
  /// Returns every outcome produced before the run stopped. A failed target,
  /// including a cached failure from an earlier run, ends the run and is
  /// named in [`RunReport::failure`].
  pub fn run(&self, plan: &ExecutionPlan, ctx: &mut BuildContext) -> RunReport {
    info!(goal = %plan.goal(), steps = plan.len(), "starting run");
    let run_started = Instant::now();
    let mut report = RunReport::new(plan.goal());

    for name in plan.iter() {
      let started = Instant::now();

      let (result, cached) = match ctx.result(name) {
        Some(result) => {
          debug!(target_name = %name, result = %result, "reusing cached result");
          (result.clone(), true)
        }
        None => {
          let result = self.execute(name, ctx);
          ctx.record_result(name, result.clone());
          (result, false)
        }
      };

      let failure = match &result {
        TargetResult::Failed(message) => Some(FailedTarget {
          name: name.to_string(),
          message: message.clone(),
        }),
        _ => None,
      };

      report.outcomes.push(TargetOutcome {
        name: name.to_string(),
        result,
        cached,
        elapsed_ms: elapsed_ms(started),
      });

      if let Some(failure) = failure {
        error!(target_name = %failure.name, message = %failure.message, "target failed, stopping run");
        report.failure = Some(failure);
        break;
      }
    }

    info!(
      goal = %plan.goal(),
      success = report.is_success(),
      executed = report.executed(),
      skipped = report.skipped().len(),
      elapsed_ms = elapsed_ms(run_started),
      "run complete"
    );

    report
  }

  /// Gate and run a single target that has no cached result.
  fn execute(&self, name: &str, ctx: &mut BuildContext) -> TargetResult {
    let target = match self.registry.lookup(name) {
      Ok(target) => target,
      Err(err) => return TargetResult::failed(err.to_string()),
    };

    if !is_satisfied(target.platform(), ctx.platform()) {
      let reason = match target.platform() {
        Some(constraint) => format!("requires {}, host is {}", constraint, ctx.platform()),
        None => format!("not supported on {}", ctx.platform()),
      };
      info!(target_name = %name, reason = %reason, "skipping target");
      return TargetResult::Skipped(reason);
    }

    if ctx.deadline_exceeded() {
      warn!(target_name = %name, "deadline exceeded before target started");
      return TargetResult::failed("deadline exceeded before target started");
    }

    info!(target_name = %name, "starting target");
    let started = Instant::now();

    ctx.enter_target(name);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| target.run(ctx)));
    ctx.leave_target();

    let result = outcome.unwrap_or_else(|payload| {
      TargetResult::failed(format!("target panicked: {}", panic_message(payload.as_ref())))
    });

    info!(
      target_name = %name,
      status = result.status(),
      elapsed_ms = elapsed_ms(started),
      "finished target"
    );
    result
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic payload".to_string()
  }
}

fn elapsed_ms(started: Instant) -> u64 {
  u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
