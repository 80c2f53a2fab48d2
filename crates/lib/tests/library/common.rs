use std::sync::{Arc, Mutex};

use targetry_lib::context::BuildContext;
use targetry_lib::platform::Platform;
use targetry_lib::platform::os::OsFamily;
use targetry_lib::target::{Target, TargetRegistry, TargetResult};

/// Names of target bodies in the order they were invoked.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
  pub fn entries(&self) -> Vec<String> {
    self.0.lock().unwrap().clone()
  }

  fn record(&self, name: &str) {
    self.0.lock().unwrap().push(name.to_string());
  }
}

/// A target that records its invocation and returns `result`.
pub fn recording(name: &str, deps: &[&str], journal: &Journal, result: TargetResult) -> Target {
  let journal = journal.clone();
  let own_name = name.to_string();
  Target::new(name, move |_| {
    journal.record(&own_name);
    result.clone()
  })
  .depends_on(deps.iter().copied())
}

/// A registry of succeeding recording targets, one per `(name, dependencies)` edge list entry.
pub fn registry(edges: &[(&str, &[&str])], journal: &Journal) -> TargetRegistry {
  let mut registry = TargetRegistry::new();
  for (name, deps) in edges {
    registry
      .register(recording(name, deps, journal, TargetResult::Success))
      .unwrap();
  }
  registry
}

pub fn ubuntu_context() -> BuildContext {
  BuildContext::with_platform("/repo", "Debug", Platform::new(OsFamily::Ubuntu, Some("16.04")))
}
