use targetry_lib::context::ContextError;
use targetry_lib::execute::{DependencyResolver, ExecutionEngine, ResolveError, run_goal};
use targetry_lib::platform::PlatformConstraint;
use targetry_lib::platform::os::OsFamily;
use targetry_lib::target::{Target, TargetRegistry, TargetResult};

use super::common::{Journal, recording, registry, ubuntu_context};

#[derive(Debug, Clone, PartialEq)]
struct BuildVersion {
  major: u32,
  minor: u32,
  patch: u32,
  commit_count: u32,
}

impl BuildVersion {
  fn nuget_version(&self) -> String {
    format!("{}.{}.{}-{:06}", self.major, self.minor, self.patch, self.commit_count)
  }
}

#[test]
fn every_plan_is_topologically_valid() {
  let journal = Journal::default();
  let registry = registry(
    &[
      ("init", &[]),
      ("restore", &["init"]),
      ("compile", &["init", "restore"]),
      ("test", &["compile", "restore"]),
      ("package", &["compile"]),
      ("publish", &["package", "test", "init"]),
    ],
    &journal,
  );

  let resolver = DependencyResolver::new(&registry);
  for goal in ["init", "restore", "compile", "test", "package", "publish"] {
    let plan = resolver.resolve(goal).unwrap();
    assert_eq!(plan.steps().last().map(String::as_str), Some(goal));
    for name in plan.iter() {
      let position = plan.position(name).unwrap();
      for dependency in registry.lookup(name).unwrap().dependencies() {
        let dep_position = plan.position(dependency).unwrap();
        assert!(dep_position < position, "{dependency} must run before {name} in {goal}");
      }
    }
  }
}

#[test]
fn diamond_runs_shared_dependency_once() {
  let journal = Journal::default();
  let registry = registry(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])], &journal);

  let mut ctx = ubuntu_context();
  let report = run_goal(&registry, "a", &mut ctx).unwrap();

  assert!(report.is_success());
  assert_eq!(journal.entries(), ["d", "b", "c", "a"]);
}

#[test]
fn cycle_is_reported_with_its_path() {
  let journal = Journal::default();
  let registry = registry(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])], &journal);

  let mut ctx = ubuntu_context();
  let err = run_goal(&registry, "A", &mut ctx).unwrap_err();

  assert_eq!(
    err,
    ResolveError::CyclicDependency {
      path: vec!["A".into(), "B".into(), "C".into(), "A".into()]
    }
  );
  assert_eq!(err.to_string(), "dependency cycle detected: A -> B -> C -> A");
  assert!(journal.entries().is_empty());
}

#[test]
fn targets_run_once_per_context() {
  let journal = Journal::default();
  let registry = registry(&[("init", &[]), ("compile", &["init"]), ("test", &["init"])], &journal);

  let mut ctx = ubuntu_context();
  let first = run_goal(&registry, "compile", &mut ctx).unwrap();
  let second = run_goal(&registry, "test", &mut ctx).unwrap();
  let third = run_goal(&registry, "compile", &mut ctx).unwrap();

  assert_eq!(journal.entries(), ["init", "compile", "test"]);
  assert!(first.outcomes.iter().all(|outcome| !outcome.cached));
  assert!(second.outcome("init").unwrap().cached);
  assert!(!second.outcome("test").unwrap().cached);
  assert!(third.outcomes.iter().all(|outcome| outcome.cached));
  assert_eq!(third.executed(), 0);
}

#[test]
fn reset_context_runs_targets_again() {
  let journal = Journal::default();
  let registry = registry(&[("init", &[])], &journal);

  let mut ctx = ubuntu_context();
  run_goal(&registry, "init", &mut ctx).unwrap();
  ctx.reset();
  run_goal(&registry, "init", &mut ctx).unwrap();

  assert_eq!(journal.entries(), ["init", "init"]);
}

#[test]
fn first_failure_stops_the_run() {
  let journal = Journal::default();
  let mut registry = TargetRegistry::new();
  registry
    .register_all([
      recording("A", &[], &journal, TargetResult::Success),
      recording("B", &[], &journal, TargetResult::failed("cmake exited with code 1")),
      recording("C", &[], &journal, TargetResult::Success),
      Target::aggregate("all").depends_on(["A", "B", "C"]),
    ])
    .unwrap();

  let mut ctx = ubuntu_context();
  let report = run_goal(&registry, "all", &mut ctx).unwrap();

  assert_eq!(journal.entries(), ["A", "B"]);
  assert!(!report.is_success());
  let failure = report.failure.as_ref().unwrap();
  assert_eq!(failure.name, "B");
  assert_eq!(failure.message, "cmake exited with code 1");
  assert_eq!(report.succeeded(), ["A"]);
  assert!(report.outcome("C").is_none());
  assert!(ctx.result("C").is_none());
}

#[test]
fn skipped_target_does_not_block_dependents() {
  let journal = Journal::default();
  let mut registry = TargetRegistry::new();
  registry
    .register_all([
      recording("check-windows-prereqs", &[], &journal, TargetResult::Success)
        .with_platform(PlatformConstraint::new([OsFamily::Windows])),
      recording("check-ubuntu-prereqs", &[], &journal, TargetResult::Success)
        .with_platform(PlatformConstraint::new([OsFamily::Ubuntu])),
      recording(
        "prepare",
        &["check-windows-prereqs", "check-ubuntu-prereqs"],
        &journal,
        TargetResult::Success,
      ),
    ])
    .unwrap();

  let mut ctx = ubuntu_context();
  let report = run_goal(&registry, "prepare", &mut ctx).unwrap();

  assert!(report.is_success());
  assert_eq!(journal.entries(), ["check-ubuntu-prereqs", "prepare"]);
  assert_eq!(report.skipped(), ["check-windows-prereqs"]);
  assert!(report.result("check-windows-prereqs").unwrap().is_skipped());
}

#[test]
fn unknown_reference_fails_before_any_body_runs() {
  let journal = Journal::default();
  let registry = registry(&[("init", &[]), ("publish", &["init", "sign"])], &journal);

  let mut ctx = ubuntu_context();
  let err = run_goal(&registry, "publish", &mut ctx).unwrap_err();

  assert_eq!(
    err,
    ResolveError::UnknownTarget {
      name: "sign".into(),
      required_by: Some("publish".into()),
    }
  );
  assert!(journal.entries().is_empty());
  assert!(ctx.result("init").is_none());
}

#[test]
fn unknown_goal_is_a_resolution_error() {
  let registry = TargetRegistry::new();
  let mut ctx = ubuntu_context();

  let err = run_goal(&registry, "publish", &mut ctx).unwrap_err();

  assert_eq!(err.to_string(), "unknown target 'publish'");
}

#[test]
fn typed_values_flow_to_downstream_targets() {
  let mut registry = TargetRegistry::new();
  registry
    .register_all([
      Target::new("version", |ctx| {
        ctx.set(
          "BuildVersion",
          BuildVersion {
            major: 2,
            minor: 0,
            patch: 0,
            commit_count: 4211,
          },
        );
        TargetResult::Success
      }),
      Target::new("package", |ctx| {
        let version = match ctx.get::<BuildVersion>("BuildVersion") {
          Ok(version) => version.nuget_version(),
          Err(err) => return TargetResult::failed(err.to_string()),
        };
        ctx.set("PackageName", format!("dotnet-sdk.{version}.nupkg"));
        TargetResult::Success
      })
      .depends_on(["version"]),
    ])
    .unwrap();

  let mut ctx = ubuntu_context();
  let report = run_goal(&registry, "package", &mut ctx).unwrap();

  assert!(report.is_success());
  assert_eq!(ctx.get_str("PackageName").unwrap(), "dotnet-sdk.2.0.0-004211.nupkg");
}

#[test]
fn reading_an_unpublished_key_fails_the_reader() {
  let mut registry = TargetRegistry::new();
  registry
    .register(Target::new("package", |ctx| match ctx.get::<String>("CommitHash") {
      Ok(_) => TargetResult::Success,
      Err(err) => TargetResult::failed(err.to_string()),
    }))
    .unwrap();

  let mut ctx = ubuntu_context();
  let report = run_goal(&registry, "package", &mut ctx).unwrap();

  let expected = ContextError::MissingValue {
    key: "CommitHash".into(),
  };
  assert_eq!(report.failure.unwrap().message, expected.to_string());
}

#[test]
fn engine_runs_a_prepared_plan() {
  let journal = Journal::default();
  let registry = registry(&[("init", &[]), ("compile", &["init"])], &journal);
  let plan = DependencyResolver::new(&registry).resolve("compile").unwrap();

  let mut ctx = ubuntu_context();
  let report = ExecutionEngine::new(&registry).run(&plan, &mut ctx);

  assert_eq!(report.goal, "compile");
  assert_eq!(report.succeeded(), ["init", "compile"]);
}
