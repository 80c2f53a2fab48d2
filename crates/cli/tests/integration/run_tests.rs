//! End-to-end runs of manifests through the targetry binary.
//!
//! Manifests shell out to `/bin/sh`, so these tests are Unix-only.

#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

const FAILING_MANIFEST: &str = r#"
[targets.restore]
cmd = ["/bin/sh", "-c", "touch restored"]

[targets.compile]
dependencies = ["restore"]
cmd = ["/bin/sh", "-c", "echo 'error CS1002: ; expected' >&2; exit 1"]

[targets.test]
dependencies = ["compile"]
cmd = ["/bin/sh", "-c", "touch tested"]
"#;

#[test]
fn default_goal_runs_full_plan() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("publish succeeded"))
    .stderr(predicate::str::contains("check-windows-prereqs skipped: requires windows, host is ubuntu 16.04"))
    .stderr(predicate::str::contains("Building Debug"))
    .stderr(predicate::str::contains("Published 2.0.0"));

  assert_eq!(env.read_file("artifacts/sdk.txt").trim(), "sdk-2.0.0-Debug");
}

#[test]
fn configuration_comes_from_environment() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .arg("compile")
    .env("TARGETRY_CONFIGURATION", "Release")
    .assert()
    .success()
    .stderr(predicate::str::contains("Building Release"));

  assert_eq!(env.read_file("artifacts/sdk.txt").trim(), "sdk-2.0.0-Release");
}

#[test]
fn run_subcommand_accepts_goal() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .args(["run", "version"])
    .assert()
    .success()
    .stdout(predicate::str::contains("version succeeded"));
}

#[test]
fn failing_target_exits_one_and_stops() {
  let env = TestEnv::with_manifest(FAILING_MANIFEST);

  env
    .targetry_cmd()
    .arg("test")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("test failed at compile"))
    .stderr(predicate::str::contains("error CS1002"));

  assert!(env.root_path().join("restored").exists());
  assert!(!env.root_path().join("tested").exists());
}

#[test]
fn windows_host_fails_on_windows_prerequisites() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .env("TARGETRY_PLATFORM", "windows")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Visual Studio is not installed"));
}

#[test]
fn json_report_lists_outcomes() {
  let env = TestEnv::with_manifest(FAILING_MANIFEST);

  let output = env
    .targetry_cmd()
    .args(["--output", "json", "test"])
    .output()
    .unwrap();
  assert_eq!(output.status.code(), Some(1));

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["goal"], "test");
  assert_eq!(report["outcomes"][0]["name"], "restore");
  assert_eq!(report["outcomes"][0]["result"]["status"], "success");
  assert_eq!(report["outcomes"][1]["result"]["status"], "failed");
  assert_eq!(report["outcomes"].as_array().unwrap().len(), 2);
  assert_eq!(report["failure"]["name"], "compile");
}

#[test]
fn unknown_goal_exits_two_before_running() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .arg("package")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("unknown target 'package'"));

  assert!(!env.root_path().join("artifacts").exists());
}

#[test]
fn cycle_exits_two() {
  let env = TestEnv::with_manifest(
    r#"
    [targets.A]
    dependencies = ["B"]
    [targets.B]
    dependencies = ["C"]
    [targets.C]
    dependencies = ["A"]
    "#,
  );

  env
    .targetry_cmd()
    .arg("A")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("dependency cycle detected: A -> B -> C -> A"));
}

#[test]
fn timeout_kills_long_running_target() {
  let env = TestEnv::with_manifest(
    r#"
    [targets.hang]
    cmd = ["/bin/sh", "-c", "sleep 30"]
    "#,
  );

  env
    .targetry_cmd()
    .args(["--timeout", "300ms", "hang"])
    .timeout(std::time::Duration::from_secs(20))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("deadline exceeded"));
}

#[test]
fn plan_lists_targets_in_order() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .args(["plan", "prepare"])
    .assert()
    .success()
    .stdout(predicate::str::contains("1. init"))
    .stdout(predicate::str::contains("2. version"))
    .stdout(predicate::str::contains("3. check-windows-prereqs"))
    .stdout(predicate::str::contains("[windows]"))
    .stdout(predicate::str::contains("5. prepare"));

  assert!(!env.root_path().join("artifacts").exists());
}

#[test]
fn plan_renders_dot_graph() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .args(["plan", "--dot"])
    .assert()
    .success()
    .stdout(predicate::str::starts_with("digraph {"))
    .stdout(predicate::str::contains("label = \"publish\""));
}

#[test]
fn list_shows_default_and_constraints() {
  let env = TestEnv::from_fixture("sdk-build.toml");

  env
    .targetry_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("publish (default)"))
    .stdout(predicate::str::contains("platform: windows"))
    .stdout(predicate::str::contains("Verify prerequisites for the host"));
}

#[test]
fn explicit_manifest_file() {
  let env = TestEnv::with_manifest("[targets.unused]");
  env.write_file("build/other.toml", "[targets.only-here]\nmessage = \"from other manifest\"");

  env
    .targetry_cmd()
    .args(["-f", "build/other.toml", "only-here"])
    .assert()
    .success()
    .stderr(predicate::str::contains("from other manifest"));
}
