use std::fs;
use std::path::Path;

use tempfile::TempDir;

use targetry_lib::config::BuildConfig;
use targetry_lib::consts::{CACHE_STAMP_FILE, MANIFEST_FILE};
use targetry_lib::context::BuildContext;
use targetry_lib::execute::run_goal;
use targetry_lib::manifest::{ManifestError, TargetsManifest};

fn write_manifest(dir: &Path, content: &str) -> std::path::PathBuf {
  let path = dir.join(MANIFEST_FILE);
  fs::write(&path, content).unwrap();
  path
}

fn context(root: &Path, vars: &'static [(&'static str, &'static str)]) -> BuildContext {
  let config = BuildConfig::from_lookup(root, move |key: &str| {
    vars
      .iter()
      .find(|(name, _)| *name == key)
      .map(|(_, value)| value.to_string())
  })
  .unwrap();
  BuildContext::new(&config)
}

#[test]
fn missing_manifest_is_a_read_error() {
  let temp_dir = TempDir::new().unwrap();

  let err = TargetsManifest::load(&temp_dir.path().join(MANIFEST_FILE)).unwrap_err();

  assert!(matches!(err, ManifestError::Read { .. }));
}

#[test]
fn unsupported_platform_target_fails_the_run() {
  let temp_dir = TempDir::new().unwrap();
  let path = write_manifest(
    temp_dir.path(),
    r#"
    default = "package"

    [targets.init]
    message = "Building $${configuration}"

    [targets.package]
    dependencies = ["init"]
    fail = "packaging for $${ctx:Channel} is not supported"
    "#,
  );

  let registry = TargetsManifest::load(&path).unwrap().into_registry().unwrap();
  let mut ctx = context(
    temp_dir.path(),
    &[("TARGETRY_CHANNEL", "preview"), ("TARGETRY_PLATFORM", "ubuntu:16.04")],
  );
  let report = run_goal(&registry, "package", &mut ctx).unwrap();

  assert_eq!(report.succeeded(), ["init"]);
  let failure = report.failure.unwrap();
  assert_eq!(failure.name, "package");
  assert_eq!(failure.message, "packaging for preview is not supported");
}

#[test]
fn platform_gated_manifest_targets_skip() {
  let temp_dir = TempDir::new().unwrap();
  let path = write_manifest(
    temp_dir.path(),
    r#"
    [targets.check-centos]
    platform = { families = ["centos"] }
    fail = "centos prerequisites missing"

    [targets.check-old-ubuntu]
    platform = { families = ["ubuntu"], version = { family = "ubuntu", exact = "14.04" } }
    fail = "ubuntu 14.04 prerequisites missing"

    [targets.prepare]
    dependencies = ["check-centos", "check-old-ubuntu"]
    set = { Prepared = "yes" }
    "#,
  );

  let registry = TargetsManifest::load(&path).unwrap().into_registry().unwrap();
  let mut ctx = context(temp_dir.path(), &[("TARGETRY_PLATFORM", "ubuntu:16.04")]);
  let report = run_goal(&registry, "prepare", &mut ctx).unwrap();

  assert!(report.is_success());
  assert_eq!(report.skipped(), ["check-centos", "check-old-ubuntu"]);
  assert_eq!(ctx.get_str("Prepared").unwrap(), "yes");
}

#[cfg(unix)]
#[test]
fn captured_output_feeds_later_commands() {
  let temp_dir = TempDir::new().unwrap();
  let path = write_manifest(
    temp_dir.path(),
    r#"
    [targets.version]
    cmd = ["/bin/sh", "-c", "echo 4211"]
    capture = "CommitCount"

    [targets.env]
    dependencies = ["version"]
    export = { BUILD_NUMBER = "$${ctx:CommitCount}" }

    [targets.package]
    dependencies = ["env"]
    cmd = ["/bin/sh", "-c", "echo \"$BUILD_NUMBER-$STAGE\" > $${dir:root}/build-number.txt"]
    env = { STAGE = "stage2" }
    "#,
  );

  let registry = TargetsManifest::load(&path).unwrap().into_registry().unwrap();
  let mut ctx = context(temp_dir.path(), &[]);
  let report = run_goal(&registry, "package", &mut ctx).unwrap();

  assert!(report.is_success(), "{:?}", report.failure);
  assert_eq!(ctx.get_str("CommitCount").unwrap(), "4211");
  let written = fs::read_to_string(temp_dir.path().join("build-number.txt")).unwrap();
  assert_eq!(written.trim(), "4211-stage2");
}

#[cfg(unix)]
#[test]
fn failing_command_stops_the_run() {
  let temp_dir = TempDir::new().unwrap();
  let path = write_manifest(
    temp_dir.path(),
    r#"
    [targets.compile]
    cmd = ["/bin/sh", "-c", "echo 'error CS1002' >&2; exit 1"]

    [targets.test]
    dependencies = ["compile"]
    cmd = ["/bin/sh", "-c", "touch tested"]
    "#,
  );

  let registry = TargetsManifest::load(&path).unwrap().into_registry().unwrap();
  let mut ctx = context(temp_dir.path(), &[]);
  let report = run_goal(&registry, "test", &mut ctx).unwrap();

  let failure = report.failure.unwrap();
  assert_eq!(failure.name, "compile");
  assert!(failure.message.contains("exited with code 1: error CS1002"), "{}", failure.message);
  assert!(!temp_dir.path().join("tested").exists());
}

#[test]
fn ci_build_refreshes_package_cache() {
  let temp_dir = TempDir::new().unwrap();
  let packages = temp_dir.path().join("artifacts").join("packages");
  fs::create_dir_all(&packages).unwrap();
  fs::write(packages.join(CACHE_STAMP_FILE), "2001-01-01T00:00:00Z").unwrap();
  fs::write(packages.join("stale.nupkg"), "x").unwrap();

  let path = write_manifest(
    temp_dir.path(),
    r#"
    [targets.check-cache]
    cache = "$${dir:packages}"
    "#,
  );

  let registry = TargetsManifest::load(&path).unwrap().into_registry().unwrap();
  let mut ctx = context(temp_dir.path(), &[("CI_BUILD", "1")]);
  let report = run_goal(&registry, "check-cache", &mut ctx).unwrap();

  assert!(report.is_success());
  assert!(!packages.join("stale.nupkg").exists());
  assert!(packages.join(CACHE_STAMP_FILE).exists());
}
