//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated repository root with a `Targets.toml`.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create from a fixture file, copied to `Targets.toml`.
  pub fn from_fixture(name: &str) -> Self {
    Self::with_manifest(&fixture_content(name))
  }

  pub fn with_manifest(content: &str) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("Targets.toml", content);
    env
  }

  /// Write a file relative to the root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn root_path(&self) -> PathBuf {
    let p = self.temp.path().to_path_buf();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.root_path().join(relative_path)).unwrap()
  }

  /// Get a pre-configured Command for the targetry binary.
  ///
  /// Runs in the root on a fixed Ubuntu 16.04 host with every build input at
  /// its default.
  pub fn targetry_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("targetry");
    cmd.current_dir(self.root_path());
    cmd.env("TARGETRY_PLATFORM", "ubuntu:16.04");
    cmd.env("RUST_LOG", "info");
    for var in [
      "TARGETRY_CONFIGURATION",
      "TARGETRY_CHANNEL",
      "TARGETRY_CACHE_TIME_LIMIT",
      "CI_BUILD",
    ] {
      cmd.env_remove(var);
    }
    cmd
  }
}
