//! Host platform detection and platform constraints.
//!
//! A [`Platform`] describes the machine the engine runs on: OS family, an
//! optional OS version and the CPU architecture. Targets carry an optional
//! [`PlatformConstraint`] that the [`gate`] evaluates against it.

pub mod arch;
pub mod gate;
pub mod os;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use arch::Arch;
use os::OsFamily;

pub use gate::{PlatformConstraint, VersionConstraint, VersionRequirement, is_satisfied};

/// Errors from parsing platform descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
  #[error("unknown OS family: {0}")]
  UnknownFamily(String),

  #[error("invalid platform description '{0}': expected family[:version]")]
  InvalidDescription(String),
}

/// The host platform a run executes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
  pub os: OsFamily,
  pub version: Option<String>,
  pub arch: Option<Arch>,
}

impl Platform {
  /// Create a platform with the current architecture.
  pub fn new(os: OsFamily, version: Option<&str>) -> Self {
    Self {
      os,
      version: version.map(str::to_string),
      arch: Arch::current(),
    }
  }

  /// Detect the current platform at runtime.
  ///
  /// On Linux the distribution and version come from `/etc/os-release`;
  /// if that file is unreadable the host is reported as generic Linux.
  pub fn detect() -> Self {
    let arch = Arch::current();
    let (os, version) = match std::env::consts::OS {
      "linux" => detect_linux(Path::new("/etc/os-release")),
      "macos" => (OsFamily::MacOs, None),
      "windows" => (OsFamily::Windows, None),
      _ => (OsFamily::Unknown, None),
    };
    debug!(os = %os, version = ?version, "detected platform");
    Self { os, version, arch }
  }
}

fn detect_linux(os_release: &Path) -> (OsFamily, Option<String>) {
  match std::fs::read_to_string(os_release) {
    Ok(content) => os::parse_os_release(&content),
    Err(err) => {
      debug!(path = %os_release.display(), error = %err, "cannot read os-release");
      (OsFamily::Linux, None)
    }
  }
}

impl FromStr for Platform {
  type Err = PlatformError;

  /// Parse `family[:version]`, e.g. `ubuntu:14.04` or `windows`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(PlatformError::InvalidDescription(s.to_string()));
    }
    let (family, version) = match s.split_once(':') {
      Some((family, version)) if !version.trim().is_empty() => (family, Some(version.trim())),
      Some(_) => return Err(PlatformError::InvalidDescription(s.to_string())),
      None => (s, None),
    };
    Ok(Self::new(family.parse()?, version))
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(version) => write!(f, "{} {}", self.os, version)?,
      None => write!(f, "{}", self.os)?,
    }
    if let Some(arch) = self.arch {
      write!(f, " ({})", arch)?;
    }
    Ok(())
  }
}
