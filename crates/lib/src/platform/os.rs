use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// Operating system families a target can be constrained to.
///
/// Linux distributions are distinct families so that package-manager specific
/// checks can be gated precisely. The generic `Linux` family matches every
/// distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OsFamily {
  Windows,
  MacOs,
  Linux,
  Ubuntu,
  Debian,
  CentOs,
  Rhel,
  Fedora,
  OpenSuse,
  Unknown,
}

impl OsFamily {
  /// Returns the lowercase string identifier for this family
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Windows => "windows",
      Self::MacOs => "macos",
      Self::Linux => "linux",
      Self::Ubuntu => "ubuntu",
      Self::Debian => "debian",
      Self::CentOs => "centos",
      Self::Rhel => "rhel",
      Self::Fedora => "fedora",
      Self::OpenSuse => "opensuse",
      Self::Unknown => "unknown",
    }
  }

  /// Whether this family is Linux or a Linux distribution.
  pub fn is_linux(&self) -> bool {
    matches!(
      self,
      Self::Linux | Self::Ubuntu | Self::Debian | Self::CentOs | Self::Rhel | Self::Fedora | Self::OpenSuse
    )
  }

  /// Whether a host of family `host` is covered by this (constraint) family.
  pub fn covers(&self, host: OsFamily) -> bool {
    *self == host || (*self == Self::Linux && host.is_linux())
  }

  /// Map an os-release `ID` value to a family.
  fn from_os_release_id(id: &str) -> Self {
    match id {
      "ubuntu" => Self::Ubuntu,
      "debian" => Self::Debian,
      "centos" => Self::CentOs,
      "rhel" => Self::Rhel,
      "fedora" => Self::Fedora,
      "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" | "sles" => Self::OpenSuse,
      _ => Self::Linux,
    }
  }
}

impl FromStr for OsFamily {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "windows" => Ok(Self::Windows),
      "macos" | "osx" | "darwin" => Ok(Self::MacOs),
      "linux" => Ok(Self::Linux),
      "ubuntu" => Ok(Self::Ubuntu),
      "debian" => Ok(Self::Debian),
      "centos" => Ok(Self::CentOs),
      "rhel" => Ok(Self::Rhel),
      "fedora" => Ok(Self::Fedora),
      "opensuse" => Ok(Self::OpenSuse),
      "unknown" => Ok(Self::Unknown),
      other => Err(PlatformError::UnknownFamily(other.to_string())),
    }
  }
}

impl TryFrom<String> for OsFamily {
  type Error = PlatformError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<OsFamily> for String {
  fn from(value: OsFamily) -> Self {
    value.as_str().to_string()
  }
}

impl fmt::Display for OsFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Parse the contents of `/etc/os-release` into a family and version.
///
/// Only `ID` and `VERSION_ID` are consulted. Values may be quoted.
pub fn parse_os_release(content: &str) -> (OsFamily, Option<String>) {
  let mut family = OsFamily::Linux;
  let mut version = None;

  for line in content.lines() {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
      continue;
    }
    let Some((key, value)) = line.split_once('=') else {
      continue;
    };
    let value = value.trim().trim_matches('"').trim_matches('\'');
    match key.trim() {
      "ID" => family = OsFamily::from_os_release_id(&value.to_ascii_lowercase()),
      "VERSION_ID" if !value.is_empty() => version = Some(value.to_string()),
      _ => {}
    }
  }

  (family, version)
}
