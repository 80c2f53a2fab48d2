//! Serde model of a `Targets.toml` manifest.
//!
//! ```toml
//! default = "publish"
//!
//! [targets.init]
//! message = "Building $${configuration} into $${dir:output}"
//!
//! [targets.version]
//! dependencies = ["init"]
//! cmd = ["git", "rev-parse", "HEAD"]
//! capture = "CommitHash"
//!
//! [targets.check-prereqs]
//! platform = { families = ["ubuntu"], version = { family = "ubuntu", at_least = "14.04" } }
//! cmd = ["dpkg", "-s", "libunwind8"]
//!
//! [targets.publish]
//! dependencies = ["version", "check-prereqs"]
//! export = { COMMIT_HASH = "$${ctx:CommitHash}" }
//! cmd = ["./publish.sh"]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::platform::os::OsFamily;

/// A parsed targets manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetsManifest {
  /// Goal run when none is given on the command line.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<String>,
  #[serde(default)]
  pub targets: BTreeMap<String, TargetSpec>,
}

/// One `[targets.<name>]` table.
///
/// The body runs its steps in a fixed order: `requires`, `set`, `export`,
/// `message`, `cache`, `cmd`, `fail`. A target with none of them is an
/// aggregate that only groups its dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dependencies: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platform: Option<PlatformSpec>,

  /// Context keys that upstream targets must have published.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub requires: Vec<String>,
  /// String values to publish into the context.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub set: BTreeMap<String, String>,
  /// Environment variables for every later command.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub export: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  /// Package cache directory to refresh.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cache: Option<String>,

  /// Program followed by its arguments.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub cmd: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cwd: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
  /// Context key to publish the command's trimmed stdout under.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub capture: Option<String>,

  /// Fail unconditionally with this message.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fail: Option<String>,
}

/// `platform = { families = [..], version = { .. } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformSpec {
  #[serde(default)]
  pub families: Vec<OsFamily>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<VersionSpec>,
}

/// Version narrowing for a single family. Exactly one of `exact` and
/// `at_least` must be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionSpec {
  pub family: OsFamily,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exact: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub at_least: Option<String>,
}
