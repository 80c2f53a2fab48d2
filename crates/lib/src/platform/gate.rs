//! Platform gate: decides whether a target may run on the current host.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use super::Platform;
use super::os::OsFamily;

/// How a host version must relate to the required version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequirement {
  /// Host version must equal this version component-wise.
  Exact(String),
  /// Host version must be greater than or equal to this version.
  AtLeast(String),
}

impl VersionRequirement {
  pub fn matches(&self, version: &str) -> bool {
    match self {
      Self::Exact(required) => compare_versions(version, required) == Ordering::Equal,
      Self::AtLeast(required) => compare_versions(version, required) != Ordering::Less,
    }
  }
}

impl fmt::Display for VersionRequirement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Exact(v) => write!(f, "{}", v),
      Self::AtLeast(v) => write!(f, ">={}", v),
    }
  }
}

/// A version requirement that only applies to hosts of one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
  pub family: OsFamily,
  pub requirement: VersionRequirement,
}

/// The set of platforms a target is permitted to run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConstraint {
  families: BTreeSet<OsFamily>,
  version: Option<VersionConstraint>,
}

impl PlatformConstraint {
  pub fn new(families: impl IntoIterator<Item = OsFamily>) -> Self {
    Self {
      families: families.into_iter().collect(),
      version: None,
    }
  }

  /// Narrow hosts of `family` to those matching `requirement`.
  ///
  /// `family` is added to the permitted families if it was not already there.
  pub fn with_version(mut self, family: OsFamily, requirement: VersionRequirement) -> Self {
    self.families.insert(family);
    self.version = Some(VersionConstraint { family, requirement });
    self
  }

  pub fn families(&self) -> impl Iterator<Item = OsFamily> + '_ {
    self.families.iter().copied()
  }

  pub fn version(&self) -> Option<&VersionConstraint> {
    self.version.as_ref()
  }

  fn permits(&self, platform: &Platform) -> bool {
    if !self.families.iter().any(|family| family.covers(platform.os)) {
      return false;
    }

    match &self.version {
      Some(constraint) if constraint.family.covers(platform.os) => platform
        .version
        .as_deref()
        .is_some_and(|version| constraint.requirement.matches(version)),
      _ => true,
    }
  }
}

impl fmt::Display for PlatformConstraint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for family in &self.families {
      if !first {
        write!(f, ", ")?;
      }
      first = false;
      write!(f, "{}", family)?;
      if let Some(version) = self.version.as_ref().filter(|v| v.family == *family) {
        write!(f, " {}", version.requirement)?;
      }
    }
    Ok(())
  }
}

/// Returns whether `platform` satisfies `constraint`. No constraint always satisfies.
pub fn is_satisfied(constraint: Option<&PlatformConstraint>, platform: &Platform) -> bool {
  constraint.is_none_or(|c| c.permits(platform))
}

/// Compare dotted version strings component-wise.
///
/// Numeric components compare as numbers (`14.04 == 14.4`); anything else
/// compares as text. Missing trailing components count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  let mut left = a.trim().split('.');
  let mut right = b.trim().split('.');

  loop {
    let ordering = match (left.next(), right.next()) {
      (None, None) => return Ordering::Equal,
      (Some(l), None) => compare_component(l, "0"),
      (None, Some(r)) => compare_component("0", r),
      (Some(l), Some(r)) => compare_component(l, r),
    };
    if ordering != Ordering::Equal {
      return ordering;
    }
  }
}

fn compare_component(a: &str, b: &str) -> Ordering {
  match (a.parse::<u64>(), b.parse::<u64>()) {
    (Ok(a), Ok(b)) => a.cmp(&b),
    _ => a.cmp(b),
  }
}
