//! The target registry.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::types::Target;

/// Errors from registering or looking up targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  #[error("target '{0}' is already registered")]
  DuplicateTarget(String),

  #[error("unknown target '{0}'")]
  UnknownTarget(String),
}

/// Table of every target known to a run, keyed by name.
///
/// Built by an initialization routine before execution starts and only read
/// afterwards.
#[derive(Debug, Default)]
pub struct TargetRegistry {
  targets: HashMap<String, Target>,
  order: Vec<String>,
}

impl TargetRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a target. Fails if a target with the same name already exists.
  pub fn register(&mut self, target: Target) -> Result<(), RegistryError> {
    let name = target.name().to_string();
    if self.targets.contains_key(&name) {
      return Err(RegistryError::DuplicateTarget(name));
    }
    debug!(target_name = %name, dependencies = ?target.dependencies(), "registered target");
    self.order.push(name.clone());
    self.targets.insert(name, target);
    Ok(())
  }

  /// Register several targets, stopping at the first duplicate.
  pub fn register_all(&mut self, targets: impl IntoIterator<Item = Target>) -> Result<(), RegistryError> {
    targets.into_iter().try_for_each(|target| self.register(target))
  }

  pub fn lookup(&self, name: &str) -> Result<&Target, RegistryError> {
    self
      .targets
      .get(name)
      .ok_or_else(|| RegistryError::UnknownTarget(name.to_string()))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.targets.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  /// Targets in registration order.
  pub fn iter(&self) -> impl Iterator<Item = &Target> {
    self.order.iter().filter_map(|name| self.targets.get(name))
  }
}
