//! Loading a manifest and turning it into registered targets.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::action::{ActionError, CmdSpec, refresh_cache, run_cmd};
use crate::context::{BuildContext, ContextError};
use crate::placeholder::{self, PlaceholderError};
use crate::platform::{PlatformConstraint, VersionRequirement};
use crate::target::{RegistryError, Target, TargetRegistry, TargetResult};

use super::types::{PlatformSpec, TargetSpec, TargetsManifest};

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid manifest: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("target '{name}': {reason}")]
  InvalidTarget { name: String, reason: String },

  #[error("target '{name}': {source}")]
  Placeholder {
    name: String,
    #[source]
    source: PlaceholderError,
  },

  #[error("default goal '{0}' is not a declared target")]
  UnknownDefault(String),

  #[error(transparent)]
  Registry(#[from] RegistryError),
}

impl FromStr for TargetsManifest {
  type Err = ManifestError;

  fn from_str(content: &str) -> Result<Self, Self::Err> {
    Ok(toml::from_str(content)?)
  }
}

impl TargetsManifest {
  /// Read and parse the manifest at `path`.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let manifest: Self = content.parse()?;
    debug!(path = ?path, targets = manifest.targets.len(), "loaded manifest");
    Ok(manifest)
  }

  /// Validate every target and register it.
  ///
  /// Placeholders are parsed here so syntax errors surface before anything
  /// runs; their values are only resolved when the body executes.
  pub fn into_registry(self) -> Result<TargetRegistry, ManifestError> {
    if let Some(goal) = &self.default {
      if !self.targets.contains_key(goal) {
        return Err(ManifestError::UnknownDefault(goal.clone()));
      }
    }

    let mut registry = TargetRegistry::new();
    for (name, spec) in self.targets {
      registry.register(build_target(name, spec)?)?;
    }
    info!(targets = registry.len(), "registered manifest targets");
    Ok(registry)
  }
}

fn build_target(name: String, spec: TargetSpec) -> Result<Target, ManifestError> {
  let references = validate(&name, &spec)?;

  let constraint = spec
    .platform
    .as_ref()
    .map(|platform| platform_constraint(&name, platform))
    .transpose()?;

  let description = spec.description.clone();
  let dependencies = spec.dependencies.clone();
  let steps = Steps::new(spec, references);

  let mut target = Target::new(name, move |ctx| steps.run(ctx)).depends_on(dependencies);
  if let Some(constraint) = constraint {
    target = target.with_platform(constraint);
  }
  if let Some(description) = description {
    target = target.with_description(description);
  }
  Ok(target)
}

/// Check `spec` and return the context keys its templates read that the
/// target does not produce itself.
fn validate(name: &str, spec: &TargetSpec) -> Result<Vec<String>, ManifestError> {
  let invalid = |reason: &str| ManifestError::InvalidTarget {
    name: name.to_string(),
    reason: reason.to_string(),
  };

  if spec.cmd.is_empty() && (spec.cwd.is_some() || spec.capture.is_some() || !spec.env.is_empty()) {
    return Err(invalid("cwd, env and capture require cmd"));
  }
  if spec.dependencies.iter().any(|dep| dep == name) {
    return Err(invalid("target depends on itself"));
  }

  let templates = spec
    .set
    .values()
    .chain(spec.export.values())
    .chain(spec.env.values())
    .chain(&spec.cmd)
    .chain(&spec.message)
    .chain(&spec.cache)
    .chain(&spec.cwd)
    .chain(&spec.fail);
  let mut references = Vec::new();
  for template in templates {
    let keys = placeholder::context_keys(template).map_err(|source| ManifestError::Placeholder {
      name: name.to_string(),
      source,
    })?;
    for key in keys {
      let produced = spec.set.contains_key(&key) || spec.capture.as_ref() == Some(&key);
      if !produced && !references.contains(&key) {
        references.push(key);
      }
    }
  }

  Ok(references)
}

fn platform_constraint(name: &str, spec: &PlatformSpec) -> Result<PlatformConstraint, ManifestError> {
  let invalid = |reason: &str| ManifestError::InvalidTarget {
    name: name.to_string(),
    reason: reason.to_string(),
  };

  let mut constraint = PlatformConstraint::new(spec.families.iter().copied());
  if let Some(version) = &spec.version {
    let requirement = match (&version.exact, &version.at_least) {
      (Some(exact), None) => VersionRequirement::Exact(exact.clone()),
      (None, Some(at_least)) => VersionRequirement::AtLeast(at_least.clone()),
      _ => return Err(invalid("platform version needs exactly one of exact or at_least")),
    };
    constraint = constraint.with_version(version.family, requirement);
  }

  if constraint.families().next().is_none() {
    return Err(invalid("platform needs at least one family"));
  }
  Ok(constraint)
}

#[derive(Debug, Error)]
enum StepError {
  #[error(transparent)]
  Context(#[from] ContextError),

  #[error(transparent)]
  Placeholder(#[from] PlaceholderError),

  #[error(transparent)]
  Action(#[from] ActionError),

  #[error("{0}")]
  Fail(String),
}

/// The runnable part of a [`TargetSpec`].
struct Steps {
  requires: Vec<String>,
  /// Context keys read by templates and published by upstream targets.
  references: Vec<String>,
  set: Vec<(String, String)>,
  export: Vec<(String, String)>,
  message: Option<String>,
  cache: Option<String>,
  cmd: Vec<String>,
  cwd: Option<String>,
  env: Vec<(String, String)>,
  capture: Option<String>,
  fail: Option<String>,
}

impl Steps {
  fn new(spec: TargetSpec, references: Vec<String>) -> Self {
    Self {
      requires: spec.requires,
      references,
      set: spec.set.into_iter().collect(),
      export: spec.export.into_iter().collect(),
      message: spec.message,
      cache: spec.cache,
      cmd: spec.cmd,
      cwd: spec.cwd,
      env: spec.env.into_iter().collect(),
      capture: spec.capture,
      fail: spec.fail,
    }
  }

  fn run(&self, ctx: &mut BuildContext) -> TargetResult {
    self.try_run(ctx).into()
  }

  fn try_run(&self, ctx: &mut BuildContext) -> Result<(), StepError> {
    // Nothing runs unless every upstream value this target reads is present.
    for key in self.requires.iter().chain(&self.references) {
      if !ctx.contains(key) {
        return Err(ContextError::MissingValue { key: key.clone() }.into());
      }
    }

    for (key, template) in &self.set {
      let value = placeholder::substitute(template, &*ctx)?;
      ctx.set(key.clone(), value);
    }

    for (key, template) in &self.export {
      let value = placeholder::substitute(template, &*ctx)?;
      ctx.export_env(key.clone(), value);
    }

    if let Some(message) = &self.message {
      ctx.info(placeholder::substitute(message, &*ctx)?);
    }

    if let Some(template) = &self.cache {
      let dir = ctx.root().join(placeholder::substitute(template, &*ctx)?);
      let status = refresh_cache(&dir, ctx.cache_time_limit(), ctx.ci_build(), Utc::now())?;
      ctx.info(format_args!("package cache {}: {}", dir.display(), status.as_str()));
    }

    if !self.cmd.is_empty() {
      let stdout = run_cmd(&self.command(ctx)?, ctx)?;
      if let Some(key) = &self.capture {
        ctx.verbose(format_args!("captured {key} = {stdout}"));
        ctx.set(key.clone(), stdout);
      }
    }

    if let Some(message) = &self.fail {
      return Err(StepError::Fail(placeholder::substitute(message, &*ctx)?));
    }

    Ok(())
  }

  fn command(&self, ctx: &BuildContext) -> Result<CmdSpec, PlaceholderError> {
    let mut words = self.cmd.iter().map(|word| placeholder::substitute(word, ctx));
    let program = match words.next() {
      Some(program) => program?,
      None => String::new(),
    };

    let mut spec = CmdSpec::new(program).args(words.collect::<Result<Vec<_>, _>>()?);
    if let Some(cwd) = &self.cwd {
      spec = spec.current_dir(placeholder::substitute(cwd, ctx)?);
    }
    for (key, template) in &self.env {
      spec = spec.env(key.clone(), placeholder::substitute(template, ctx)?);
    }
    Ok(spec)
  }
}
