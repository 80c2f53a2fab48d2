//! Build configuration, read once from the environment at startup.
//!
//! | Variable                    | Meaning                                  | Default   |
//! |-----------------------------|------------------------------------------|-----------|
//! | `TARGETRY_CONFIGURATION`    | configuration name                       | `Debug`   |
//! | `TARGETRY_CHANNEL`          | release channel, published as `Channel`  | unset     |
//! | `CI_BUILD`                  | `1` enables CI-only behavior             | off       |
//! | `TARGETRY_CACHE_TIME_LIMIT` | package cache lifetime in hours          | `168`     |
//! | `TARGETRY_PLATFORM`         | host override, `family[:version]`        | detected  |
//!
//! Nothing in the crate reads these variables after [`BuildConfig::from_env`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::consts::{
  DEFAULT_CACHE_TIME_LIMIT_HOURS, DEFAULT_CONFIGURATION, ENV_CACHE_TIME_LIMIT, ENV_CHANNEL, ENV_CI_BUILD,
  ENV_CONFIGURATION, ENV_PLATFORM,
};
use crate::platform::{Platform, PlatformError};

/// Errors from reading the build configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid TARGETRY_CACHE_TIME_LIMIT '{0}': expected a whole number of hours")]
  InvalidCacheTimeLimit(String),

  #[error("invalid TARGETRY_PLATFORM: {0}")]
  InvalidPlatform(#[from] PlatformError),

  #[error("cannot resolve repository root {}: {source}", path.display())]
  Root {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Inputs that select what a run builds and how.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Configuration name (e.g. `Debug`, `Release`).
  pub configuration: String,

  /// Optional release channel.
  pub channel: Option<String>,

  /// Whether CI-only behavior (time-based cache invalidation) is enabled.
  pub ci_build: bool,

  /// How long a package cache stays valid on CI.
  pub cache_time_limit: Duration,

  /// The platform targets are gated against.
  pub platform: Platform,

  /// Canonical repository root.
  pub root: PathBuf,

  /// Optional overall time budget for the run.
  pub timeout: Option<Duration>,
}

impl BuildConfig {
  /// Read the configuration from the process environment.
  pub fn from_env(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
    Self::from_lookup(root, |key| std::env::var(key).ok())
  }

  /// Read the configuration through `lookup`, which maps variable names to values.
  pub fn from_lookup<F>(root: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let root = root.as_ref();
    let root = dunce::canonicalize(root).map_err(|source| ConfigError::Root {
      path: root.to_path_buf(),
      source,
    })?;

    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let configuration = non_empty(ENV_CONFIGURATION).unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string());
    let channel = non_empty(ENV_CHANNEL);
    let ci_build = lookup(ENV_CI_BUILD).as_deref() == Some("1");

    let cache_time_limit = match non_empty(ENV_CACHE_TIME_LIMIT) {
      Some(raw) => {
        let hours: u64 = raw
          .trim()
          .parse()
          .map_err(|_| ConfigError::InvalidCacheTimeLimit(raw.clone()))?;
        hours
          .checked_mul(3600)
          .map(Duration::from_secs)
          .ok_or_else(|| ConfigError::InvalidCacheTimeLimit(raw.clone()))?
      }
      None => Duration::from_secs(DEFAULT_CACHE_TIME_LIMIT_HOURS * 3600),
    };

    let platform = match non_empty(ENV_PLATFORM) {
      Some(raw) => raw.parse()?,
      None => Platform::detect(),
    };

    debug!(
      configuration = %configuration,
      ci_build,
      platform = %platform,
      root = %root.display(),
      "loaded build configuration"
    );

    Ok(Self {
      configuration,
      channel,
      ci_build,
      cache_time_limit,
      platform,
      root,
      timeout: None,
    })
  }

  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }
}
