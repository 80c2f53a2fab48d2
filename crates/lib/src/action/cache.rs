//! Package cache refresh.
//!
//! CI machines keep a package cache between builds. To stop it from growing
//! stale, a stamp file records when the cache was last cleared; once the stamp
//! is older than the configured limit the whole directory is wiped and
//! restamped. Outside CI the cache is only created when missing.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::consts::CACHE_STAMP_FILE;

use super::ActionError;

/// What [`refresh_cache`] did to the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
  /// The directory existed and was left alone.
  Kept,
  /// The directory did not exist and was created.
  Created,
  /// The directory was wiped and restamped.
  Cleared,
}

impl CacheStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Kept => "kept",
      Self::Created => "created",
      Self::Cleared => "cleared",
    }
  }
}

enum Stamp {
  Missing,
  Invalid(String),
  Written(DateTime<Utc>),
}

/// Ensure the cache at `dir` exists and, on CI, is younger than `limit`.
///
/// # Errors
///
/// Returns `ActionError::Cache` if the directory cannot be created, cleared
/// or stamped.
pub fn refresh_cache(
  dir: &Path,
  limit: Duration,
  ci_build: bool,
  now: DateTime<Utc>,
) -> Result<CacheStatus, ActionError> {
  let existed = dir.is_dir();

  if !ci_build {
    if !existed {
      fs::create_dir_all(dir).map_err(|source| cache_error(dir, source))?;
      return Ok(CacheStatus::Created);
    }
    return Ok(CacheStatus::Kept);
  }

  let stamp_path = dir.join(CACHE_STAMP_FILE);
  let expired = match read_stamp(&stamp_path) {
    Stamp::Written(written) => match now.signed_duration_since(written).to_std() {
      Ok(age) => {
        debug!(path = ?dir, age_hours = age.as_secs() / 3600, "cache stamp found");
        age >= limit
      }
      // Stamp from the future.
      Err(_) => false,
    },
    Stamp::Invalid(reason) => {
      warn!(path = ?stamp_path, reason = %reason, "unreadable cache stamp, clearing cache");
      true
    }
    Stamp::Missing => {
      debug!(path = ?stamp_path, "no cache stamp");
      true
    }
  };

  if !expired {
    return Ok(CacheStatus::Kept);
  }

  if existed {
    info!(path = ?dir, limit_hours = limit.as_secs() / 3600, "clearing package cache");
    fs::remove_dir_all(dir).map_err(|source| cache_error(dir, source))?;
  }
  fs::create_dir_all(dir).map_err(|source| cache_error(dir, source))?;
  fs::write(&stamp_path, now.to_rfc3339()).map_err(|source| cache_error(&stamp_path, source))?;

  Ok(if existed { CacheStatus::Cleared } else { CacheStatus::Created })
}

fn read_stamp(path: &Path) -> Stamp {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(err) if err.kind() == io::ErrorKind::NotFound => return Stamp::Missing,
    Err(err) => return Stamp::Invalid(err.to_string()),
  };
  match DateTime::parse_from_rfc3339(content.trim()) {
    Ok(written) => Stamp::Written(written.with_timezone(&Utc)),
    Err(err) => Stamp::Invalid(format!("'{}': {err}", content.trim())),
  }
}

fn cache_error(path: &Path, source: io::Error) -> ActionError {
  ActionError::Cache {
    path: path.to_path_buf(),
    source,
  }
}
