//! Constants shared across the crate.

/// Application name, used for default file names and log output.
pub const APP_NAME: &str = "targetry";

/// Default manifest file name, looked up under the repository root.
pub const MANIFEST_FILE: &str = "Targets.toml";

/// Configuration name used when `TARGETRY_CONFIGURATION` is unset.
pub const DEFAULT_CONFIGURATION: &str = "Debug";

/// Package cache lifetime on CI when `TARGETRY_CACHE_TIME_LIMIT` is unset (7 days).
pub const DEFAULT_CACHE_TIME_LIMIT_HOURS: u64 = 7 * 24;

/// Name of the stamp file recording when a package cache was last cleared.
pub const CACHE_STAMP_FILE: &str = "cache-time.txt";

pub const ENV_CONFIGURATION: &str = "TARGETRY_CONFIGURATION";
pub const ENV_CHANNEL: &str = "TARGETRY_CHANNEL";
pub const ENV_CI_BUILD: &str = "CI_BUILD";
pub const ENV_CACHE_TIME_LIMIT: &str = "TARGETRY_CACHE_TIME_LIMIT";
pub const ENV_PLATFORM: &str = "TARGETRY_PLATFORM";

/// Context key under which the configured channel is published.
pub const CHANNEL_KEY: &str = "Channel";
