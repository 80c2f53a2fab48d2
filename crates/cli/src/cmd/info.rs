//! Implementation of the `targetry info` command.

use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;

use targetry_lib::consts::APP_NAME;
use targetry_lib::context::BuildDirs;
use targetry_lib::platform::Platform;

use super::{GlobalOpts, load_config};
use crate::output::{Status, print_json, print_stat, print_status};

#[derive(Serialize)]
struct Info<'a> {
  version: &'static str,
  platform: &'a Platform,
  configuration: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  channel: Option<&'a str>,
  ci_build: bool,
  cache_time_limit: String,
  dirs: &'a BuildDirs,
}

pub fn cmd_info(opts: &GlobalOpts) -> Result<ExitCode> {
  let config = load_config(opts)?;
  let dirs = BuildDirs::from_root(&config.root, &config.configuration);

  let info = Info {
    version: env!("CARGO_PKG_VERSION"),
    platform: &config.platform,
    configuration: &config.configuration,
    channel: config.channel.as_deref(),
    ci_build: config.ci_build,
    cache_time_limit: humantime::format_duration(config.cache_time_limit).to_string(),
    dirs: &dirs,
  };

  if opts.output.is_json() {
    print_json(&info)?;
    return Ok(ExitCode::SUCCESS);
  }

  print_status(Status::Info, &format!("{} v{}", APP_NAME, info.version));
  print_stat("Platform", &info.platform.to_string());
  print_stat("Configuration", info.configuration);
  print_stat("Channel", info.channel.unwrap_or("-"));
  print_stat("CI build", if info.ci_build { "yes" } else { "no" });
  print_stat("Cache limit", &info.cache_time_limit);
  print_stat("Root", &dirs.root.display().to_string());
  print_stat("Output", &dirs.output.display().to_string());
  print_stat("Packages", &dirs.packages.display().to_string());

  Ok(ExitCode::SUCCESS)
}
