mod info;
mod list;
mod plan;
mod run;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use targetry_lib::config::BuildConfig;
use targetry_lib::consts::MANIFEST_FILE;
use targetry_lib::manifest::TargetsManifest;
use targetry_lib::target::TargetRegistry;

use crate::output::OutputFormat;

pub use info::cmd_info;
pub use list::cmd_list;
pub use plan::cmd_plan;
pub use run::cmd_run;

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalOpts {
  /// Targets manifest (default: Targets.toml under the root)
  #[arg(short = 'f', long, global = true)]
  pub file: Option<PathBuf>,

  /// Repository root (default: current directory)
  #[arg(long, global = true)]
  pub root: Option<PathBuf>,

  /// Stop starting targets and kill running commands after this long, e.g. "30m"
  #[arg(long, global = true, value_parser = humantime::parse_duration)]
  pub timeout: Option<Duration>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  pub output: OutputFormat,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  pub verbose: bool,
}

/// Configuration and targets loaded for one invocation.
pub struct Workspace {
  pub config: BuildConfig,
  pub manifest_path: PathBuf,
  pub default_goal: Option<String>,
  pub registry: TargetRegistry,
}

impl Workspace {
  pub fn load(opts: &GlobalOpts) -> Result<Self> {
    let config = load_config(opts)?;
    let manifest_path = opts.file.clone().unwrap_or_else(|| config.root.join(MANIFEST_FILE));

    let manifest = TargetsManifest::load(&manifest_path)
      .with_context(|| format!("Failed to load targets manifest: {}", manifest_path.display()))?;
    let default_goal = manifest.default.clone();
    let registry = manifest
      .into_registry()
      .with_context(|| format!("Invalid targets manifest: {}", manifest_path.display()))?;

    debug!(manifest = %manifest_path.display(), targets = registry.len(), "workspace loaded");

    Ok(Self {
      config,
      manifest_path,
      default_goal,
      registry,
    })
  }

  /// The goal given on the command line, or the manifest default.
  pub fn goal(&self, requested: Option<&str>) -> Result<String> {
    requested
      .map(str::to_string)
      .or_else(|| self.default_goal.clone())
      .with_context(|| {
        format!(
          "No goal given and {} declares no default",
          self.manifest_path.display()
        )
      })
  }
}

pub fn load_config(opts: &GlobalOpts) -> Result<BuildConfig> {
  let root = match &opts.root {
    Some(root) => root.clone(),
    None => std::env::current_dir().context("Failed to determine current directory")?,
  };
  let config = BuildConfig::from_env(&root).context("Invalid build configuration")?;
  Ok(config.with_timeout(opts.timeout))
}
