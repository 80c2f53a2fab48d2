mod cmd;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::GlobalOpts;

/// Exit status for resolution, manifest and configuration errors.
const EXIT_ERROR: u8 = 2;

/// targetry - run build targets in dependency order
#[derive(Parser)]
#[command(name = "targetry")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,

  /// Goal to run (default: the manifest's `default`)
  goal: Option<String>,

  #[command(flatten)]
  global: GlobalOpts,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a goal and its dependencies
  Run {
    /// Goal to run (default: the manifest's `default`)
    goal: Option<String>,
  },

  /// Show the targets a goal would run, in order
  Plan {
    /// Goal to resolve (default: the manifest's `default`)
    goal: Option<String>,

    /// Print the dependency graph in Graphviz DOT format
    #[arg(long)]
    dot: bool,
  },

  /// List the targets declared in the manifest
  List,

  /// Show the detected platform and build configuration
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.global.verbose);

  let result = match cli.command {
    None => cmd::cmd_run(&cli.global, cli.goal.as_deref()),
    Some(Commands::Run { goal }) => cmd::cmd_run(&cli.global, goal.as_deref()),
    Some(Commands::Plan { goal, dot }) => cmd::cmd_plan(&cli.global, goal.as_deref(), dot),
    Some(Commands::List) => cmd::cmd_list(&cli.global),
    Some(Commands::Info) => cmd::cmd_info(&cli.global),
  };

  match result {
    Ok(code) => code,
    Err(err) => {
      output::print_status(output::Status::Failed, &format!("{err:#}"));
      ExitCode::from(EXIT_ERROR)
    }
  }
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}
