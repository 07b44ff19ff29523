//! spackle: resolve package recipes into build plans.

mod cmd;
mod output;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spackle_lib::config::Config;
use spackle_lib::consts::{JOBS_ENV, REPO_ENV};

use cmd::{Session, cmd_info, cmd_list, cmd_plan, cmd_resolve};
use output::{OutputFormat, print_error};

#[derive(Parser)]
#[command(name = "spackle")]
#[command(author, version, about = "Resolve package recipes into build plans", long_about = None)]
struct Cli {
  /// Recipe repository to search; earlier repositories win
  #[arg(short, long = "repo", global = true, env = REPO_ENV, value_delimiter = ':')]
  repos: Vec<PathBuf>,

  /// Parallel jobs passed to make
  #[arg(short, long, global = true, env = JOBS_ENV)]
  jobs: Option<NonZeroUsize>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List the packages in the repositories
  List,

  /// Show versions, variants and dependencies of a package
  Info {
    /// Package name
    package: String,
  },

  /// Resolve requests and print their dependency trees
  ///
  /// Each argument is one request. An argument starting with `^` constrains a
  /// dependency of the request before it, e.g. `root+cxx14 ^xrootd+debug`.
  Resolve {
    #[arg(required = true)]
    requests: Vec<String>,

    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Resolve requests and print the build plans of their closures
  Plan {
    #[arg(required = true)]
    requests: Vec<String>,

    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let mut config = Config::load().context("Failed to load configuration")?;
  if !cli.repos.is_empty() {
    config.repos = cli.repos;
  }
  if let Some(jobs) = cli.jobs {
    config.jobs = Some(jobs);
  }

  let session = Session::open(&config)?;
  match cli.command {
    Commands::List => cmd_list(&session),
    Commands::Info { package } => cmd_info(&session, &package),
    Commands::Resolve { requests, format } => cmd_resolve(&session, &requests, format),
    Commands::Plan { requests, format } => cmd_plan(&session, &requests, format),
  }
}
