//! User settings: recipe repositories and build parallelism.
//!
//! Settings come from `$XDG_CONFIG_HOME/spackle/config.toml` (falling back
//! to `~/.config`), then `SPACKLE_REPO` and `SPACKLE_JOBS` override them.

use std::env;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{APP_NAME, CONFIG_FILE_NAME, JOBS_ENV, REPO_ENV};
use crate::plan::CompileOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value '{value}' for {var}: {reason}")]
  InvalidEnv {
    var: &'static str,
    value: String,
    reason: String,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Recipe repositories, searched in order.
  pub repos: Vec<PathBuf>,
  /// Parallel jobs for `make`; zero is rejected when parsing.
  pub jobs: Option<NonZeroUsize>,
}

/// Directory holding the config file, if a home can be determined.
pub fn config_dir() -> Option<PathBuf> {
  let config_home = env::var_os("XDG_CONFIG_HOME")
    .filter(|v| !v.is_empty())
    .map(PathBuf::from)
    .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
  Some(config_home.join(APP_NAME))
}

pub fn config_path() -> Option<PathBuf> {
  config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

impl Config {
  /// The config file if it exists, with environment overrides applied.
  pub fn load() -> Result<Self, ConfigError> {
    let mut config = match config_path() {
      Some(path) if path.is_file() => Self::from_file(&path)?,
      _ => Self::default(),
    };
    config.apply_env()?;
    Ok(config)
  }

  /// Read a config file. Relative repository paths are taken relative to
  /// the file's directory.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    if let Some(base) = path.parent() {
      for repo in &mut config.repos {
        if repo.is_relative() {
          *repo = base.join(&*repo);
        }
      }
    }

    debug!(path = ?path, repos = config.repos.len(), "loaded config");
    Ok(config)
  }

  /// Override from `SPACKLE_REPO` (a `:`-separated path list) and
  /// `SPACKLE_JOBS`.
  pub fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Some(repos) = env::var_os(REPO_ENV).filter(|v| !v.is_empty()) {
      self.repos = env::split_paths(&repos).filter(|p| !p.as_os_str().is_empty()).collect();
    }

    if let Ok(jobs) = env::var(JOBS_ENV)
      && !jobs.is_empty()
    {
      self.jobs = Some(parse_jobs(JOBS_ENV, &jobs)?);
    }

    Ok(())
  }

  pub fn compile_options(&self) -> CompileOptions {
    CompileOptions { jobs: self.jobs }
  }
}

fn parse_jobs(var: &'static str, value: &str) -> Result<NonZeroUsize, ConfigError> {
  let invalid = |reason: &str| ConfigError::InvalidEnv {
    var,
    value: value.to_string(),
    reason: reason.to_string(),
  };
  match value.trim().parse::<usize>() {
    Ok(n) => NonZeroUsize::new(n).ok_or_else(|| invalid("must be at least 1")),
    Err(e) => Err(invalid(&e.to_string())),
  }
}
