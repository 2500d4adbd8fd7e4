//! Command line interface and its merge with the environment configuration.

use crate::config::{AppConfig, RepoId};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "pr-stats",
    version,
    about = "Builds pull request statistics pages for a GitHub repository"
)]
pub struct Cli {
    /// Repository as "owner/repo" [env: PR_STATS_REPOSITORY, default: opencv/opencv]
    #[arg(long)]
    pub repo: Option<RepoId>,

    /// Path to pages directory. Will be created if it does not exist
    /// [env: PR_STATS_PAGES_PATH, default: ./docs/source]
    #[arg(long, alias = "pages_path")]
    pub pages_path: Option<PathBuf>,

    /// Auth token to access the GitHub API
    #[arg(long, alias = "auth_token", conflicts_with = "secure_auth")]
    pub auth_token: Option<String>,

    /// Prompt for the auth token without echoing it
    #[arg(long, alias = "secure_auth")]
    pub secure_auth: bool,

    /// Save downloads into the cache file
    #[arg(long, conflicts_with = "from_cache")]
    pub cache: Option<PathBuf>,

    /// Generate pages from the cache file instead of the GitHub API
    #[arg(long, alias = "from_cache")]
    pub from_cache: Option<PathBuf>,

    /// Full weeks before the current one to analyse [env: PR_STATS_WEEKS, default: 12]
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    pub weeks: Option<i64>,

    /// Do not download the changed files of open pull requests
    #[arg(long)]
    pub skip_files: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Where the pull requests come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    GitHub {
        token: Option<String>,
        load_files: bool,
    },
    Cache(PathBuf),
}

/// Settings of one run, after flags have been applied over the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub repository: RepoId,
    pub pages_path: PathBuf,
    pub weeks: i64,
    pub source: DataSource,
    pub save_cache: Option<PathBuf>,
}

impl Cli {
    /// Merges the flags over `config`. `prompt` is only called for `--secure-auth`.
    pub fn resolve<F>(self, config: AppConfig, prompt: F) -> Result<RunOptions>
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        let weeks = self.weeks.unwrap_or(config.weeks);
        if weeks < 1 {
            bail!("The analysis window must cover at least one week, got {weeks}");
        }

        let source = match self.from_cache {
            Some(path) => DataSource::Cache(path),
            None => {
                let token = if let Some(token) = self.auth_token {
                    Some(token)
                } else if self.secure_auth {
                    Some(prompt().context("Failed to read the auth token")?)
                } else {
                    config.github_token
                };
                if token.is_none() {
                    tracing::warn!(
                        "Neither --auth-token nor --secure-auth is specified and GITHUB_API_TOKEN \
                         is not set. API calls are limited to 60 per hour"
                    );
                }
                DataSource::GitHub {
                    token,
                    load_files: !self.skip_files,
                }
            }
        };

        Ok(RunOptions {
            repository: self.repo.unwrap_or(config.repository),
            pages_path: self.pages_path.unwrap_or(config.pages_path),
            weeks,
            source,
            save_cache: self.cache,
        })
    }
}
