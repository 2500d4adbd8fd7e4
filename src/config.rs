//! Application configuration and environment variable parsing.
//!
//! Settings come from the environment (optionally a `.env` file) under the
//! `PR_STATS_` prefix. Command line flags override them, see [`crate::cli`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_REPOSITORY: &str = "opencv/opencv";
pub const DEFAULT_PAGES_PATH: &str = "./docs/source";

/// A unique identifier for a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RepoId {
    /// The owner of the repository (e.g., "opencv").
    pub owner: String,
    /// The name of the repository (e.g., "opencv").
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid repository {0:?}, expected \"owner/repo\"")]
pub struct InvalidRepoId(pub String);

impl FromStr for RepoId {
    type Err = InvalidRepoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').map(str::trim).collect();
        match parts.as_slice() {
            [owner, repo]
                if !owner.is_empty()
                    && !repo.is_empty()
                    && *owner != ".."
                    && *repo != ".." =>
            {
                Ok(RepoId {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(InvalidRepoId(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for RepoId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Repository to report on, `PR_STATS_REPOSITORY`.
    #[serde(default = "default_repository")]
    pub repository: RepoId,

    /// Number of full weeks before the current one to analyse, `PR_STATS_WEEKS`.
    #[serde(default = "default_weeks")]
    pub weeks: i64,

    /// Directory receiving the generated pages, `PR_STATS_PAGES_PATH`.
    #[serde(default = "default_pages_path")]
    pub pages_path: PathBuf,

    /// Optional GitHub personal access token, `PR_STATS_GITHUB_TOKEN`.
    /// Falls back to `GITHUB_API_TOKEN`.
    pub github_token: Option<String>,
}

/// Unprefixed variables read alongside the prefixed ones.
#[derive(Deserialize)]
struct LegacyEnv {
    github_api_token: Option<String>,
}

fn default_repository() -> RepoId {
    RepoId {
        owner: "opencv".to_string(),
        repo: "opencv".to_string(),
    }
}

fn default_weeks() -> i64 {
    crate::dates::DEFAULT_ANALYSIS_WEEKS
}

fn default_pages_path() -> PathBuf {
    PathBuf::from(DEFAULT_PAGES_PATH)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        let mut config: AppConfig = envy::prefixed("PR_STATS_").from_env()?;
        if config.github_token.is_none() {
            let legacy: LegacyEnv = envy::from_env()?;
            config.github_token = legacy.github_api_token;
        }
        config.github_token = config.github_token.filter(|token| !token.trim().is_empty());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 5] = [
        "PR_STATS_REPOSITORY",
        "PR_STATS_WEEKS",
        "PR_STATS_PAGES_PATH",
        "PR_STATS_GITHUB_TOKEN",
        "GITHUB_API_TOKEN",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_repo_id() {
        let repo: RepoId = " opencv/opencv_contrib ".parse().unwrap();
        assert_eq!(repo.owner, "opencv");
        assert_eq!(repo.repo, "opencv_contrib");
        assert_eq!(repo.to_string(), "opencv/opencv_contrib");

        assert!("opencv".parse::<RepoId>().is_err());
        assert!("a/b/c".parse::<RepoId>().is_err());
        assert!("/opencv".parse::<RepoId>().is_err());
        assert!("../etc".parse::<RepoId>().is_err());
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();

        let config = AppConfig::from_env().expect("Failed to load config");

        assert_eq!(config.repository.to_string(), DEFAULT_REPOSITORY);
        assert_eq!(config.weeks, 12);
        assert_eq!(config.pages_path, PathBuf::from(DEFAULT_PAGES_PATH));
        assert_eq!(config.github_token, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        clear_env();
        env::set_var("PR_STATS_REPOSITORY", "owner1/repo1");
        env::set_var("PR_STATS_WEEKS", "4");
        env::set_var("PR_STATS_PAGES_PATH", "/tmp/pages");
        env::set_var("GITHUB_API_TOKEN", "legacy");

        let config = AppConfig::from_env().expect("Failed to load config");

        assert_eq!(config.repository.owner, "owner1");
        assert_eq!(config.repository.repo, "repo1");
        assert_eq!(config.weeks, 4);
        assert_eq!(config.pages_path, PathBuf::from("/tmp/pages"));
        assert_eq!(config.github_token.as_deref(), Some("legacy"));

        env::set_var("PR_STATS_GITHUB_TOKEN", "prefixed");
        let config = AppConfig::from_env().expect("Failed to load config");
        assert_eq!(config.github_token.as_deref(), Some("prefixed"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_invalid_values() {
        clear_env();
        env::set_var("PR_STATS_REPOSITORY", "not-a-repo");
        assert!(AppConfig::from_env().is_err());

        clear_env();
        env::set_var("PR_STATS_WEEKS", "many");
        assert!(AppConfig::from_env().is_err());

        clear_env();
    }
}
