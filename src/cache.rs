//! Flat JSON snapshot of one download, so pages can be regenerated offline.

use crate::model::{PullRequest, PullRequestsDiff};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache file {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
struct CacheRef<'a> {
    pull_requests: &'a [PullRequest],
    diff: &'a PullRequestsDiff,
}

#[derive(Deserialize)]
struct CacheContents {
    pull_requests: Vec<PullRequest>,
    diff: PullRequestsDiff,
}

/// `{"pull_requests": [...], "diff": {"date_range": ..., "created": [...], "closed": [...]}}`
#[derive(Debug, Clone)]
pub struct PullRequestsCache {
    path: PathBuf,
}

impl PullRequestsCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(
        &self,
        pull_requests: &[PullRequest],
        diff: &PullRequestsDiff,
    ) -> Result<(), CacheError> {
        let file = File::create(&self.path).map_err(|source| self.io_error(source))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(
            &mut writer,
            &CacheRef {
                pull_requests,
                diff,
            },
        )
        .map_err(|source| self.json_error(source))?;
        writer.flush().map_err(|source| self.io_error(source))?;

        tracing::info!(path = %self.path.display(), "Pull requests are saved");
        Ok(())
    }

    pub fn load(&self) -> Result<(Vec<PullRequest>, PullRequestsDiff), CacheError> {
        tracing::info!(path = %self.path.display(), "Loading pull requests from cache");
        let file = File::open(&self.path).map_err(|source| self.io_error(source))?;
        let contents: CacheContents = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| self.json_error(source))?;
        Ok((contents.pull_requests, contents.diff))
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> CacheError {
        CacheError::Json {
            path: self.path.clone(),
            source,
        }
    }
}
