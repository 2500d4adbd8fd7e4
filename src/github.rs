use crate::config::RepoId;
use crate::dates::DateRange;
use crate::model::{ChangedFile, Label, PullRequest, PullRequestsDiff};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Date format accepted by the search API qualifiers.
pub const SEARCH_DATE_FORMAT: &str = "%Y-%m-%d";

const PER_PAGE: u8 = 100;

/// The search API never returns more than this many results for one query.
const SEARCH_RESULT_LIMIT: u64 = 1000;

/// Remaining calls below which the rate limit is reported as a warning.
const LOW_RATE_LIMIT: usize = 10;

#[derive(Serialize)]
struct ListParams {
    per_page: u8,
}

#[derive(Serialize)]
struct SearchParams<'q> {
    q: &'q str,
    per_page: u8,
}

/// Search qualifier selecting pull requests by the date of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    Created,
    Closed,
}

impl SearchEvent {
    fn qualifier(self) -> &'static str {
        match self {
            SearchEvent::Created => "created",
            SearchEvent::Closed => "closed",
        }
    }
}

/// `repo:owner/name type:pr <event>:<start>..<end>`
pub fn search_query(
    repo: &RepoId,
    event: SearchEvent,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    format!(
        "repo:{repo} type:pr {}:{}..{}",
        event.qualifier(),
        start.format(SEARCH_DATE_FORMAT),
        end.format(SEARCH_DATE_FORMAT)
    )
}

/// Sequential, paginated access to the GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token);
        }

        Ok(Self {
            octocrab: builder.build()?,
        })
    }

    /// Fails when the repository does not exist or is not visible with the current token.
    pub async fn check_repository(&self, repo: &RepoId) -> Result<()> {
        let repository = self
            .octocrab
            .repos(&repo.owner, &repo.repo)
            .get()
            .await
            .with_context(|| format!("Failed to load repository {repo}"))?;
        tracing::info!(
            repository = %repo,
            full_name = repository.full_name.as_deref().unwrap_or_default(),
            "Repository found"
        );
        Ok(())
    }

    /// Every page of `route`, in order.
    async fn get_all<T, P>(&self, route: &str, params: &P) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        tracing::debug!(route, "Paginated get");
        let mut current_page: Page<T> = self.octocrab.get(route, Some(params)).await?;

        if let Some(total) = current_page.total_count {
            if total > SEARCH_RESULT_LIMIT {
                tracing::warn!(
                    route,
                    total,
                    "Search matched more than {} results, the rest are not returned",
                    SEARCH_RESULT_LIMIT
                );
            }
        }

        let mut items = current_page.take_items();
        let mut page_count = 1;

        while let Some(mut next_page) = self.octocrab.get_page::<T>(&current_page.next).await? {
            page_count += 1;
            tracing::debug!(route, page = page_count, "Fetched page");
            items.extend(next_page.take_items());
            current_page = next_page;
        }

        Ok(items)
    }

    /// Currently open pull requests, with their changed files when `load_files` is set.
    pub async fn fetch_open_pull_requests(
        &self,
        repo: &RepoId,
        load_files: bool,
    ) -> Result<Vec<PullRequest>> {
        tracing::info!(repository = %repo, "Loading pull requests with \"open\" state");
        let route = format!("/repos/{}/{}/pulls", repo.owner, repo.repo);
        let mut pull_requests: Vec<PullRequest> = self
            .get_all(&route, &ListParams { per_page: PER_PAGE })
            .await
            .context("Failed to load open pull requests")?;
        tracing::info!(count = pull_requests.len(), "Pull requests are loaded");

        if load_files {
            tracing::info!("Loading changed files for pull requests...");
            for pull_request in &mut pull_requests {
                let files = self.fetch_changed_files(repo, pull_request.number).await?;
                pull_request.changed_files = Some(files);
            }
            tracing::info!("Pull requests files are loaded");
        }
        Ok(pull_requests)
    }

    pub async fn fetch_changed_files(&self, repo: &RepoId, number: u64) -> Result<Vec<ChangedFile>> {
        tracing::debug!(number, "Loading files");
        let route = format!("/repos/{}/{}/pulls/{}/files", repo.owner, repo.repo, number);
        self.get_all(&route, &ListParams { per_page: PER_PAGE })
            .await
            .with_context(|| format!("Failed to load files of pull request #{number}"))
    }

    /// Pull requests created and closed within `date_range`. An empty range yields an
    /// empty diff without querying the API.
    pub async fn fetch_pull_requests_diff(
        &self,
        repo: &RepoId,
        date_range: DateRange,
    ) -> Result<PullRequestsDiff> {
        let Some((start, end)) = date_range.bounds() else {
            tracing::info!("Empty date range, skipping diff download");
            return Ok(PullRequestsDiff::default());
        };

        tracing::info!(range = %date_range, "Loading diff");
        let created = self
            .search_pull_requests(repo, SearchEvent::Created, start, end)
            .await?;
        let closed = self
            .search_pull_requests(repo, SearchEvent::Closed, start, end)
            .await?;
        Ok(PullRequestsDiff::new(date_range, created, closed))
    }

    async fn search_pull_requests(
        &self,
        repo: &RepoId,
        event: SearchEvent,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PullRequest>> {
        let query = search_query(repo, event, start, end);
        tracing::info!(query = %query, "Searching pull requests");
        let pull_requests: Vec<PullRequest> = self
            .get_all(
                "/search/issues",
                &SearchParams {
                    q: &query,
                    per_page: PER_PAGE,
                },
            )
            .await
            .with_context(|| format!("Search failed: {query}"))?;
        tracing::debug!(
            event = event.qualifier(),
            count = pull_requests.len(),
            "Found pull requests"
        );
        Ok(pull_requests)
    }

    pub async fn fetch_labels(&self, repo: &RepoId) -> Result<Vec<Label>> {
        tracing::info!(repository = %repo, "Loading labels...");
        let route = format!("/repos/{}/{}/labels", repo.owner, repo.repo);
        self.get_all(&route, &ListParams { per_page: PER_PAGE })
            .await
            .context("Failed to load labels")
    }

    /// Logs the remaining core and search quota.
    pub async fn log_rate_limit(&self) -> Result<()> {
        let limits = self.octocrab.ratelimit().get().await?;
        for (resource, rate) in [
            ("core", &limits.resources.core),
            ("search", &limits.resources.search),
        ] {
            let reset_at = DateTime::<Utc>::from_timestamp(rate.reset as i64, 0);
            let reset_at = reset_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_else(|| rate.reset.to_string());
            if rate.remaining < LOW_RATE_LIMIT {
                tracing::warn!(
                    resource,
                    remaining = rate.remaining,
                    reset_at = %reset_at,
                    "GitHub API calls are running out"
                );
            } else {
                tracing::info!(
                    resource,
                    remaining = rate.remaining,
                    limit = rate.limit,
                    reset_at = %reset_at,
                    "GitHub API rate limit"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_search_query() {
        let repo: RepoId = "opencv/opencv".parse().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 13, 45, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 25, 8, 0, 0).unwrap();

        assert_eq!(
            search_query(&repo, SearchEvent::Created, start, end),
            "repo:opencv/opencv type:pr created:2024-01-01..2024-03-25"
        );
        assert_eq!(
            search_query(&repo, SearchEvent::Closed, start, end),
            "repo:opencv/opencv type:pr closed:2024-01-01..2024-03-25"
        );
    }

    #[test]
    fn test_search_params_encode_query() {
        let params = SearchParams {
            q: "repo:a/b type:pr",
            per_page: PER_PAGE,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["q"], "repo:a/b type:pr");
        assert_eq!(json["per_page"], 100);
    }

    #[tokio::test]
    async fn test_empty_range_skips_api() {
        let client = GitHubClient::new(None).unwrap();
        let repo: RepoId = "opencv/opencv".parse().unwrap();
        let diff = client
            .fetch_pull_requests_diff(&repo, DateRange::empty())
            .await
            .unwrap();
        assert!(diff.date_range.is_empty());
        assert!(diff.created.is_empty());
        assert!(diff.closed.is_empty());
    }
}
