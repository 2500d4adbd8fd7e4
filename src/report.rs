//! The report pipeline: load pull requests, rebuild the history, write the pages.

use crate::cache::PullRequestsCache;
use crate::cli::{DataSource, RunOptions};
use crate::config::RepoId;
use crate::dates::{analysis_range, utc_now, DateRange, DEFAULT_STEP_WEEKS};
use crate::github::GitHubClient;
use crate::model::{Label, PullRequest, PullRequestsDiff};
use crate::pages::{
    AgeDistributionPage, CategoriesDistributionPage, ChangesDistributionPage, Page,
    ProblematicPullRequestsPage, TitlePage,
};
use crate::retrospective::{build_retrospective, RetrospectiveSnapshot};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::collections::BTreeMap;
use std::path::Path;

/// Directory under the pages path receiving the charts.
pub const RESOURCES_DIR: &str = "_static";

pub const INDEX_PAGE: &str = "index.rst";

/// Downloads the open pull requests and the diff of `date_range`, one request at a time.
pub async fn download(
    client: &GitHubClient,
    repo: &RepoId,
    date_range: DateRange,
    load_files: bool,
) -> Result<(Vec<PullRequest>, PullRequestsDiff)> {
    client.check_repository(repo).await?;
    log_labels(&client.fetch_labels(repo).await?);

    let pull_requests = client.fetch_open_pull_requests(repo, load_files).await?;
    let diff = client.fetch_pull_requests_diff(repo, date_range).await?;

    if let Err(e) = client.log_rate_limit().await {
        tracing::warn!("Failed to query the rate limit: {:#}", e);
    }
    Ok((pull_requests, diff))
}

fn log_labels(labels: &[Label]) {
    let mut by_kind = BTreeMap::new();
    for label in labels {
        *by_kind.entry(label.kind()).or_insert(0usize) += 1;
    }
    tracing::info!(count = labels.len(), "Repository labels are loaded");
    for (kind, count) in by_kind {
        tracing::debug!(kind = ?kind, count, "Labels by kind");
    }
}

pub fn log_summary(pull_requests: &[PullRequest], diff: &PullRequestsDiff) {
    tracing::info!("{} pull requests for analysis", pull_requests.len());
    tracing::info!("Diff stats for {}", diff.date_range);
    tracing::info!("{} merged pull requests", diff.merged().count());
    tracing::info!("{} closed pull requests", diff.closed.len());
    tracing::info!("{} created pull requests", diff.created.len());
}

/// Weekly history of the open set. Fails when the diff has no date range.
pub fn reconstruct_history<'a>(
    pull_requests: &'a [PullRequest],
    diff: &'a PullRequestsDiff,
) -> Result<Vec<RetrospectiveSnapshot<'a>>> {
    build_retrospective(pull_requests, diff, Duration::weeks(DEFAULT_STEP_WEEKS))
        .context("Failed to rebuild the pull request history")
}

/// Builds and writes every page plus `index.rst` into `pages_path`, charts into `_static`.
pub fn build_pages<'a>(
    repository: &str,
    pull_requests: &'a [PullRequest],
    retrospective: &[RetrospectiveSnapshot<'a>],
    pages_path: &Path,
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let generated_at = generated_at.trunc_subsecs(0);
    let resources_path = pages_path.join(RESOURCES_DIR);
    std::fs::create_dir_all(&resources_path)
        .with_context(|| format!("Failed to create {}", resources_path.display()))?;

    tracing::info!(%generated_at, "Building pages...");
    let mut pages: Vec<(&str, Box<dyn Page<'a> + 'a>)> = Vec::new();
    pages.push((
        "problems_distribution_page",
        Box::new(ProblematicPullRequestsPage::new()),
    ));
    pages.push((
        "age_distribution_page",
        Box::new(AgeDistributionPage::new(generated_at)),
    ));
    pages.push((
        "changes_distribution_page",
        Box::new(ChangesDistributionPage::new()),
    ));
    pages.push((
        "categories_distribution_page",
        Box::new(CategoriesDistributionPage::new()),
    ));
    for (_, page) in pages.iter_mut() {
        page.build(pull_requests, retrospective);
    }

    tracing::info!("Writing pages....");
    for (name, page) in &pages {
        let page_path = pages_path.join(format!("{name}.md"));
        page.save(&page_path, &resources_path)
            .with_context(|| format!("Failed to write page {name}"))?;
    }

    tracing::info!("Building {}....", INDEX_PAGE);
    let names = pages.iter().map(|(name, _)| name.to_string()).collect();
    let mut title = TitlePage::new(repository, generated_at, names);
    title.build(pull_requests, retrospective);
    title
        .save(&pages_path.join(INDEX_PAGE), &resources_path)
        .context("Failed to write the title page")?;

    tracing::info!(path = %pages_path.display(), "Done");
    Ok(())
}

/// Runs one report: load, optionally cache, rebuild the history, write the pages.
pub async fn run(options: RunOptions) -> Result<()> {
    let now = utc_now();
    let (pull_requests, diff) = match &options.source {
        DataSource::Cache(path) => PullRequestsCache::new(path).load()?,
        DataSource::GitHub { token, load_files } => {
            let client = GitHubClient::new(token.clone())?;
            let date_range = analysis_range(now, options.weeks)?;
            download(&client, &options.repository, date_range, *load_files).await?
        }
    };

    if let Some(path) = &options.save_cache {
        PullRequestsCache::new(path).save(&pull_requests, &diff)?;
    }

    log_summary(&pull_requests, &diff);
    let retrospective = reconstruct_history(&pull_requests, &diff)?;
    build_pages(
        &options.repository.to_string(),
        &pull_requests,
        &retrospective,
        &options.pages_path,
        now,
    )
}
