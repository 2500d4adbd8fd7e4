//! Pull request model, mirroring the GitHub REST field names so that API responses
//! and the snapshot cache share one representation.

use crate::classify::{self, LabelKind};
use crate::dates::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub html_url: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Label {
    pub fn kind(&self) -> LabelKind {
        LabelKind::classify(&self.name)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// One side (head or base) of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    pub label: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

/// Link block that search results attach to issues which are pull requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestLink {
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ChangeKind {
    Addition,
    Deletion,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Addition => f.write_str("Additions"),
            ChangeKind::Deletion => f.write_str("Deletions"),
        }
    }
}

/// A file touched by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
}

impl ChangedFile {
    pub fn changes(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// Added and deleted line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeTotals {
    pub additions: u64,
    pub deletions: u64,
}

impl ChangeTotals {
    pub fn get(&self, kind: ChangeKind) -> u64 {
        match kind {
            ChangeKind::Addition => self.additions,
            ChangeKind::Deletion => self.deletions,
        }
    }

    pub fn total(&self) -> u64 {
        self.additions + self.deletions
    }

    fn record(&mut self, file: &ChangedFile) {
        self.additions += file.additions;
        self.deletions += file.deletions;
    }
}

/// Reference point for measuring pull request age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeReference {
    /// Whole days elapsed up to an instant.
    At(DateTime<Utc>),
    /// Calendar days between the creation date and a date.
    On(NaiveDate),
}

/// A pull request as returned by the GitHub API.
///
/// Identity is the pull request number: two values with the same number compare
/// equal and hash alike, whatever else differs between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub user: User,
    #[serde(default)]
    pub milestone: Option<Milestone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub requested_reviewers: Vec<User>,
    #[serde(default)]
    pub head: Option<BranchRef>,
    #[serde(default)]
    pub base: Option<BranchRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestLink>,
    #[serde(default)]
    pub changed_files: Option<Vec<ChangedFile>>,
}

impl PartialEq for PullRequest {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for PullRequest {}

impl Hash for PullRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

impl PullRequest {
    /// Age in days, never negative.
    pub fn age(&self, since: AgeReference) -> i64 {
        let days = match since {
            AgeReference::At(instant) => (instant - self.created_at).num_days(),
            AgeReference::On(date) => (date - self.created_at.date_naive()).num_days(),
        };
        days.max(0)
    }

    /// Days since the last update, never negative.
    pub fn last_update_age(&self, since: DateTime<Utc>) -> i64 {
        (since - self.updated_at).num_days().max(0)
    }

    /// Merge time, also looking at the link block attached to search results.
    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at.or_else(|| {
            self.pull_request
                .as_ref()
                .and_then(|link| link.merged_at)
        })
    }

    pub fn is_merged(&self) -> bool {
        self.merged_at().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn target_branch(&self) -> Option<&str> {
        self.base.as_ref().map(|base| base.ref_name.as_str())
    }

    pub fn reviewers_requested(&self) -> bool {
        !self.requested_reviewers.is_empty()
    }

    pub fn categories(&self) -> Vec<String> {
        classify::categorize(self).0
    }

    pub fn categories_auto_assigned(&self) -> bool {
        classify::categorize(self).1
    }

    pub fn labels_of(&self, kind: LabelKind) -> impl Iterator<Item = &Label> {
        self.labels.iter().filter(move |label| label.kind() == kind)
    }

    pub fn change_types(&self) -> impl Iterator<Item = &Label> {
        self.labels_of(LabelKind::ChangesType)
    }

    pub fn problems(&self) -> impl Iterator<Item = &Label> {
        self.labels_of(LabelKind::Problem)
    }

    pub fn effort_estimations(&self) -> impl Iterator<Item = &Label> {
        self.labels_of(LabelKind::EffortsEstimation)
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Label> {
        self.labels_of(LabelKind::Platform)
    }

    pub fn other_labels(&self) -> impl Iterator<Item = &Label> {
        self.labels_of(LabelKind::Other)
    }

    fn mentions(&self, word: &str) -> bool {
        self.title.to_lowercase().contains(word) || self.body().to_lowercase().contains(word)
    }

    /// Work in progress, judging by the title or the description.
    pub fn is_wip(&self) -> bool {
        self.mentions("wip")
    }

    pub fn is_reproducer(&self) -> bool {
        self.labels_of(LabelKind::Reproducer).next().is_some() || self.mentions("reproducer")
    }

    pub fn total_changes(&self) -> ChangeTotals {
        let mut totals = ChangeTotals::default();
        for file in self.changed_files.iter().flatten() {
            totals.record(file);
        }
        totals
    }

    /// Line changes grouped by the category of each changed file.
    pub fn changes_by_category(&self) -> BTreeMap<String, ChangeTotals> {
        let mut by_category: BTreeMap<String, ChangeTotals> = BTreeMap::new();
        for file in self.changed_files.iter().flatten() {
            by_category
                .entry(classify::categorize_path(&file.filename))
                .or_default()
                .record(file);
        }
        by_category
    }
}

/// Pull requests created and closed within a date range.
///
/// `closed` includes merged pull requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestsDiff {
    pub date_range: DateRange,
    pub created: Vec<PullRequest>,
    pub closed: Vec<PullRequest>,
}

impl PullRequestsDiff {
    pub fn new(date_range: DateRange, created: Vec<PullRequest>, closed: Vec<PullRequest>) -> Self {
        Self {
            date_range,
            created,
            closed,
        }
    }

    pub fn merged(&self) -> impl Iterator<Item = &PullRequest> {
        self.closed.iter().filter(|pr| pr.is_merged())
    }
}
