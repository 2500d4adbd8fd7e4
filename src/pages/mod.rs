//! Report pages: Markdown pages with their SVG charts, and the `index.rst` title page.

mod age;
mod categories;
mod changes;
mod problems;
mod title;

pub use age::AgeDistributionPage;
pub use categories::CategoriesDistributionPage;
pub use changes::ChangesDistributionPage;
pub use problems::ProblematicPullRequestsPage;
pub use title::TitlePage;

use crate::model::PullRequest;
use crate::retrospective::RetrospectiveSnapshot;
use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::Path;

/// A report page. Statistics are gathered in `build` and rendered in `save`.
pub trait Page<'a> {
    fn build(
        &mut self,
        pull_requests: &'a [PullRequest],
        retrospective: &[RetrospectiveSnapshot<'a>],
    );

    /// Writes the page to `page_path` and its charts into `resources_path`.
    fn save(&self, page_path: &Path, resources_path: &Path) -> Result<()>;
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

pub(crate) fn write_chart(resources_path: &Path, name: &str, svg: &str) -> Result<()> {
    let path = resources_path.join(name);
    tracing::debug!(path = %path.display(), "Writing chart");
    write_file(&path, svg)
}

/// `[PR#123](url): title`
pub(crate) fn pull_request_link(pull_request: &PullRequest) -> String {
    format!(
        "[PR#{}]({}): {}",
        pull_request.number, pull_request.html_url, pull_request.title
    )
}

/// Renders items as `[a, b, c]`.
pub(crate) fn bracketed<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let items: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Separator written between consecutive entries of a listing.
pub(crate) fn separator(index: usize, len: usize) -> &'static str {
    if index + 1 < len {
        "---\n"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::pull_request;

    #[test]
    fn test_pull_request_link() {
        let pr = pull_request(42);
        assert_eq!(
            pull_request_link(&pr),
            "[PR#42](https://github.com/opencv/opencv/pull/42): Pull request 42"
        );
    }

    #[test]
    fn test_bracketed() {
        assert_eq!(bracketed(["core", "dnn"]), "[core, dnn]");
        assert_eq!(bracketed(Vec::<String>::new()), "[]");
    }

    #[test]
    fn test_separator_skips_last_entry() {
        assert_eq!(separator(0, 2), "---\n");
        assert_eq!(separator(1, 2), "");
    }
}
