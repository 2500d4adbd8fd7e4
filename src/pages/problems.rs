use super::{pull_request_link, write_file, Page};
use crate::model::PullRequest;
use crate::retrospective::RetrospectiveSnapshot;
use crate::stats::{ProblematicPullRequests, Stat};
use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

/// Markup stripped from descriptions so they render inside a code block.
const CLEANUP: [(&str, &str); 5] = [
    ("`", ""),
    ("### ", ""),
    ("## ", ""),
    ("<!--", ""),
    ("-->", ""),
];

fn cleanup(line: &str) -> String {
    CLEANUP
        .iter()
        .fold(line.to_string(), |line, &(from, to)| line.replace(from, to))
}

/// Reproducers, work in progress and pull requests with problem labels.
#[derive(Default)]
pub struct ProblematicPullRequestsPage<'a> {
    problems: ProblematicPullRequests<'a>,
}

impl<'a> ProblematicPullRequestsPage<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self) -> Result<String> {
        let mut page = String::new();
        writeln!(page, "# Problematic pull requests")?;
        writeln!(page, "## Stable reproducers")?;
        for pr in &self.problems.reproducers {
            write_entry(&mut page, pr, true)?;
        }

        writeln!(page, "## WIP")?;
        for pr in &self.problems.wip {
            write_entry(&mut page, pr, false)?;
        }

        for (problem, pull_requests) in &self.problems.distribution {
            writeln!(page, "## Problem: {problem}")?;
            for pr in pull_requests {
                write_entry(&mut page, pr, true)?;
            }
        }
        Ok(page)
    }
}

fn write_entry(page: &mut String, pr: &PullRequest, with_description: bool) -> Result<()> {
    writeln!(page, " - {}", pull_request_link(pr))?;
    writeln!(page)?;
    if with_description {
        writeln!(page, "   __Description__:<br/>")?;
        writeln!(page, "```")?;
        for line in pr.body().lines() {
            writeln!(page, "{}", cleanup(line))?;
        }
        writeln!(page, "```")?;
    }
    Ok(())
}

impl<'a> Page<'a> for ProblematicPullRequestsPage<'a> {
    fn build(
        &mut self,
        pull_requests: &'a [PullRequest],
        _retrospective: &[RetrospectiveSnapshot<'a>],
    ) {
        self.problems.build(pull_requests);
    }

    fn save(&self, page_path: &Path, _resources_path: &Path) -> Result<()> {
        write_file(page_path, &self.render()?)
    }
}
