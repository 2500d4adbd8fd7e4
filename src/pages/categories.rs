use super::{bracketed, pull_request_link, separator, write_chart, write_file, Page};
use crate::chart;
use crate::model::PullRequest;
use crate::retrospective::RetrospectiveSnapshot;
use crate::stats::{CategoriesDistribution, Stat};
use anyhow::Result;
use std::fmt::{self, Write};
use std::path::Path;

const CATEGORIES_CHART: &str = "categories_distribution.svg";

pub struct CategoriesDistributionPage<'a> {
    categories: CategoriesDistribution<'a>,
}

impl<'a> CategoriesDistributionPage<'a> {
    pub fn new() -> Self {
        Self {
            categories: CategoriesDistribution::new(),
        }
    }

    fn render(&self) -> Result<String> {
        let mut page = String::new();
        writeln!(page, "# Categories distribution")?;
        writeln!(page, "## Overview")?;
        writeln!(
            page,
            "Total percentage may exceed 100%, because several categories may be assigned to 1 pull request."
        )?;
        writeln!(page, "![Categories distribution plot](_static/{CATEGORIES_CHART})")?;
        writeln!(page, "## Pull requests with auto assigned categories")?;
        writeln!(page, "Categories are assigned based on path of the changed files.")?;
        writeln!(page)?;

        let auto_assigned = &self.categories.with_auto_assigned_categories;
        for (i, pr) in auto_assigned.iter().enumerate() {
            writeln!(page, " - {}<br/>", pull_request_link(pr))?;
            writeln!(page, "   __Assigned categories__: {}", bracketed(pr.categories()))?;
            page.push_str(separator(i, auto_assigned.len()));
        }
        Ok(page)
    }

    fn chart(&self) -> Result<String, fmt::Error> {
        let total = self.categories.total_pull_requests;
        let bars: Vec<(String, f64)> = self
            .categories
            .counts()
            .into_iter()
            .map(|(category, count)| (category, count as f64))
            .collect();
        chart::bar_chart(
            "Categories distribution",
            &bars,
            chart::DENIM_BLUE,
            Some(chart::HIGHLIGHT_RED),
            |count| {
                if total == 0 {
                    format!("{count}")
                } else {
                    format!("{count} ({})", chart::percent(count / total as f64))
                }
            },
        )
    }
}

impl<'a> Default for CategoriesDistributionPage<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Page<'a> for CategoriesDistributionPage<'a> {
    fn build(
        &mut self,
        pull_requests: &'a [PullRequest],
        _retrospective: &[RetrospectiveSnapshot<'a>],
    ) {
        self.categories.build(pull_requests);
    }

    fn save(&self, page_path: &Path, resources_path: &Path) -> Result<()> {
        write_chart(resources_path, CATEGORIES_CHART, &self.chart()?)?;
        write_file(page_path, &self.render()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{changed_file, label, pull_request};

    #[test]
    fn test_lists_auto_assigned_pull_requests() {
        let mut labelled = pull_request(1);
        labelled.labels = vec![label("category: dnn")];
        let mut derived = pull_request(2);
        derived.changed_files = Some(vec![
            changed_file("modules/python/test/test.py", 3, 0),
            changed_file("doc/tutorials/intro.markdown", 1, 1),
        ]);
        let prs = vec![labelled, derived];

        let mut page = CategoriesDistributionPage::new();
        page.build(&prs, &[]);
        let rendered = page.render().unwrap();

        assert!(rendered.contains(" - [PR#2]"));
        assert!(!rendered.contains(" - [PR#1]"));
        assert!(rendered.contains("__Assigned categories__: [documentation, python bindings]"));
    }

    #[test]
    fn test_chart_shows_share_of_total() {
        let mut first = pull_request(1);
        first.labels = vec![label("category: core")];
        let mut second = pull_request(2);
        second.labels = vec![label("category: core"), label("category: dnn")];
        let prs = vec![first, second];

        let mut page = CategoriesDistributionPage::new();
        page.build(&prs, &[]);
        let svg = page.chart().unwrap();

        assert!(svg.contains("2 (100.0%)"));
        assert!(svg.contains("1 (50.0%)"));
        assert!(svg.contains(chart::HIGHLIGHT_RED));
    }
}
