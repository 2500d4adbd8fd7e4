use super::{write_chart, write_file, Page};
use crate::chart::{self, Series};
use crate::model::{ChangeKind, ChangeTotals, PullRequest};
use crate::retrospective::RetrospectiveSnapshot;
use crate::stats::{ChangesDistribution, Stat};
use anyhow::Result;
use std::fmt::{self, Write};
use std::path::Path;

const TOTAL_CHANGES_CHART: &str = "total_changes_distribution.svg";
const RELATIVE_CHANGES_CHART: &str = "relative_changes_distribution.svg";
const ABSOLUTE_CHANGES_CHART: &str = "absolute_changes_distribution.svg";

const CHANGE_COLORS: [&str; 2] = [chart::ADDITIONS_GREEN, chart::HIGHLIGHT_RED];

/// Line additions and deletions per module.
#[derive(Default)]
pub struct ChangesDistributionPage {
    changes: ChangesDistribution,
}

impl ChangesDistributionPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self) -> Result<String> {
        let mut page = String::new();
        writeln!(page, "# Changes distribution")?;
        writeln!(page, "## Overview")?;

        let most_deletions = self.changes.max_by(|totals| totals.deletions);
        let most_additions = self.changes.max_by(|totals| totals.additions);
        let most_changes = self.changes.max_by(ChangeTotals::total);
        match (most_deletions, most_additions, most_changes) {
            (Some(deletions), Some(additions), Some(changes)) => {
                writeln!(
                    page,
                    " - Most deletions refer to module: {} with {} line deletions",
                    deletions.0, deletions.1.deletions
                )?;
                writeln!(
                    page,
                    " - Most additions refer to module: {} with {} line additions",
                    additions.0, additions.1.additions
                )?;
                writeln!(
                    page,
                    " - Most changes refer to module: {} with {} line changes",
                    changes.0,
                    changes.1.total()
                )?;
            }
            _ => writeln!(page, " - No changed files were loaded")?,
        }

        writeln!(page, "![Total changes distribution](_static/{TOTAL_CHANGES_CHART})")?;
        writeln!(page, "## Changes distribution between the modules")?;
        writeln!(
            page,
            "![Changes distribution between the modules](_static/{RELATIVE_CHANGES_CHART})"
        )?;
        writeln!(page, "## Changes distribution in absolute values")?;
        writeln!(
            page,
            "![Changes distribution in absolute values](_static/{ABSOLUTE_CHANGES_CHART})"
        )?;
        Ok(page)
    }

    fn total_chart(&self) -> Result<String, fmt::Error> {
        let totals = self.changes.totals();
        let segments: Vec<(String, f64)> = [ChangeKind::Addition, ChangeKind::Deletion]
            .into_iter()
            .map(|kind| (kind.to_string(), totals.get(kind) as f64))
            .collect();
        chart::horizontal_stacked_bar("Total", &segments, &CHANGE_COLORS, |value, share| {
            format!("{value} ({})", chart::percent(share))
        })
    }

    fn relative_chart(&self) -> Result<String, fmt::Error> {
        let modules: Vec<String> = self.changes.distribution.keys().cloned().collect();
        let series: Vec<Series> = [ChangeKind::Addition, ChangeKind::Deletion]
            .into_iter()
            .map(|kind| {
                Series::new(
                    kind.to_string(),
                    self.changes
                        .distribution
                        .values()
                        .map(|totals| totals.get(kind) as f64)
                        .collect(),
                )
            })
            .collect();
        chart::stacked_columns(
            "Changes distribution between the modules",
            &modules,
            &series,
            &CHANGE_COLORS,
            true,
        )
    }

    fn absolute_chart(&self) -> Result<String, fmt::Error> {
        let mut bars: Vec<(String, f64)> = self
            .changes
            .distribution
            .iter()
            .map(|(module, totals)| (module.clone(), totals.total() as f64))
            .collect();
        bars.sort_by(|a, b| b.1.total_cmp(&a.1));
        chart::bar_chart(
            "Number of changed lines",
            &bars,
            chart::DENIM_BLUE,
            None,
            |value| format!("{value}"),
        )
    }
}

impl<'a> Page<'a> for ChangesDistributionPage {
    fn build(
        &mut self,
        pull_requests: &'a [PullRequest],
        _retrospective: &[RetrospectiveSnapshot<'a>],
    ) {
        self.changes.build(pull_requests);
    }

    fn save(&self, page_path: &Path, resources_path: &Path) -> Result<()> {
        write_chart(resources_path, TOTAL_CHANGES_CHART, &self.total_chart()?)?;
        write_chart(resources_path, RELATIVE_CHANGES_CHART, &self.relative_chart()?)?;
        write_chart(resources_path, ABSOLUTE_CHANGES_CHART, &self.absolute_chart()?)?;
        write_file(page_path, &self.render()?)
    }
}
