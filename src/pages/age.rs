use super::{bracketed, pull_request_link, separator, write_chart, write_file, Page};
use crate::chart::{self, Series};
use crate::model::{AgeReference, PullRequest};
use crate::retrospective::RetrospectiveSnapshot;
use crate::stats::{AgeDistribution, HistoricalAgeDistribution, HistoricalStat, Stat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use std::path::Path;

pub const TOTAL_AGE_CHART: &str = "total_age_distribution.svg";
const CATEGORIES_AGE_CHART: &str = "categories_age_distribution.svg";
const HISTORICAL_AGE_CHART: &str = "historical_age_distribution.svg";

/// Age of the open pull requests, now and over the analysed weeks.
pub struct AgeDistributionPage<'a> {
    ages: AgeDistribution<'a>,
    historical: HistoricalAgeDistribution,
}

impl<'a> AgeDistributionPage<'a> {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            ages: AgeDistribution::new(AgeReference::At(now)),
            historical: HistoricalAgeDistribution::new(),
        }
    }

    fn render(&self) -> Result<String> {
        let mut page = String::new();
        let ages: Vec<i64> = self.ages.ages().collect();

        writeln!(page, "# Age distribution")?;
        writeln!(page, "## Overview")?;
        match (mean(&ages), median(&ages)) {
            (Some(mean), Some(median)) => {
                writeln!(page, " - Average age of the pull requests: {mean} days")?;
                writeln!(page, " - Median age of the pull requests: {median} days")?;
            }
            _ => writeln!(page, " - There are no open pull requests")?,
        }
        writeln!(page)?;
        writeln!(page, "### Current age distribution")?;
        writeln!(page, "![Age distribution](_static/{TOTAL_AGE_CHART})")?;
        writeln!(page, "### Historical age distribution")?;
        writeln!(page, "![Historical age distribution](_static/{HISTORICAL_AGE_CHART})")?;
        writeln!(page, "## Age distribution by categories")?;
        writeln!(page, "![Age distribution by categories](_static/{CATEGORIES_AGE_CHART})")?;
        writeln!(page, "## Age distribution by age categories")?;

        for (label, entries) in self.ages.buckets() {
            writeln!(page, "### Pull Requests with age: {label}")?;
            for (i, entry) in entries.iter().enumerate() {
                let pr = entry.pull_request;
                writeln!(page, " - {}<br/>", pull_request_link(pr))?;
                writeln!(
                    page,
                    "   __Age__: {} day{}<br/>",
                    entry.age,
                    if entry.age == 1 { "" } else { "s" }
                )?;
                writeln!(page, "   __Labels__: {}<br/>", bracketed(&pr.labels))?;
                writeln!(page, "   __Categories__: {}", bracketed(pr.categories()))?;
                page.push_str(separator(i, entries.len()));
            }
        }
        Ok(page)
    }

    fn total_chart(&self) -> Result<String, fmt::Error> {
        let segments: Vec<(String, f64)> = self
            .ages
            .labels()
            .iter()
            .cloned()
            .zip(self.ages.counts().into_iter().map(|count| count as f64))
            .collect();
        chart::horizontal_stacked_bar(
            "Pull Requests",
            &segments,
            &chart::green_to_red(segments.len()),
            |value, _| format!("{value}"),
        )
    }

    fn categories_chart(&self) -> Result<String, fmt::Error> {
        let labels = self.ages.labels();
        let by_category = self.ages.by_category();
        let categories: Vec<String> = by_category.keys().cloned().collect();
        let series: Vec<Series> = labels
            .iter()
            .enumerate()
            .map(|(bucket, label)| {
                Series::new(
                    label.clone(),
                    by_category
                        .values()
                        .map(|buckets| buckets[bucket].len() as f64)
                        .collect(),
                )
            })
            .collect();
        chart::stacked_columns(
            "Age distribution by categories",
            &categories,
            &series,
            &chart::green_to_red(labels.len()),
            true,
        )
    }

    fn historical_chart(&self) -> Result<String, fmt::Error> {
        let labels = self.historical.labels();
        let distribution = self.historical.distribution();
        let dates: Vec<String> = distribution.keys().map(|date| date.to_string()).collect();
        let series: Vec<Series> = labels
            .iter()
            .enumerate()
            .map(|(bucket, label)| {
                Series::new(
                    label.clone(),
                    distribution
                        .values()
                        .map(|counts| counts[bucket] as f64)
                        .collect(),
                )
            })
            .collect();
        chart::line_chart(
            "Historical age distribution",
            &dates,
            &series,
            &chart::green_to_red(labels.len()),
            true,
            "Pull Requests",
        )
    }
}

impl<'a> Page<'a> for AgeDistributionPage<'a> {
    fn build(
        &mut self,
        pull_requests: &'a [PullRequest],
        retrospective: &[RetrospectiveSnapshot<'a>],
    ) {
        self.ages.build(pull_requests);
        self.historical.build(retrospective);
    }

    fn save(&self, page_path: &Path, resources_path: &Path) -> Result<()> {
        write_chart(resources_path, TOTAL_AGE_CHART, &self.total_chart()?)?;
        write_chart(resources_path, CATEGORIES_AGE_CHART, &self.categories_chart()?)?;
        write_chart(resources_path, HISTORICAL_AGE_CHART, &self.historical_chart()?)?;
        write_file(page_path, &self.render()?)
    }
}

/// Integer part of the mean.
fn mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() / values.len() as i64)
}

/// Integer part of the median; even-sized inputs average the two middle values.
fn median(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{label, pull_request};
    use chrono::TimeZone;

    #[test]
    fn test_mean_and_median() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(mean(&[1, 2, 10]), Some(4));
        assert_eq!(median(&[10, 1, 2]), Some(2));
        assert_eq!(median(&[1, 2, 3, 10]), Some(2));
    }

    #[test]
    fn test_render_lists_pull_requests_by_age() {
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 10, 0, 0).unwrap();
        let mut young = pull_request(1);
        young.labels = vec![label("category: core")];
        let prs = vec![young];

        let mut page = AgeDistributionPage::new(now);
        page.build(&prs, &[]);
        let rendered = page.render().unwrap();

        assert!(rendered.starts_with("# Age distribution\n## Overview\n"));
        assert!(rendered.contains(" - Average age of the pull requests: 10 days\n"));
        assert!(rendered.contains("### Pull Requests with age: 7-14 days\n - [PR#1]"));
        assert!(rendered.contains("   __Labels__: [category: core]<br/>\n"));
        assert!(rendered.contains("   __Categories__: [core]\n"));
    }

    #[test]
    fn test_render_without_pull_requests() {
        let page = AgeDistributionPage::new(Utc::now());
        let rendered = page.render().unwrap();
        assert!(rendered.contains("There are no open pull requests"));
        assert!(rendered.contains("### Pull Requests with age: > 365 days\n"));
    }
}
