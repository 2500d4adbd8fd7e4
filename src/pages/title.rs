use super::age::TOTAL_AGE_CHART;
use super::{write_chart, write_file, Page};
use crate::chart::{self, Series};
use crate::model::PullRequest;
use crate::retrospective::RetrospectiveSnapshot;
use crate::stats::{HistoricalClosedOpenDistribution, HistoricalStat};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use std::path::Path;

const TREND_CHART: &str = "historical_changes.svg";

/// The `index.rst` entry page: headline charts and a toctree of the other pages.
pub struct TitlePage {
    repository: String,
    generated_at: DateTime<Utc>,
    pages: Vec<String>,
    trend: HistoricalClosedOpenDistribution,
}

impl TitlePage {
    pub fn new(repository: impl Into<String>, generated_at: DateTime<Utc>, pages: Vec<String>) -> Self {
        Self {
            repository: repository.into(),
            generated_at,
            pages,
            trend: HistoricalClosedOpenDistribution::new(),
        }
    }

    fn render(&self) -> Result<String> {
        let mut index = String::new();
        heading(
            &mut index,
            &format!("Welcome to {} pull requests statistics page!", self.repository),
            '=',
        )?;
        writeln!(
            index,
            "Updated {} UTC",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(index)?;
        heading(&mut index, "Current Pull Requests age distribution", '-')?;
        writeln!(index, ".. image:: _static/{TOTAL_AGE_CHART}")?;
        writeln!(index)?;
        heading(&mut index, "Pull Requests trend", '-')?;
        writeln!(index, ".. image:: _static/{TREND_CHART}")?;
        writeln!(index)?;
        heading(&mut index, "Pages", '-')?;
        writeln!(index)?;
        writeln!(index, ".. toctree::")?;
        writeln!(index, "  :maxdepth: 3")?;
        writeln!(index)?;
        for page in &self.pages {
            writeln!(index, "  {page}")?;
        }
        Ok(index)
    }

    fn trend_chart(&self) -> Result<String, fmt::Error> {
        let rows = self.trend.sorted_by_date();
        let dates: Vec<String> = rows.iter().map(|row| row.date.to_string()).collect();
        let series = vec![
            Series::new("Open", rows.iter().map(|row| row.open as f64).collect()),
            Series::new("Created", rows.iter().map(|row| row.created as f64).collect()),
            Series::new("Closed", rows.iter().map(|row| row.closed as f64).collect()),
        ];
        chart::line_chart(
            "Pull Requests trend",
            &dates,
            &series,
            &[chart::DENIM_BLUE, chart::MEDIUM_GREEN, chart::RED_ORANGE],
            false,
            "Pull Requests",
        )
    }
}

/// reStructuredText section title underlined to its own length.
fn heading(out: &mut String, title: &str, underline: char) -> Result<()> {
    writeln!(out, "{title}")?;
    writeln!(
        out,
        "{}",
        underline.to_string().repeat(title.chars().count())
    )?;
    Ok(())
}

impl<'a> Page<'a> for TitlePage {
    fn build(
        &mut self,
        _pull_requests: &'a [PullRequest],
        retrospective: &[RetrospectiveSnapshot<'a>],
    ) {
        self.trend.build(retrospective);
    }

    fn save(&self, page_path: &Path, resources_path: &Path) -> Result<()> {
        write_chart(resources_path, TREND_CHART, &self.trend_chart()?)?;
        write_file(page_path, &self.render()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_index() {
        let generated_at = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        let page = TitlePage::new(
            "opencv/opencv",
            generated_at,
            vec![
                "age_distribution_page".to_string(),
                "problems_distribution_page".to_string(),
            ],
        );
        let index = page.render().unwrap();

        let title = "Welcome to opencv/opencv pull requests statistics page!";
        assert!(index.starts_with(&format!("{title}\n{}\n", "=".repeat(title.len()))));
        assert!(index.contains("Updated 2024-03-04 05:06:07 UTC\n"));
        assert!(index.contains("Pull Requests trend\n-------------------\n"));
        assert!(index.contains(".. image:: _static/historical_changes.svg\n"));
        assert!(index.ends_with(
            ".. toctree::\n  :maxdepth: 3\n\n  age_distribution_page\n  problems_distribution_page\n"
        ));
    }
}
