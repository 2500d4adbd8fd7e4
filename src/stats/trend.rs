use super::HistoricalStat;
use crate::retrospective::RetrospectiveSnapshot;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendRow {
    pub date: NaiveDate,
    pub open: usize,
    pub created: usize,
    pub closed: usize,
}

/// Open, created and closed counts over time.
///
/// One row per snapshot end date, plus a row for the begin date of the oldest
/// snapshot so the series reaches back to the start of the window.
#[derive(Debug, Clone, Default)]
pub struct HistoricalClosedOpenDistribution {
    rows: Vec<TrendRow>,
}

impl HistoricalClosedOpenDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in build order: most recent first, window start last.
    pub fn rows(&self) -> &[TrendRow] {
        &self.rows
    }

    pub fn sorted_by_date(&self) -> Vec<TrendRow> {
        let mut rows = self.rows.clone();
        rows.sort_by_key(|row| row.date);
        rows
    }
}

impl<'a> HistoricalStat<'a> for HistoricalClosedOpenDistribution {
    fn build(&mut self, retrospective: &[RetrospectiveSnapshot<'a>]) {
        self.rows.extend(retrospective.iter().map(|snapshot| TrendRow {
            date: snapshot.end,
            open: snapshot.end_pull_requests.len(),
            created: snapshot.created.len(),
            closed: snapshot.closed.len(),
        }));

        if let Some(oldest) = retrospective.last() {
            self.rows.push(TrendRow {
                date: oldest.begin,
                open: oldest.begin_pull_requests.len(),
                created: oldest.created.len(),
                closed: oldest.closed.len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::pull_request;
    use crate::model::PullRequest;
    use std::collections::HashSet;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_rows_include_window_start() {
        let pr1 = pull_request(1);
        let pr2 = pull_request(2);
        let both: HashSet<&PullRequest> = [&pr1, &pr2].into_iter().collect();
        let one: HashSet<&PullRequest> = [&pr1].into_iter().collect();

        let retrospective = vec![
            RetrospectiveSnapshot {
                begin: date(8),
                end: date(15),
                begin_pull_requests: one.clone(),
                end_pull_requests: both,
                created: vec![&pr2],
                closed: Vec::new(),
            },
            RetrospectiveSnapshot {
                begin: date(1),
                end: date(8),
                begin_pull_requests: HashSet::new(),
                end_pull_requests: one,
                created: vec![&pr1],
                closed: Vec::new(),
            },
        ];

        let mut trend = HistoricalClosedOpenDistribution::new();
        trend.build(&retrospective);

        let rows = trend.sorted_by_date();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            TrendRow {
                date: date(1),
                open: 0,
                created: 1,
                closed: 0
            }
        );
        assert_eq!(rows[2].date, date(15));
        assert_eq!(rows[2].open, 2);
    }

    #[test]
    fn test_empty_retrospective_has_no_rows() {
        let mut trend = HistoricalClosedOpenDistribution::new();
        trend.build(&[]);
        assert!(trend.rows().is_empty());
    }
}
