//! Reconstruction of historical open pull request sets.
//!
//! The API only answers "what is open now", so past states are derived by walking
//! backward from the current open set, one bucket at a time:
//!
//! ```text
//! open(t - step) = open(t) ∪ closed_in[t - step, t) − created_in[t - step, t)
//! ```
//!
//! Pull requests that were reopened break this identity; they are not accounted for.

use crate::dates::{DateRange, DateRangeError};
use crate::model::{PullRequest, PullRequestsDiff};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum RetrospectiveError {
    #[error("cannot build a retrospective over an empty date range")]
    EmptyDateRange,

    #[error("{range} yields {count} bucket boundaries, at least two are required")]
    NotEnoughBuckets { range: DateRange, count: usize },

    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    #[error("pull request #{0} is listed as closed but has no closed_at timestamp")]
    MissingClosedAt(u64),
}

/// Half-open `[from, to)` interval of calendar days.
///
/// Timestamps are compared by their UTC date; the time of day never matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DayRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        self.from <= day && day < self.to
    }
}

impl fmt::Display for DayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

/// Pull requests created and closed within one interval.
#[derive(Debug, Clone, Default)]
pub struct IntervalChanges<'a> {
    pub created: Vec<&'a PullRequest>,
    pub closed: Vec<&'a PullRequest>,
}

/// Selects the created and closed pull requests whose event date falls in `range`.
pub fn diff_in_range<'a>(
    range: DayRange,
    created: &'a [PullRequest],
    closed: &'a [PullRequest],
) -> Result<IntervalChanges<'a>, RetrospectiveError> {
    let created: Vec<&PullRequest> = created
        .iter()
        .filter(|pr| range.contains(pr.created_at))
        .collect();

    let mut closed_in_range = Vec::new();
    for pr in closed {
        let closed_at = pr
            .closed_at
            .ok_or(RetrospectiveError::MissingClosedAt(pr.number))?;
        if range.contains(closed_at) {
            closed_in_range.push(pr);
        }
    }

    tracing::debug!(
        range = %range,
        created = created.len(),
        closed = closed_in_range.len(),
        "Extracted interval diff"
    );

    Ok(IntervalChanges {
        created,
        closed: closed_in_range,
    })
}

/// Open set one interval earlier: closed pull requests come back, created ones go away.
pub fn open_before<'a>(
    open_at_end: &HashSet<&'a PullRequest>,
    changes: &IntervalChanges<'a>,
) -> HashSet<&'a PullRequest> {
    let created: HashSet<&PullRequest> = changes.created.iter().copied().collect();

    open_at_end
        .iter()
        .copied()
        .chain(changes.closed.iter().copied())
        .filter(|pr| !created.contains(pr))
        .collect()
}

/// One reconstructed interval `[begin, end)`.
#[derive(Debug, Clone)]
pub struct RetrospectiveSnapshot<'a> {
    pub begin: NaiveDate,
    pub end: NaiveDate,
    /// Open at `begin`.
    pub begin_pull_requests: HashSet<&'a PullRequest>,
    /// Open at `end`.
    pub end_pull_requests: HashSet<&'a PullRequest>,
    pub created: Vec<&'a PullRequest>,
    pub closed: Vec<&'a PullRequest>,
}

/// Rebuilds the weekly history of open pull requests, most recent interval first.
///
/// `open_pull_requests` is the open set at the end of the diff's date range. The
/// most recent interval also counts events dated on its end day, since that day
/// is "today" and already partly elapsed; every earlier interval stops the day
/// before its end date, so the intervals never count an event twice.
pub fn build_retrospective<'a>(
    open_pull_requests: &'a [PullRequest],
    diff: &'a PullRequestsDiff,
    step: Duration,
) -> Result<Vec<RetrospectiveSnapshot<'a>>, RetrospectiveError> {
    if diff.date_range.is_empty() {
        return Err(RetrospectiveError::EmptyDateRange);
    }

    let dates: Vec<NaiveDate> = diff
        .date_range
        .buckets(step)?
        .map(|ts| ts.date_naive())
        .collect();

    if dates.len() < 2 {
        return Err(RetrospectiveError::NotEnoughBuckets {
            range: diff.date_range,
            count: dates.len(),
        });
    }

    let last = dates.len() - 1;
    let latest = (
        dates[last - 1],
        dates[last],
        DayRange::new(dates[last - 1], dates[last] + Duration::days(1)),
    );
    let earlier = dates
        .windows(2)
        .rev()
        .skip(1)
        .map(|pair| (pair[0], pair[1], DayRange::new(pair[0], pair[1])));

    let seed: HashSet<&PullRequest> = open_pull_requests.iter().collect();
    tracing::info!(open = seed.len(), at = %dates[last], "Starting retrospective");

    let (_, snapshots) = std::iter::once(latest).chain(earlier).try_fold(
        (seed, Vec::with_capacity(last)),
        |(open_at_end, mut snapshots), (begin, end, window)| {
            tracing::info!("Analyzing range from {} to {}", begin, end);
            let changes = diff_in_range(window, &diff.created, &diff.closed)?;
            let open_at_begin = open_before(&open_at_end, &changes);
            tracing::info!(
                "At {} there were {} open pull requests",
                begin,
                open_at_begin.len()
            );

            snapshots.push(RetrospectiveSnapshot {
                begin,
                end,
                begin_pull_requests: open_at_begin.clone(),
                end_pull_requests: open_at_end,
                created: changes.created,
                closed: changes.closed,
            });
            Ok::<_, RetrospectiveError>((open_at_begin, snapshots))
        },
    )?;

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::analysis_range;
    use crate::model::test_support::{closed_on, created_on, pull_request};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn numbers(set: &HashSet<&PullRequest>) -> Vec<u64> {
        let mut numbers: Vec<u64> = set.iter().map(|pr| pr.number).collect();
        numbers.sort_unstable();
        numbers
    }

    #[test]
    fn test_diff_in_range_ignores_time_of_day() {
        let created = vec![
            created_on(1, at(2024, 1, 1, 0)),
            created_on(2, at(2024, 1, 7, 23)),
            created_on(3, at(2024, 1, 8, 0)),
        ];
        let closed = vec![closed_on(4, at(2024, 1, 3, 12)), closed_on(5, at(2023, 12, 31, 23))];

        let changes =
            diff_in_range(DayRange::new(day(2024, 1, 1), day(2024, 1, 8)), &created, &closed).unwrap();

        let created: Vec<u64> = changes.created.iter().map(|pr| pr.number).collect();
        let closed: Vec<u64> = changes.closed.iter().map(|pr| pr.number).collect();
        assert_eq!(created, vec![1, 2]);
        assert_eq!(closed, vec![4]);
    }

    #[test]
    fn test_diff_in_range_rejects_closed_without_timestamp() {
        let closed = vec![pull_request(9)];
        let err = diff_in_range(DayRange::new(day(2024, 1, 1), day(2024, 1, 8)), &[], &closed).unwrap_err();
        assert!(matches!(err, RetrospectiveError::MissingClosedAt(9)));
    }

    #[test]
    fn test_open_before_scenario() {
        let pr1 = pull_request(1);
        let pr2 = pull_request(2);
        let pr3 = pull_request(3);
        let open_at_end: HashSet<&PullRequest> = [&pr1, &pr2].into_iter().collect();
        let changes = IntervalChanges {
            created: vec![&pr2],
            closed: vec![&pr3],
        };

        assert_eq!(numbers(&open_before(&open_at_end, &changes)), vec![1, 3]);
    }

    #[test]
    fn test_empty_diff_keeps_open_set() {
        let pr1 = pull_request(1);
        let open_at_end: HashSet<&PullRequest> = [&pr1].into_iter().collect();
        assert_eq!(
            open_before(&open_at_end, &IntervalChanges::default()),
            open_at_end
        );
    }

    #[test]
    fn test_twelve_weeks_yield_thirteen_snapshots() {
        // Wednesday afternoon: the current week is partial.
        let now = at(2024, 4, 3, 15);
        let diff = PullRequestsDiff::new(analysis_range(now, 12).unwrap(), Vec::new(), Vec::new());

        let snapshots = build_retrospective(&[], &diff, Duration::weeks(1)).unwrap();

        assert_eq!(snapshots.len(), 13);
        assert_eq!(snapshots[0].begin, day(2024, 4, 1));
        assert_eq!(snapshots[0].end, day(2024, 4, 3));
        assert_eq!(snapshots[12].begin, day(2024, 1, 8));
        assert_eq!(snapshots[12].end, day(2024, 1, 15));
    }

    #[test]
    fn test_snapshots_chain_and_satisfy_invariant() {
        let now = at(2024, 1, 24, 12);
        let range = DateRange::new(at(2024, 1, 1, 12), now).unwrap();

        let open = vec![pull_request(1), created_on(2, at(2024, 1, 20, 8))];
        let created = vec![
            created_on(2, at(2024, 1, 20, 8)),
            created_on(3, at(2024, 1, 3, 8)),
        ];
        let closed = vec![closed_on(3, at(2024, 1, 16, 9)), closed_on(4, at(2024, 1, 9, 9))];
        let diff = PullRequestsDiff::new(range, created, closed);

        let snapshots = build_retrospective(&open, &diff, Duration::weeks(1)).unwrap();
        assert_eq!(snapshots.len(), 4);

        for pair in snapshots.windows(2) {
            assert_eq!(pair[0].begin_pull_requests, pair[1].end_pull_requests);
            assert_eq!(pair[0].begin, pair[1].end);
        }

        for snapshot in &snapshots {
            let created: HashSet<&PullRequest> = snapshot.created.iter().copied().collect();
            let expected: HashSet<&PullRequest> = snapshot
                .end_pull_requests
                .iter()
                .copied()
                .chain(snapshot.closed.iter().copied())
                .filter(|pr| !created.contains(pr))
                .collect();
            assert_eq!(snapshot.begin_pull_requests, expected);
        }

        // [01-22, 01-24]: nothing happened.
        assert_eq!(numbers(&snapshots[0].begin_pull_requests), vec![1, 2]);
        // [01-15, 01-22): #2 created, #3 closed.
        assert_eq!(numbers(&snapshots[1].begin_pull_requests), vec![1, 3]);
        // [01-08, 01-15): #4 closed.
        assert_eq!(numbers(&snapshots[2].begin_pull_requests), vec![1, 3, 4]);
        // [01-01, 01-08): #3 created.
        assert_eq!(numbers(&snapshots[3].begin_pull_requests), vec![1, 4]);
    }

    #[test]
    fn test_latest_interval_includes_end_date() {
        let now = at(2024, 1, 17, 18);
        let range = DateRange::new(at(2024, 1, 1, 9), now).unwrap();
        let closed = vec![closed_on(5, at(2024, 1, 17, 10))];
        let diff = PullRequestsDiff::new(range, Vec::new(), closed);

        let snapshots = build_retrospective(&[], &diff, Duration::weeks(1)).unwrap();

        assert_eq!(snapshots[0].end, day(2024, 1, 17));
        assert_eq!(snapshots[0].closed.len(), 1);
        assert_eq!(numbers(&snapshots[0].begin_pull_requests), vec![5]);
    }

    #[test]
    fn test_earlier_interval_excludes_end_date() {
        let range = DateRange::new(at(2024, 1, 1, 9), at(2024, 1, 17, 18)).unwrap();
        // Boundary t_1 is 2024-01-08; this close belongs to the second interval.
        let closed = vec![closed_on(6, at(2024, 1, 8, 10))];
        let diff = PullRequestsDiff::new(range, Vec::new(), closed);

        let snapshots = build_retrospective(&[], &diff, Duration::weeks(1)).unwrap();

        assert_eq!(snapshots.len(), 3);
        let last = &snapshots[2];
        assert_eq!((last.begin, last.end), (day(2024, 1, 1), day(2024, 1, 8)));
        assert!(last.closed.is_empty());
        assert_eq!(snapshots[1].closed.len(), 1);
    }

    #[test]
    fn test_empty_range_is_rejected() {
        let diff = PullRequestsDiff::default();
        let err = build_retrospective(&[], &diff, Duration::weeks(1)).unwrap_err();
        assert!(matches!(err, RetrospectiveError::EmptyDateRange));
    }
}
