//! Aggregations over pull requests and over the reconstructed history.

mod age;
mod categories;
mod changes;
mod problems;
mod trend;

pub use age::{AgeDistribution, HistoricalAgeDistribution, PullRequestWithAge, DEFAULT_AGE_BOUNDS};
pub use categories::CategoriesDistribution;
pub use changes::ChangesDistribution;
pub use problems::ProblematicPullRequests;
pub use trend::{HistoricalClosedOpenDistribution, TrendRow};

use crate::model::PullRequest;
use crate::retrospective::RetrospectiveSnapshot;

/// A statistic fed one pull request at a time.
pub trait Stat<'a> {
    fn add(&mut self, pull_request: &'a PullRequest);

    fn build<I>(&mut self, pull_requests: I)
    where
        I: IntoIterator<Item = &'a PullRequest>,
        Self: Sized,
    {
        for pull_request in pull_requests {
            self.add(pull_request);
        }
    }
}

/// A statistic computed from the whole retrospective at once.
pub trait HistoricalStat<'a> {
    fn build(&mut self, retrospective: &[RetrospectiveSnapshot<'a>]);
}
