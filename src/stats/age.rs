use super::{HistoricalStat, Stat};
use crate::model::{AgeReference, PullRequest};
use crate::retrospective::RetrospectiveSnapshot;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Upper bounds (in days) of the age buckets, oldest bucket open-ended.
pub const DEFAULT_AGE_BOUNDS: [i64; 5] = [7, 14, 31, 180, 365];

#[derive(Debug, Clone, Copy)]
pub struct PullRequestWithAge<'a> {
    pub pull_request: &'a PullRequest,
    pub age: i64,
}

/// Pull requests bucketed by age, overall and per category.
#[derive(Debug, Clone)]
pub struct AgeDistribution<'a> {
    reference: AgeReference,
    bounds: Vec<i64>,
    labels: Vec<String>,
    by_age: Vec<Vec<PullRequestWithAge<'a>>>,
    by_category: BTreeMap<String, Vec<Vec<&'a PullRequest>>>,
}

impl<'a> AgeDistribution<'a> {
    pub fn new(reference: AgeReference) -> Self {
        Self::with_bounds(reference, &DEFAULT_AGE_BOUNDS)
    }

    /// `bounds` must be sorted ascending and non-empty.
    pub fn with_bounds(reference: AgeReference, bounds: &[i64]) -> Self {
        let labels = bucket_labels(bounds);
        Self {
            reference,
            bounds: bounds.to_vec(),
            by_age: vec![Vec::new(); labels.len()],
            labels,
            by_category: BTreeMap::new(),
        }
    }

    /// Bucket index of an age: the first bound not below it.
    pub fn bucket_of(&self, age: i64) -> usize {
        self.bounds.partition_point(|&bound| bound < age)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// `(label, members)` per bucket, youngest first.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[PullRequestWithAge<'a>])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.by_age.iter().map(Vec::as_slice))
    }

    pub fn counts(&self) -> Vec<usize> {
        self.by_age.iter().map(Vec::len).collect()
    }

    pub fn by_category(&self) -> &BTreeMap<String, Vec<Vec<&'a PullRequest>>> {
        &self.by_category
    }

    pub fn ages(&self) -> impl Iterator<Item = i64> + '_ {
        self.by_age.iter().flatten().map(|entry| entry.age)
    }
}

impl<'a> Stat<'a> for AgeDistribution<'a> {
    fn add(&mut self, pull_request: &'a PullRequest) {
        let age = pull_request.age(self.reference);
        let bucket = self.bucket_of(age);
        self.by_age[bucket].push(PullRequestWithAge { pull_request, age });

        let buckets = self.labels.len();
        for category in pull_request.categories() {
            self.by_category
                .entry(category)
                .or_insert_with(|| vec![Vec::new(); buckets])[bucket]
                .push(pull_request);
        }
    }
}

fn bucket_labels(bounds: &[i64]) -> Vec<String> {
    let mut labels = Vec::with_capacity(bounds.len() + 1);
    if let (Some(first), Some(last)) = (bounds.first(), bounds.last()) {
        labels.push(format!("< {first} days"));
        labels.extend(
            bounds
                .windows(2)
                .map(|pair| format!("{}-{} days", pair[0], pair[1])),
        );
        labels.push(format!("> {last} days"));
    }
    labels
}

/// Age bucket counts of the open set at each snapshot end date.
#[derive(Debug, Clone, Default)]
pub struct HistoricalAgeDistribution {
    labels: Vec<String>,
    distribution: BTreeMap<NaiveDate, Vec<usize>>,
}

impl HistoricalAgeDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Bucket counts keyed by date, oldest date first.
    pub fn distribution(&self) -> &BTreeMap<NaiveDate, Vec<usize>> {
        &self.distribution
    }
}

impl<'a> HistoricalStat<'a> for HistoricalAgeDistribution {
    fn build(&mut self, retrospective: &[RetrospectiveSnapshot<'a>]) {
        for snapshot in retrospective {
            let mut ages = AgeDistribution::new(AgeReference::On(snapshot.end));
            ages.build(snapshot.end_pull_requests.iter().copied());
            if self.labels.is_empty() {
                self.labels = ages.labels().to_vec();
            }
            self.distribution.insert(snapshot.end, ages.counts());
        }
    }
}
