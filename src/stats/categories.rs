use super::Stat;
use crate::model::PullRequest;
use std::collections::BTreeMap;

/// Pull requests per category. One pull request may count toward several categories.
#[derive(Debug, Clone, Default)]
pub struct CategoriesDistribution<'a> {
    pub distribution: BTreeMap<String, Vec<&'a PullRequest>>,
    pub with_auto_assigned_categories: Vec<&'a PullRequest>,
    pub total_pull_requests: usize,
}

impl<'a> CategoriesDistribution<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(category, count)` sorted by count descending, then by name.
    pub fn counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .distribution
            .iter()
            .map(|(category, prs)| (category.clone(), prs.len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}

impl<'a> Stat<'a> for CategoriesDistribution<'a> {
    fn add(&mut self, pull_request: &'a PullRequest) {
        self.total_pull_requests += 1;
        let (categories, auto_assigned) = crate::classify::categorize(pull_request);
        for category in categories {
            self.distribution
                .entry(category)
                .or_default()
                .push(pull_request);
        }
        if auto_assigned {
            self.with_auto_assigned_categories.push(pull_request);
        }
    }
}
