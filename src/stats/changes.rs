use super::Stat;
use crate::model::{ChangeTotals, PullRequest};
use std::collections::BTreeMap;

/// Added and deleted lines per category, summed over all pull requests.
#[derive(Debug, Clone, Default)]
pub struct ChangesDistribution {
    pub distribution: BTreeMap<String, ChangeTotals>,
}

impl ChangesDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> ChangeTotals {
        self.distribution
            .values()
            .fold(ChangeTotals::default(), |acc, totals| ChangeTotals {
                additions: acc.additions + totals.additions,
                deletions: acc.deletions + totals.deletions,
            })
    }

    /// Category with the largest value of `key`; ties go to the first by name.
    pub fn max_by<F>(&self, key: F) -> Option<(&str, ChangeTotals)>
    where
        F: Fn(&ChangeTotals) -> u64,
    {
        self.distribution
            .iter()
            .fold(None, |best: Option<(&String, &ChangeTotals)>, (name, totals)| match best {
                Some((_, current)) if key(current) >= key(totals) => best,
                _ => Some((name, totals)),
            })
            .map(|(name, totals)| (name.as_str(), *totals))
    }
}

impl<'a> Stat<'a> for ChangesDistribution {
    fn add(&mut self, pull_request: &'a PullRequest) {
        for (category, changes) in pull_request.changes_by_category() {
            let entry = self.distribution.entry(category).or_default();
            entry.additions += changes.additions;
            entry.deletions += changes.deletions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{changed_file, pull_request};

    #[test]
    fn test_sums_per_category() {
        let mut first = pull_request(1);
        first.changed_files = Some(vec![
            changed_file("modules/core/a.cpp", 10, 2),
            changed_file("doc/a.md", 1, 30),
        ]);
        let mut second = pull_request(2);
        second.changed_files = Some(vec![changed_file("modules/core/b.cpp", 5, 5)]);
        let without_files = pull_request(3);

        let mut changes = ChangesDistribution::new();
        changes.build([&first, &second, &without_files]);

        assert_eq!(
            changes.distribution["core"],
            ChangeTotals {
                additions: 15,
                deletions: 7
            }
        );
        assert_eq!(changes.totals().total(), 53);
        assert_eq!(changes.max_by(|t| t.additions).map(|(name, _)| name), Some("core"));
        assert_eq!(
            changes.max_by(|t| t.deletions).map(|(name, _)| name),
            Some("documentation")
        );
        assert_eq!(changes.max_by(ChangeTotals::total).map(|(name, _)| name), Some("documentation"));
    }

    #[test]
    fn test_max_by_on_empty() {
        assert!(ChangesDistribution::new().max_by(ChangeTotals::total).is_none());
    }
}
