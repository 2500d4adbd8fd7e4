use super::Stat;
use crate::model::PullRequest;
use std::collections::BTreeMap;

/// Pull requests needing attention: problem labels, reproducers and work in progress.
#[derive(Debug, Clone, Default)]
pub struct ProblematicPullRequests<'a> {
    /// Keyed by problem label name.
    pub distribution: BTreeMap<String, Vec<&'a PullRequest>>,
    /// Reproducers that are not marked as work in progress.
    pub reproducers: Vec<&'a PullRequest>,
    pub wip: Vec<&'a PullRequest>,
}

impl<'a> ProblematicPullRequests<'a> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a> Stat<'a> for ProblematicPullRequests<'a> {
    fn add(&mut self, pull_request: &'a PullRequest) {
        for problem in pull_request.problems() {
            self.distribution
                .entry(problem.name.clone())
                .or_default()
                .push(pull_request);
        }

        let wip = pull_request.is_wip();
        if pull_request.is_reproducer() && !wip {
            self.reproducers.push(pull_request);
        }
        if wip {
            self.wip.push(pull_request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{label, pull_request};

    #[test]
    fn test_groups_problems_reproducers_and_wip() {
        let mut needs_test = pull_request(1);
        needs_test.labels = vec![label("pr: needs test"), label("bug")];

        let mut reproducer = pull_request(2);
        reproducer.labels = vec![label("pr: reproducer")];

        let mut wip_reproducer = pull_request(3);
        wip_reproducer.title = "WIP: reproducer for crash".to_string();

        let mut problems = ProblematicPullRequests::new();
        problems.build([&needs_test, &reproducer, &wip_reproducer]);

        assert_eq!(problems.distribution.len(), 1);
        assert_eq!(problems.distribution["pr: needs test"][0].number, 1);
        assert_eq!(
            problems.reproducers.iter().map(|pr| pr.number).collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(problems.wip.iter().map(|pr| pr.number).collect::<Vec<_>>(), vec![3]);
    }
}
