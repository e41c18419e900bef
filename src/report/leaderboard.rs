use std::collections::BTreeSet;

use crate::github::PullRequestSource;
use crate::reviewers::ReviewerStats;

/// Reviewer leaderboard: a `<reviews>/<prs>: <reviewer>` line per reviewer,
/// each followed by the pull requests they reviewed.
pub fn leaderboard_lines<S: PullRequestSource>(
    stats: &ReviewerStats<'_, S>,
    ignore: &BTreeSet<String>,
) -> Vec<String> {
    let mut lines = Vec::new();

    for reviewer in stats.reviewers_in_order() {
        if ignore.contains(&reviewer) {
            continue;
        }
        let prs = stats.prs_for_reviewer(&reviewer);
        lines.push(format!(
            "{}/{}: {}",
            stats.review_count(&reviewer),
            prs.len(),
            reviewer
        ));
        for reviewed in prs {
            let pull = &reviewed.pull;
            lines.push(format!(
                "\t{:3}: {} [{}] {:?}",
                reviewed.review_count,
                pull.html_url,
                pull.author_login(),
                pull.title
            ));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{at, pull, review, FakeSource};
    use crate::github::RepoRef;
    use crate::pagination::CancelFlag;
    use crate::stats::PullRequestQuery;

    #[tokio::test]
    async fn test_leaderboard_format() {
        let source = FakeSource::new(10)
            .with_pull(pull(1, at(2024, 1, 1), None))
            .with_pull(pull(2, at(2024, 1, 1), None))
            .with_reviews(
                1,
                vec![review("alice", at(2024, 1, 2)), review("bot", at(2024, 1, 2))],
            )
            .with_reviews(
                2,
                vec![review("alice", at(2024, 1, 3)), review("alice", at(2024, 1, 4))],
            );
        let query = PullRequestQuery::new(RepoRef::new("org", "repo"), source, CancelFlag::new());
        let mut stats = ReviewerStats::new(&query);
        stats.populate().await.unwrap();

        let ignore: BTreeSet<String> = ["bot".to_string()].into_iter().collect();
        let lines = leaderboard_lines(&stats, &ignore);
        assert_eq!(
            lines,
            vec![
                "3/2: alice".to_string(),
                "\t  2: https://github.com/org/repo/pull/2 [author] \"Pull request 2\"".to_string(),
                "\t  1: https://github.com/org/repo/pull/1 [author] \"Pull request 1\"".to_string(),
            ]
        );
    }
}
