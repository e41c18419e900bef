//! Chronological event streams built from pull request details.

use chrono::{DateTime, Utc};

use crate::github::actor_name;
use crate::metrics::whole_days;
use crate::stats::{PullRequestDetails, PullRequestState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Opened,
    Merged,
    Closed,
    StillOpen,
    Review,
    Comment,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub date: DateTime<Utc>,
    pub kind: EventKind,
    pub description: String,
    /// Who acted. `None` when the source does not say, as for closing.
    pub person: Option<String>,
}

impl Event {
    fn new(date: DateTime<Utc>, kind: EventKind, description: String, person: Option<String>) -> Self {
        Self {
            date,
            kind,
            description,
            person,
        }
    }

    /// Whether someone acted. The marker aging an open request as of now does not count.
    pub fn is_activity(&self) -> bool {
        self.kind != EventKind::StillOpen
    }
}

/// Every event of one pull request, oldest first, with open requests aged
/// as of the current moment.
pub fn ordered_events(prd: &PullRequestDetails) -> Vec<Event> {
    ordered_events_at(prd, Utc::now())
}

/// Same as `ordered_events` with an explicit "now".
pub fn ordered_events_at(prd: &PullRequestDetails, now: DateTime<Utc>) -> Vec<Event> {
    let pull = &prd.pull;
    let author = pull.author();

    let mut results = vec![Event::new(
        pull.created_at,
        EventKind::Opened,
        "pull request opened".to_string(),
        Some(author),
    )];

    results.push(match pull.closed_at {
        Some(closed_at) => {
            let days = whole_days(pull.created_at, closed_at);
            let (kind, verb) = if prd.state == PullRequestState::Merged {
                (EventKind::Merged, "merged")
            } else {
                (EventKind::Closed, "closed")
            };
            Event::new(
                closed_at,
                kind,
                format!("pull request {verb} after {days} days"),
                None,
            )
        }
        None => {
            let days = whole_days(pull.created_at, now);
            Event::new(
                now,
                EventKind::StillOpen,
                format!("pull request {} {days} days", prd.state),
                None,
            )
        }
    });

    for commit in &prd.commits {
        if let Some(date) = commit.authored_at() {
            let who = commit.author_name();
            results.push(Event::new(
                date,
                EventKind::Commit,
                format!("commit by {who}"),
                Some(who),
            ));
        }
    }

    for review in &prd.reviews {
        // pending reviews have no submission time
        if let Some(date) = review.submitted_at {
            let who = actor_name(review.user.as_ref());
            results.push(Event::new(
                date,
                EventKind::Review,
                format!("review by {who}"),
                Some(who),
            ));
        }
    }

    let comments = prd
        .pull_request_comments
        .iter()
        .map(|c| (c.created_at, c.user.as_ref()))
        .chain(prd.issue_comments.iter().map(|c| (c.created_at, c.user.as_ref())));
    for (date, user) in comments {
        let who = actor_name(user);
        results.push(Event::new(
            date,
            EventKind::Comment,
            format!("comment by {who}"),
            Some(who),
        ));
    }

    results.sort_by_key(|e| e.date);
    results
}

/// Merge the events of several pull requests into one ordered stream.
pub fn merge_events<I>(streams: I) -> Vec<Event>
where
    I: IntoIterator<Item = Vec<Event>>,
{
    let mut all: Vec<Event> = streams.into_iter().flatten().collect();
    all.sort_by_key(|e| e.date);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{at, commit, issue_comment, pull, review, review_comment};
    use crate::github::User;
    use crate::stats::details::assemble;
    use chrono::Duration;

    fn merged_after_five_days() -> PullRequestDetails {
        assemble(
            pull(1, at(2024, 1, 1), Some(at(2024, 1, 6))),
            true,
            vec![review("reviewer", at(2024, 1, 3))],
            vec![review_comment("reviewer", at(2024, 1, 3))],
            vec![issue_comment("bystander", at(2024, 1, 2))],
            vec![commit("author", at(2024, 1, 4))],
            None,
        )
    }

    #[test]
    fn test_events_are_sorted_and_complete() {
        let events = ordered_events(&merged_after_five_days());
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Opened,
                EventKind::Comment,
                EventKind::Review,
                EventKind::Comment,
                EventKind::Commit,
                EventKind::Merged,
            ]
        );
        assert!(events.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_merge_terminus_uses_closing_time_and_day_count() {
        let events = ordered_events(&merged_after_five_days());
        let terminus = events
            .iter()
            .find(|e| e.kind == EventKind::Merged)
            .unwrap();
        assert_eq!(terminus.description, "pull request merged after 5 days");
        assert_eq!(terminus.date, at(2024, 1, 6));
        assert_eq!(terminus.person, None);
    }

    #[test]
    fn test_closed_unmerged_terminus() {
        let prd = assemble(
            pull(2, at(2024, 1, 1), Some(at(2024, 1, 3))),
            false,
            vec![],
            vec![],
            vec![],
            vec![],
            None,
        );
        let events = ordered_events(&prd);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].description, "pull request closed after 2 days");
    }

    #[test]
    fn test_closed_request_events_are_deterministic() {
        let prd = merged_after_five_days();
        assert_eq!(ordered_events(&prd), ordered_events(&prd));
    }

    #[test]
    fn test_open_request_is_aged_as_of_now() {
        let prd = assemble(
            pull(3, at(2024, 1, 1), None),
            false,
            vec![review("reviewer", at(2024, 1, 2))],
            vec![],
            vec![],
            vec![],
            None,
        );
        let now = at(2024, 1, 1) + Duration::days(12) + Duration::hours(5);
        let events = ordered_events_at(&prd, now);
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::StillOpen);
        assert_eq!(last.description, "pull request open 12 days");
        assert_eq!(last.date, now);

        let later = ordered_events_at(&prd, now + Duration::days(1));
        assert_eq!(events[..2], later[..2]);
        assert_ne!(events[2], later[2]);
    }

    #[test]
    fn test_actor_fallbacks() {
        let mut prd = merged_after_five_days();
        prd.reviews[0].user = Some(User {
            login: Some("rev".to_string()),
            name: Some("Rev Iewer".to_string()),
        });
        prd.issue_comments[0].user = None;
        let events = ordered_events(&prd);
        assert!(events.iter().any(|e| e.description == "review by Rev Iewer"));
        assert!(events.iter().any(|e| e.description == "comment by unnamed"));
    }

    #[test]
    fn test_merge_events_interleaves_streams() {
        let first = vec![Event::new(at(2024, 1, 3), EventKind::Review, "b".into(), None)];
        let second = vec![
            Event::new(at(2024, 1, 1), EventKind::Opened, "a".into(), None),
            Event::new(at(2024, 1, 5), EventKind::Comment, "c".into(), None),
        ];
        let merged = merge_events(vec![first, second]);
        let descriptions: Vec<&str> = merged.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["a", "b", "c"]);
    }
}
