use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::github::{
    actor_name, Commit, IssueComment, ListedState, PullRequestComment, PullRequestSummary, Review,
    User,
};

/// Reporting state of a pull request. `Merged` is only ever set from an
/// explicit merge-status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

impl PullRequestState {
    pub fn resolve(listed: ListedState, is_merged: bool) -> Self {
        match (listed, is_merged) {
            (_, true) => PullRequestState::Merged,
            (ListedState::Open, false) => PullRequestState::Open,
            (ListedState::Closed, false) => PullRequestState::Closed,
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullRequestState::Open => write!(f, "open"),
            PullRequestState::Closed => write!(f, "closed"),
            PullRequestState::Merged => write!(f, "merged"),
        }
    }
}

/// A pull request together with everything fetched about it.
///
/// Built once by the detail fetcher and never mutated afterwards; buckets
/// share it through an `Arc`.
#[derive(Debug, Clone)]
pub struct PullRequestDetails {
    pub pull: PullRequestSummary,
    pub state: PullRequestState,

    /// Groups of comments submitted with a review action
    pub reviews: Vec<Review>,
    pub recent_review_count: usize,

    /// Review comments attached to the diff
    pub pull_request_comments: Vec<PullRequestComment>,
    pub recent_pr_comment_count: usize,

    /// Conversation comments on the pull request's issue
    pub issue_comments: Vec<IssueComment>,
    pub recent_issue_comment_count: usize,

    pub commits: Vec<Commit>,

    pub recent_activity_count: usize,
    pub all_activity_count: usize,
}

impl PullRequestDetails {
    /// Reviews plus both kinds of comments, leaving out ignored actors.
    pub fn activity_count_excluding(&self, ignore: &BTreeSet<String>) -> usize {
        let counted = |user: Option<&User>| !ignore.contains(&actor_name(user));
        self.reviews.iter().filter(|r| counted(r.user.as_ref())).count()
            + self
                .pull_request_comments
                .iter()
                .filter(|c| counted(c.user.as_ref()))
                .count()
            + self
                .issue_comments
                .iter()
                .filter(|c| counted(c.user.as_ref()))
                .count()
    }
}

/// Predicate deciding whether a pull request belongs in a bucket.
pub type RuleFilter = Box<dyn Fn(&PullRequestDetails) -> bool + Send + Sync>;

/// A named category of pull requests.
pub struct Bucket {
    pub name: String,
    rule: RuleFilter,
    /// When false, a matching request is not offered to later buckets.
    pub cascade: bool,
    pub requests: Vec<Arc<PullRequestDetails>>,
}

impl Bucket {
    pub fn new<F>(name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&PullRequestDetails) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            rule: Box::new(rule),
            cascade: false,
            requests: Vec::new(),
        }
    }

    /// A bucket accepting every request.
    pub fn catch_all(name: impl Into<String>) -> Self {
        Self::new(name, |_| true)
    }

    pub fn with_cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn matches(&self, details: &PullRequestDetails) -> bool {
        (self.rule)(details)
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("cascade", &self.cascade)
            .field("requests", &self.requests.len())
            .finish()
    }
}
