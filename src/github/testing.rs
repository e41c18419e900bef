//! In-memory `PullRequestSource` for tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::{
    Commit, CommitDetail, GitSignature, IssueComment, ListedState, Page, PullRequestComment,
    PullRequestSummary, RepoRef, Review, User,
};
use super::{GitHubError, PullRequestSource};

/// Sub-resource a `FakeSource` can be told to fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FakeFailure {
    Merge,
    IssueComments,
    ReviewComments,
    Reviews,
    Commits,
}

#[derive(Default)]
pub struct FakeSource {
    pub page_size: usize,
    pub pulls: Vec<PullRequestSummary>,
    pub merged: BTreeSet<u64>,
    pub reviews: BTreeMap<u64, Vec<Review>>,
    pub review_comments: BTreeMap<u64, Vec<PullRequestComment>>,
    pub issue_comments: BTreeMap<u64, Vec<IssueComment>>,
    pub commits: BTreeMap<u64, Vec<Commit>>,
    pub failures: BTreeSet<(u64, FakeFailure)>,
    pub pull_pages_served: AtomicUsize,
}

impl FakeSource {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn with_pull(mut self, pr: PullRequestSummary) -> Self {
        self.pulls.push(pr);
        self
    }

    pub fn merged(mut self, number: u64) -> Self {
        self.merged.insert(number);
        self
    }

    pub fn with_reviews(mut self, number: u64, reviews: Vec<Review>) -> Self {
        self.reviews.insert(number, reviews);
        self
    }

    pub fn with_review_comments(mut self, number: u64, comments: Vec<PullRequestComment>) -> Self {
        self.review_comments.insert(number, comments);
        self
    }

    pub fn with_issue_comments(mut self, number: u64, comments: Vec<IssueComment>) -> Self {
        self.issue_comments.insert(number, comments);
        self
    }

    pub fn with_commits(mut self, number: u64, commits: Vec<Commit>) -> Self {
        self.commits.insert(number, commits);
        self
    }

    pub fn failing(mut self, number: u64, what: FakeFailure) -> Self {
        self.failures.insert((number, what));
        self
    }

    fn check(&self, number: u64, what: FakeFailure) -> Result<(), GitHubError> {
        if self.failures.contains(&(number, what)) {
            return Err(GitHubError::Api {
                status: 500,
                message: format!("{what:?} unavailable"),
            });
        }
        Ok(())
    }

    fn page_of<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let size = self.page_size.max(1);
        let start = (page.saturating_sub(1) as usize) * size;
        let end = (start + size).min(items.len());
        let slice = if start < items.len() {
            items[start..end].to_vec()
        } else {
            Vec::new()
        };
        let next_page = (end < items.len()).then_some(page + 1);
        Page {
            items: slice,
            next_page,
        }
    }
}

#[async_trait]
impl PullRequestSource for FakeSource {
    async fn list_pull_requests(
        &self,
        _repo: &RepoRef,
        page: u32,
    ) -> Result<Page<PullRequestSummary>, GitHubError> {
        self.pull_pages_served.fetch_add(1, Ordering::SeqCst);
        Ok(self.page_of(&self.pulls, page))
    }

    async fn get_pull_request(
        &self,
        _repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequestSummary, GitHubError> {
        self.pulls
            .iter()
            .find(|pr| pr.number == number)
            .cloned()
            .ok_or_else(|| GitHubError::NotFound(format!("pull {number}")))
    }

    async fn list_issue_comments(
        &self,
        _repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<IssueComment>, GitHubError> {
        self.check(number, FakeFailure::IssueComments)?;
        let items = self.issue_comments.get(&number).cloned().unwrap_or_default();
        Ok(self.page_of(&items, page))
    }

    async fn list_review_comments(
        &self,
        _repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestComment>, GitHubError> {
        self.check(number, FakeFailure::ReviewComments)?;
        let items = self.review_comments.get(&number).cloned().unwrap_or_default();
        Ok(self.page_of(&items, page))
    }

    async fn list_reviews(
        &self,
        _repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<Review>, GitHubError> {
        self.check(number, FakeFailure::Reviews)?;
        let items = self.reviews.get(&number).cloned().unwrap_or_default();
        Ok(self.page_of(&items, page))
    }

    async fn list_commits(
        &self,
        _repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<Commit>, GitHubError> {
        self.check(number, FakeFailure::Commits)?;
        let items = self.commits.get(&number).cloned().unwrap_or_default();
        Ok(self.page_of(&items, page))
    }

    async fn is_merged(&self, _repo: &RepoRef, number: u64) -> Result<bool, GitHubError> {
        self.check(number, FakeFailure::Merge)?;
        Ok(self.merged.contains(&number))
    }
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn pull(number: u64, created: DateTime<Utc>, closed: Option<DateTime<Utc>>) -> PullRequestSummary {
    PullRequestSummary {
        number,
        title: format!("Pull request {number}"),
        user: Some(User::from_login("author")),
        state: if closed.is_some() {
            ListedState::Closed
        } else {
            ListedState::Open
        },
        created_at: created,
        updated_at: closed.or(Some(created)),
        closed_at: closed,
        html_url: format!("https://github.com/org/repo/pull/{number}"),
    }
}

pub fn review(login: &str, submitted: DateTime<Utc>) -> Review {
    Review {
        user: Some(User::from_login(login)),
        submitted_at: Some(submitted),
    }
}

pub fn review_comment(login: &str, created: DateTime<Utc>) -> PullRequestComment {
    PullRequestComment {
        user: Some(User::from_login(login)),
        created_at: created,
    }
}

pub fn issue_comment(login: &str, created: DateTime<Utc>) -> IssueComment {
    IssueComment {
        user: Some(User::from_login(login)),
        created_at: created,
    }
}

pub fn commit(login: &str, date: DateTime<Utc>) -> Commit {
    Commit {
        commit: CommitDetail {
            author: Some(GitSignature {
                name: Some(login.to_string()),
                date: Some(date),
            }),
        },
        author: Some(User::from_login(login)),
    }
}
