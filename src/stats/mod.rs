pub mod details;
pub mod types;

pub use details::fetch_details;
pub use types::{Bucket, PullRequestDetails, PullRequestState};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::github::{GitHubError, ListedState, PullRequestSource, PullRequestSummary, RepoRef};
use crate::pagination::{CancelFlag, ItemVisitor, PageLimit, Paginator, WalkSummary};

/// Sub-resource of a pull request fetched by the detail fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubResource {
    IssueComments,
    PullRequestComments,
    Reviews,
    Commits,
}

impl fmt::Display for SubResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubResource::IssueComments => write!(f, "issue comments"),
            SubResource::PullRequestComments => write!(f, "PR comments"),
            SubResource::Reviews => write!(f, "reviews"),
            SubResource::Commits => write!(f, "commits"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("could not get pull requests for {repo}: {source}")]
    ListPullRequests { repo: String, source: GitHubError },

    #[error("could not fetch pull request {repo}#{number}: {source}")]
    FetchPullRequest {
        repo: String,
        number: u64,
        source: GitHubError,
    },

    #[error("could not determine merged status of {url}: {source}")]
    MergeStatus { url: String, source: GitHubError },

    #[error("could not fetch {resource} on {url}: {source}")]
    SubResource {
        resource: SubResource,
        url: String,
        source: GitHubError,
    },
}

/// Everything a run needs to talk to the data source, fixed at startup.
pub struct PullRequestQuery<S> {
    pub repo: RepoRef,
    /// Closed requests untouched since this moment are skipped. `None` means unbounded.
    pub earliest_date: Option<DateTime<Utc>>,
    /// Read only the first page of pull requests.
    pub dev_mode: bool,
    pub source: S,
    pub cancel: CancelFlag,
}

impl<S: PullRequestSource> PullRequestQuery<S> {
    pub fn new(repo: RepoRef, source: S, cancel: CancelFlag) -> Self {
        Self {
            repo,
            earliest_date: None,
            dev_mode: false,
            source,
            cancel,
        }
    }

    pub fn with_earliest_date(mut self, earliest_date: Option<DateTime<Utc>>) -> Self {
        self.earliest_date = earliest_date;
        self
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// Paginator for the top-level pull request listing.
    pub fn pull_request_paginator(&self) -> Paginator {
        Paginator::new(PageLimit::for_dev_mode(self.dev_mode), self.cancel.clone())
    }

    /// Paginator for comments, reviews and commits of one pull request.
    pub fn detail_paginator(&self) -> Paginator {
        Paginator::new(PageLimit::Unlimited, self.cancel.clone())
    }

    /// Closed and not touched since the cutoff. Open requests are never stale.
    pub fn is_stale(&self, pr: &PullRequestSummary) -> bool {
        match self.earliest_date {
            Some(cutoff) => pr.state == ListedState::Closed && pr.last_touched() < cutoff,
            None => false,
        }
    }

    /// Hand every pull request of the repository to `visitor`, one at a time.
    pub async fn walk_pull_requests<V>(&self, visitor: &mut V) -> Result<WalkSummary, StatsError>
    where
        V: ItemVisitor<PullRequestSummary> + ?Sized,
    {
        let source = &self.source;
        let repo = &self.repo;
        self.pull_request_paginator()
            .walk(move |page| source.list_pull_requests(repo, page), visitor)
            .await
            .map_err(|e| StatsError::ListPullRequests {
                repo: self.repo.to_string(),
                source: e,
            })
    }

    pub async fn get_pull_request(&self, number: u64) -> Result<PullRequestSummary, StatsError> {
        self.source
            .get_pull_request(&self.repo, number)
            .await
            .map_err(|e| StatsError::FetchPullRequest {
                repo: self.repo.to_string(),
                number,
                source: e,
            })
    }
}

/// Files pull request details into buckets.
pub struct Stats<'q, S> {
    query: &'q PullRequestQuery<S>,
    buckets: Vec<Bucket>,
}

impl<'q, S: PullRequestSource> Stats<'q, S> {
    pub fn new(query: &'q PullRequestQuery<S>, buckets: Vec<Bucket>) -> Self {
        Self { query, buckets }
    }

    /// Walk every pull request of the repository into the buckets.
    pub async fn populate(&mut self) -> Result<WalkSummary, StatsError> {
        let query = self.query;
        query.walk_pull_requests(self).await
    }

    async fn process(&mut self, pr: PullRequestSummary) -> Result<(), StatsError> {
        if self.query.is_stale(&pr) {
            debug!(pr = pr.number, "skipping stale closed pull request");
            return Ok(());
        }
        self.process_one(pr).await
    }

    /// Fetch and file one pull request, bypassing the staleness filter.
    pub async fn process_one(&mut self, pr: PullRequestSummary) -> Result<(), StatsError> {
        let details = fetch_details(self.query, pr).await?;
        debug!(
            pr = details.pull.number,
            state = %details.state,
            recent_reviews = details.recent_review_count,
            recent_pr_comments = details.recent_pr_comment_count,
            recent_issue_comments = details.recent_issue_comment_count,
            recent_activity = details.recent_activity_count,
            all_activity = details.all_activity_count,
            "filing pull request"
        );
        self.add(Arc::new(details));
        Ok(())
    }

    /// Offer `details` to each bucket in order. A match in a bucket without
    /// cascade ends the search.
    pub fn add(&mut self, details: Arc<PullRequestDetails>) {
        for bucket in &mut self.buckets {
            if !bucket.matches(&details) {
                continue;
            }
            bucket.requests.push(Arc::clone(&details));
            if !bucket.cascade {
                break;
            }
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }
}

#[async_trait]
impl<'q, S: PullRequestSource> ItemVisitor<PullRequestSummary> for Stats<'q, S> {
    type Error = StatsError;

    async fn visit(&mut self, pr: PullRequestSummary) -> Result<(), StatsError> {
        self.process(pr).await
    }
}
