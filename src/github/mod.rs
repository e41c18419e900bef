pub mod client;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use client::GitHubClient;
pub use types::{
    actor_name, Commit, IssueComment, ListedState, Page, PullRequestComment, PullRequestSummary,
    RepoRef, Review, User,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid GitHub URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Paged data source for pull requests and their sub-resources.
///
/// Page numbers are 1-based. Every listing reports the next page to ask for,
/// or `None` once the last page has been returned.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        page: u32,
    ) -> Result<Page<PullRequestSummary>, GitHubError>;

    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequestSummary, GitHubError>;

    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<IssueComment>, GitHubError>;

    async fn list_review_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestComment>, GitHubError>;

    async fn list_reviews(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<Review>, GitHubError>;

    async fn list_commits(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<Commit>, GitHubError>;

    /// Whether the pull request was merged. A closed request is not
    /// necessarily merged, so this is always asked rather than inferred.
    async fn is_merged(&self, repo: &RepoRef, number: u64) -> Result<bool, GitHubError>;
}
