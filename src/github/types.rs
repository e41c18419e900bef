use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Literal used whenever an actor has neither a display name nor a login.
pub const UNNAMED: &str = "unnamed";

/// Organization and repository a run is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub org: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}

/// One page of a listing plus the page number to request next, if any.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

/// A GitHub account as embedded in pull requests, reviews and comments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    #[cfg(test)]
    pub fn from_login(login: &str) -> Self {
        Self {
            login: Some(login.to_string()),
            name: None,
        }
    }

    /// Display name, falling back to the login, then to `"unnamed"`.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .or(self.login.as_deref())
            .unwrap_or(UNNAMED)
            .to_string()
    }
}

/// Resolve an optional user into the name used for reporting.
pub fn actor_name(user: Option<&User>) -> String {
    user.map(User::display_name)
        .unwrap_or_else(|| UNNAMED.to_string())
}

/// Literal state as reported by the pull request listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListedState {
    Open,
    Closed,
}

/// Pull request as returned by the listing and single-item endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub user: Option<User>,
    pub state: ListedState,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

impl PullRequestSummary {
    pub fn author(&self) -> String {
        actor_name(self.user.as_ref())
    }

    /// Login of the author, used where the handle matters more than the name.
    pub fn author_login(&self) -> String {
        self.user
            .as_ref()
            .and_then(|u| u.login.clone())
            .unwrap_or_else(|| UNNAMED.to_string())
    }

    /// Latest known activity timestamp, used to detect stale closed requests.
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at
            .or(self.closed_at)
            .unwrap_or(self.created_at)
    }
}

/// A submitted review (approval, change request, or comment review).
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A review comment attached to a line of the diff.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestComment {
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
}

/// A conversation comment on the pull request's issue.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub commit: CommitDetail,
    /// GitHub account linked to the commit author, absent for unknown emails.
    #[serde(default)]
    pub author: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub author: Option<GitSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitSignature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl Commit {
    /// Prefer the linked GitHub account, then the git author name.
    pub fn author_name(&self) -> String {
        match (&self.author, &self.commit.author) {
            (Some(user), _) if user.name.is_some() || user.login.is_some() => user.display_name(),
            (_, Some(GitSignature { name: Some(name), .. })) => name.clone(),
            _ => UNNAMED.to_string(),
        }
    }

    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().and_then(|a| a.date)
    }
}
