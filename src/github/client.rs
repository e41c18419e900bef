//! GitHub REST API client for pull requests and their review activity

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::types::{
    Commit, IssueComment, Page, PullRequestComment, PullRequestSummary, RepoRef, Review,
};
use super::{GitHubError, PullRequestSource};

/// Number of items requested per page for every listing.
pub const PAGE_SIZE: u32 = 50;

const PUBLIC_API: &str = "https://api.github.com/";

/// Wait suggested for a rate-limit rejection that carries no timing headers.
const DEFAULT_RETRY_AFTER: u64 = 60;

pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    base_url: Url,
    upload_url: Option<Url>,
}

impl GitHubClient {
    /// Client for public github.com.
    pub fn new(token: impl Into<String>) -> Result<Self, GitHubError> {
        Self::with_base_url(token, PUBLIC_API)
    }

    /// Client pointed at an arbitrary API root (used for tests and proxies).
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self, GitHubError> {
        Ok(Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: parse_root(base_url)?,
            upload_url: None,
        })
    }

    /// Client for a GitHub Enterprise installation. Both URLs must parse.
    pub fn enterprise(
        token: impl Into<String>,
        base_url: &str,
        upload_url: &str,
    ) -> Result<Self, GitHubError> {
        let mut client = Self::with_base_url(token, base_url)?;
        client.upload_url = Some(parse_root(upload_url)?);
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn upload_url(&self) -> Option<&Url> {
        self.upload_url.as_ref()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("gh-review-stats"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", self.token)) {
            headers.insert(AUTHORIZATION, val);
        }
        headers
    }

    fn url(&self, path: &str) -> Result<Url, GitHubError> {
        self.base_url
            .join(path)
            .map_err(|e| GitHubError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response, GitHubError> {
        debug!(%url, "GET");
        let resp = self.client.get(url.clone()).headers(self.headers()).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GitHubError::NotFound(url.to_string()));
        }
        if let Some(retry_after) = rate_limit_wait(status, resp.headers()) {
            return Err(GitHubError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let url = self.url(path)?;
        Ok(self.send(url).await?.json().await?)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, &str)],
        page: u32,
    ) -> Result<Page<T>, GitHubError> {
        let mut url = self.url(path)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in extra_query {
                query.append_pair(key, value);
            }
            query
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());
        }

        let resp = self.send(url).await?;
        let next_page = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_page);
        let items: Vec<T> = resp.json().await?;
        debug!(page, items = items.len(), ?next_page, "received page");

        Ok(Page { items, next_page })
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        page: u32,
    ) -> Result<Page<PullRequestSummary>, GitHubError> {
        let path = format!("repos/{}/{}/pulls", repo.org, repo.repo);
        self.get_page(&path, &[("state", "all")], page).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequestSummary, GitHubError> {
        let path = format!("repos/{}/{}/pulls/{}", repo.org, repo.repo, number);
        self.get(&path).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<IssueComment>, GitHubError> {
        let path = format!("repos/{}/{}/issues/{}/comments", repo.org, repo.repo, number);
        self.get_page(&path, &[], page).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_review_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<PullRequestComment>, GitHubError> {
        let path = format!("repos/{}/{}/pulls/{}/comments", repo.org, repo.repo, number);
        self.get_page(&path, &[], page).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_reviews(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<Review>, GitHubError> {
        let path = format!("repos/{}/{}/pulls/{}/reviews", repo.org, repo.repo, number);
        self.get_page(&path, &[], page).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_commits(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<Commit>, GitHubError> {
        let path = format!("repos/{}/{}/pulls/{}/commits", repo.org, repo.repo, number);
        self.get_page(&path, &[], page).await
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn is_merged(&self, repo: &RepoRef, number: u64) -> Result<bool, GitHubError> {
        let path = format!("repos/{}/{}/pulls/{}/merge", repo.org, repo.repo, number);
        // 204 when merged, 404 when not
        match self.send(self.url(&path)?).await {
            Ok(_) => Ok(true),
            Err(GitHubError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Seconds to wait when a response is a rate-limit rejection.
///
/// A 429 always is. A 403 only counts when GitHub says so through
/// `retry-after` or an exhausted `x-ratelimit-remaining`; any other 403 is a
/// permission problem.
fn rate_limit_wait(status: StatusCode, headers: &HeaderMap) -> Option<u64> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let retry_after = header("retry-after").and_then(|s| s.trim().parse::<u64>().ok());
    let exhausted = header("x-ratelimit-remaining").is_some_and(|s| s.trim() == "0");

    let limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && (retry_after.is_some() || exhausted));
    if !limited {
        return None;
    }

    let until_reset = header("x-ratelimit-reset")
        .and_then(|s| s.trim().parse::<i64>().ok())
        .map(|reset| (reset - Utc::now().timestamp()).max(0) as u64);
    Some(retry_after.or(until_reset).unwrap_or(DEFAULT_RETRY_AFTER))
}

/// Parse an API root, adding the trailing slash `Url::join` relies on.
fn parse_root(raw: &str) -> Result<Url, GitHubError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|e| GitHubError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Extract the `page` parameter of the `rel="next"` entry of a Link header.
pub fn parse_next_page(link: &str) -> Option<u32> {
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|p| p.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let url = Url::parse(target.trim_start_matches('<').trim_end_matches('>')).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}
