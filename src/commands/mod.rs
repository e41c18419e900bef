pub mod config_gen;
pub mod pr_history;
pub mod pull_requests;
pub mod reviewers;

use clap::Args;
use std::num::ParseIntError;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, ConfigError, RepoOptions};
use crate::github::{GitHubClient, GitHubError};
use crate::pagination::CancelFlag;
use crate::report::ReportError;
use crate::stats::StatsError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not create GitHub client: {0}")]
    GitHub(#[from] GitHubError),

    #[error("could not generate stats: {0}")]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("pull-request-id must be a number, got {value:?}: {source}")]
    InvalidPullRequestId { value: String, source: ParseIntError },
}

/// Options shared by every command that reads a repository.
#[derive(Args, Debug, Clone, Default)]
pub struct RepoArgs {
    /// GitHub organization
    #[arg(short, long)]
    pub org: Option<String>,

    /// GitHub repository
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Leave a reviewer out of the report (useful for bots), can be repeated
    #[arg(short, long, value_delimiter = ',')]
    pub ignore: Vec<String>,
}

impl RepoArgs {
    pub fn to_options(&self, days_back: Option<u32>) -> RepoOptions {
        RepoOptions {
            org: self.org.clone(),
            repo: self.repo.clone(),
            days_back,
            ignore: self.ignore.clone(),
        }
    }
}

/// State shared by all commands for one invocation.
pub struct CommandContext {
    pub config: Config,
    pub dev_mode: bool,
    pub cancel: CancelFlag,
}

/// Build an authenticated client, pointed at GitHub Enterprise when both
/// enterprise URLs are configured. Fails before any request without a token.
pub fn build_client(config: &Config) -> Result<GitHubClient, CommandError> {
    let token = config.github_token().ok_or(ConfigError::MissingToken)?;
    let client = match config.enterprise_urls() {
        Some((base_url, upload_url)) => GitHubClient::enterprise(token, base_url, upload_url)?,
        None => GitHubClient::new(token)?,
    };
    debug!(base_url = %client.base_url(), upload_url = ?client.upload_url(), "created GitHub client");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_uses_enterprise_urls() {
        let mut config = Config::default();
        config.github.token = Some("token".to_string());
        config.github.enterprise.base_url = Some("https://ghe.example.com/api/v3".to_string());
        config.github.enterprise.upload_url = Some("https://ghe.example.com/api/uploads".to_string());

        let client = build_client(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "https://ghe.example.com/api/v3/");
    }

    #[test]
    fn test_build_client_defaults_to_public_api() {
        let mut config = Config::default();
        config.github.token = Some("token".to_string());
        let client = build_client(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.github.com/");
        assert!(client.upload_url().is_none());
    }
}
