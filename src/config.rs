use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::github::RepoRef;

pub const CONFIG_FILE_NAME: &str = ".gh-review-stats.toml";

/// Lookback window used when neither the command line nor the file sets one.
pub const DEFAULT_DAYS_BACK: u32 = 90;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Missing required option {0}")]
    MissingOption(&'static str),

    #[error("Missing GitHub token: set github.token in the config file or GITHUB_TOKEN")]
    MissingToken,
}

/// Top-level configuration loaded from .gh-review-stats.toml.
/// All fields are optional; the tool works with only command-line flags and
/// GITHUB_TOKEN.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    /// Fallbacks for --org, --repo and --days-back
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub reviewers: ReviewersConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,

    #[serde(default)]
    pub enterprise: EnterpriseConfig,
}

/// GitHub Enterprise endpoints. Both must be set to take effect.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnterpriseConfig {
    pub base_url: Option<String>,
    pub upload_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DefaultsConfig {
    pub org: Option<String>,
    pub repo: Option<String>,
    pub days_back: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReviewersConfig {
    /// Logins or names left out of every aggregate (bots, mostly)
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Config {
    /// Load configuration from `path`, or from the default locations.
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from(&path),
                None => Ok(Config::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// `.gh-review-stats.toml` in the current directory if present,
    /// otherwise in the home directory.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        std::env::var_os("HOME").map(|home| Path::new(&home).join(CONFIG_FILE_NAME))
    }

    /// Write the configuration, including defaults for unset values.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        let mut config = self.clone();
        config.defaults.days_back.get_or_insert(DEFAULT_DAYS_BACK);
        let contents = toml::to_string_pretty(&config)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }

    /// Enterprise base and upload URLs, when both are configured.
    pub fn enterprise_urls(&self) -> Option<(&str, &str)> {
        let enterprise = &self.github.enterprise;
        match (enterprise.base_url.as_deref(), enterprise.upload_url.as_deref()) {
            (Some(base), Some(upload)) if !base.is_empty() && !upload.is_empty() => {
                Some((base, upload))
            }
            _ => None,
        }
    }
}

/// Repository options as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RepoOptions {
    pub org: Option<String>,
    pub repo: Option<String>,
    pub days_back: Option<u32>,
    pub ignore: Vec<String>,
}

/// Immutable settings for one run, built once from flags and the file.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub repo: RepoRef,
    /// 0 means no lookback limit
    pub days_back: u32,
    pub ignore: BTreeSet<String>,
    pub dev_mode: bool,
}

impl RunConfig {
    /// Merge command-line options over file values. Flags win; ignore lists
    /// from both sources are combined.
    pub fn resolve(
        options: &RepoOptions,
        config: &Config,
        dev_mode: bool,
    ) -> Result<RunConfig, ConfigError> {
        let org = options
            .org
            .clone()
            .or_else(|| config.defaults.org.clone())
            .filter(|o| !o.is_empty())
            .ok_or(ConfigError::MissingOption("--org"))?;
        let repo = options
            .repo
            .clone()
            .or_else(|| config.defaults.repo.clone())
            .filter(|r| !r.is_empty())
            .ok_or(ConfigError::MissingOption("--repo"))?;
        let days_back = options
            .days_back
            .or(config.defaults.days_back)
            .unwrap_or(DEFAULT_DAYS_BACK);
        let ignore = options
            .ignore
            .iter()
            .chain(config.reviewers.ignore.iter())
            .cloned()
            .collect();

        Ok(RunConfig {
            repo: RepoRef::new(org, repo),
            days_back,
            ignore,
            dev_mode,
        })
    }

    /// Start of the lookback window relative to `now`, if there is one.
    pub fn earliest_date(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.days_back > 0).then(|| now - Duration::days(i64::from(self.days_back)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert!(config.reviewers.ignore.is_empty());
        assert!(config.enterprise_urls().is_none());
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "abc"

[github.enterprise]
base_url = "https://ghe.example.com/api/v3/"
upload_url = "https://ghe.example.com/api/uploads/"

[defaults]
org = "acme"
days_back = 30

[reviewers]
ignore = ["dependabot[bot]", "ci-bot"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token().as_deref(), Some("abc"));
        assert_eq!(config.reviewers.ignore.len(), 2);
        assert_eq!(config.defaults.days_back, Some(30));
        assert_eq!(
            config.enterprise_urls(),
            Some((
                "https://ghe.example.com/api/v3/",
                "https://ghe.example.com/api/uploads/"
            ))
        );
    }

    #[test]
    fn test_resolve_prefers_flags_and_merges_ignore() {
        let mut config = Config::default();
        config.defaults.org = Some("file-org".to_string());
        config.defaults.repo = Some("file-repo".to_string());
        config.reviewers.ignore = vec!["bot".to_string()];
        let options = RepoOptions {
            org: Some("flag-org".to_string()),
            repo: None,
            days_back: Some(0),
            ignore: vec!["other-bot".to_string()],
        };

        let run = RunConfig::resolve(&options, &config, true).unwrap();
        assert_eq!(run.repo, RepoRef::new("flag-org", "file-repo"));
        assert_eq!(run.days_back, 0);
        assert!(run.ignore.contains("bot"));
        assert!(run.ignore.contains("other-bot"));
        assert!(run.dev_mode);
    }

    #[test]
    fn test_resolve_names_missing_option() {
        let options = RepoOptions {
            org: Some("acme".to_string()),
            ..RepoOptions::default()
        };
        let err = RunConfig::resolve(&options, &Config::default(), false).unwrap_err();
        assert_eq!(err.to_string(), "Missing required option --repo");
    }

    #[test]
    fn test_earliest_date_from_days_back() {
        let now = Utc.with_ymd_and_hms(2024, 4, 10, 0, 0, 0).unwrap();
        let mut run = RunConfig {
            repo: RepoRef::new("o", "r"),
            days_back: 10,
            ignore: BTreeSet::new(),
            dev_mode: false,
        };
        assert_eq!(
            run.earliest_date(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap())
        );
        run.days_back = 0;
        assert_eq!(run.earliest_date(now), None);
    }

    #[test]
    fn test_write_and_reload_config() {
        let path = std::env::temp_dir().join("gh-review-stats-test-config.toml");
        let mut config = Config::default();
        config.reviewers.ignore = vec!["bot".to_string()];
        config.write_to(&path).unwrap();

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded.reviewers.ignore, vec!["bot".to_string()]);
        assert_eq!(reloaded.defaults.days_back, Some(DEFAULT_DAYS_BACK));

        std::fs::remove_file(&path).ok();
    }
}
