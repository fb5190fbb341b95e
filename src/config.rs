//! Startup configuration.
//!
//! Every environment read lives here; core modules receive explicit config
//! structs and never touch the environment themselves. Required settings
//! fail fast with a named variable instead of surfacing mid-run.

use std::path::PathBuf;

use thiserror::Error;

use crate::scraper::PAGE_LEN_DEFAULT;

pub const APP_NAME: &str = "riskbook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {var} is not a valid {expected}: {value}")]
    InvalidVar {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Target site and credentials for the authenticated session.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// Where to push the export on GitHub. Presence of this struct is the
/// publish capability — decided at startup, not probed mid-run.
#[derive(Debug, Clone)]
pub struct GithubTarget {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub repo_path: String,
    pub commit_message: String,
}

/// Full configuration for a scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub site: SiteConfig,
    pub csv_path: PathBuf,
    pub page_length: u64,
    pub github: Option<GithubTarget>,
}

/// Configuration for the summary API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub csv_path: PathBuf,
    pub port: u16,
    pub cors_origin: Option<String>,
    pub cache_max_age: u32,
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match optional(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar {
            var,
            expected,
            value,
        }),
    }
}

impl ScrapeConfig {
    /// Read the scrape configuration from the environment.
    ///
    /// Required: `RISKBOOK_BASE_URL`, `RISKBOOK_USERNAME`, `RISKBOOK_PASSWORD`.
    /// GitHub publishing is enabled iff `GITHUB_TOKEN` is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let site = SiteConfig {
            base_url: required("RISKBOOK_BASE_URL")?,
            username: required("RISKBOOK_USERNAME")?,
            password: required("RISKBOOK_PASSWORD")?,
        };

        let csv_path = PathBuf::from(
            optional("RISKBOOK_CSV_PATH").unwrap_or_else(|| "data/incidents.csv".to_string()),
        );

        let page_length = parsed("RISKBOOK_PAGE_LENGTH", "integer", PAGE_LEN_DEFAULT)?;

        let github = match optional("GITHUB_TOKEN") {
            None => None,
            Some(token) => Some(GithubTarget {
                token,
                owner: required("RISKBOOK_GITHUB_OWNER")?,
                repo: required("RISKBOOK_GITHUB_REPO")?,
                branch: optional("RISKBOOK_GITHUB_BRANCH").unwrap_or_else(|| "main".to_string()),
                repo_path: optional("RISKBOOK_GITHUB_PATH")
                    .unwrap_or_else(|| "data/incidents.csv".to_string()),
                commit_message: optional("RISKBOOK_GITHUB_MESSAGE")
                    .unwrap_or_else(|| "update incidents.csv".to_string()),
            }),
        };

        Ok(Self {
            site,
            csv_path,
            page_length,
            github,
        })
    }
}

impl ApiConfig {
    /// Read the API configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            csv_path: PathBuf::from(
                optional("RISKBOOK_CSV_PATH").unwrap_or_else(|| "data/incidents.csv".to_string()),
            ),
            port: parsed("RISKBOOK_PORT", "port number", 8080)?,
            cors_origin: optional("RISKBOOK_CORS_ORIGIN"),
            cache_max_age: parsed("RISKBOOK_CACHE_MAX_AGE", "integer", 60)?,
        })
    }
}
