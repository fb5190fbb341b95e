//! GitHub content publishing — idempotent "upsert file by path".
//!
//! The contents API rejects a plain create when the file already exists, so
//! the publisher first looks up the blob at `path`/`branch` and, when found,
//! carries its `sha` into the write. Same call, create or update.

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GithubTarget;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub rejects requests without a User-Agent.
const USER_AGENT: &str = concat!("riskbook/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("github request failed: {0}")]
    Http(String),

    #[error("github rejected the upload (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed github response: {0}")]
    Malformed(String),
}

/// Publishes one file into a repository branch.
pub struct GithubPublisher {
    client: reqwest::blocking::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    branch: String,
    repo_path: String,
}

#[derive(Deserialize)]
struct ExistingBlob {
    sha: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    content: UploadedContent,
}

#[derive(Deserialize)]
struct UploadedContent {
    html_url: String,
}

impl GithubPublisher {
    pub fn new(target: &GithubTarget) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: target.token.clone(),
            owner: target.owner.clone(),
            repo: target.repo.clone(),
            branch: target.branch.clone(),
            repo_path: target.repo_path.clone(),
        }
    }

    /// Point at a different API host (GitHub Enterprise, test doubles).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, self.repo_path
        )
    }

    /// Upload `content` to the target path, updating in place when the file
    /// already exists. Returns the uploaded file's `html_url`.
    pub fn publish(&self, content: &[u8], message: &str) -> Result<String, PublishError> {
        let url = self.contents_url();

        let existing_sha = self.lookup_existing_sha(&url)?;

        let mut payload = serde_json::json!({
            "message": message,
            "content": base64::engine::general_purpose::STANDARD.encode(content),
            "branch": self.branch,
        });
        if let Some(sha) = existing_sha {
            payload["sha"] = serde_json::Value::String(sha);
        }

        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .json(&payload)
            .send()
            .map_err(|e| PublishError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .map_err(|e| PublishError::Malformed(e.to_string()))?;
        Ok(uploaded.content.html_url)
    }

    /// `sha` of the blob currently at the path, or `None` when absent.
    /// Any non-200 lookup is treated as "not there yet" — the PUT will tell
    /// us if something is actually wrong.
    fn lookup_existing_sha(&self, url: &str) -> Result<Option<String>, PublishError> {
        let response = self
            .client
            .get(url)
            .query(&[("ref", self.branch.as_str())])
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .map_err(|e| PublishError::Http(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Ok(None);
        }

        let blob: ExistingBlob = response
            .json()
            .map_err(|e| PublishError::Malformed(e.to_string()))?;
        Ok(Some(blob.sha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> GithubTarget {
        GithubTarget {
            token: "t0ken".into(),
            owner: "hospital-qa".into(),
            repo: "incident-data".into(),
            branch: "main".into(),
            repo_path: "data/incidents.csv".into(),
            commit_message: "update incidents.csv".into(),
        }
    }

    #[test]
    fn contents_url_includes_owner_repo_and_path() {
        let publisher = GithubPublisher::new(&target());
        assert_eq!(
            publisher.contents_url(),
            "https://api.github.com/repos/hospital-qa/incident-data/contents/data/incidents.csv"
        );
    }

    #[test]
    fn with_api_base_trims_trailing_slash() {
        let publisher = GithubPublisher::new(&target()).with_api_base("http://127.0.0.1:9999/");
        assert!(publisher
            .contents_url()
            .starts_with("http://127.0.0.1:9999/repos/"));
    }

    #[test]
    fn user_agent_carries_crate_version() {
        assert!(USER_AGENT.starts_with("riskbook/"));
    }
}
