//! Authenticated registry session — form login over a cookie-backed client.
//!
//! The registry is a classic server-rendered application: one username /
//! password form, a session cookie, and every later request rides that
//! cookie. Login success has no single reliable signal, so it is confirmed
//! by layered heuristics, first positive wins:
//! 1. the post-login URL no longer points at the login page;
//! 2. the page carries the link to the incident register (the action button
//!    a logged-in user lands on);
//! 3. the page carries a log-off link.
//!
//! When none pass, the full page markup is snapshotted into the diagnostics
//! bundle before the error surfaces — the only place page content is
//! persisted for debugging.

use std::time::Duration;

use crate::config::SiteConfig;

use super::collector::{FetchError, PageBatch, PageQuery, PageSource};
use super::diagnostics::DiagnosticsDir;
use super::ScrapeError;

const LOGIN_PATH: &str = "/Account/Login";
const REGISTER_PATH: &str = "/Database/RiskBookingAllList";
const PAGE_ENDPOINT_PATH: &str = "/Reports/GetRiskBookingAllList";

/// Logged-in markers, in heuristic order: the register action link, then the
/// log-off link.
const MARKER_REGISTER: &str = "RiskBookingAllList";
const MARKER_LOGOFF: &str = "LogOff";

/// Per-request timeout. Network-facing calls must never hang the pipeline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// An authenticated browsing session.
///
/// Owned by value by the pipeline; dropping it releases the connection pool
/// and the session cookies on every exit path.
pub struct AuthSession {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl AuthSession {
    /// Log in and confirm the session, or fail with
    /// [`ScrapeError::Authentication`] after snapshotting the page.
    pub fn login(site: &SiteConfig, diag: &DiagnosticsDir) -> Result<Self, ScrapeError> {
        let client = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        let base_url = site.base_url.trim_end_matches('/').to_string();
        let login_url = format!("{base_url}{LOGIN_PATH}");

        let auth_err = |reason: String| ScrapeError::Authentication {
            reason,
            diag_dir: diag.path().to_path_buf(),
        };

        // Prime the session cookies before submitting the form.
        let landing = client
            .get(&login_url)
            .send()
            .map_err(|e| auth_err(format!("login page unreachable: {e}")))?;
        let _ = landing.text();

        let response = client
            .post(&login_url)
            .form(&[("txtUserName", site.username.as_str()), ("txtPass", site.password.as_str())])
            .send()
            .map_err(|e| auth_err(format!("login submit failed: {e}")))?;

        let final_path = response.url().path().to_string();
        let body = response
            .text()
            .map_err(|e| auth_err(format!("login response unreadable: {e}")))?;

        if login_confirmed(&final_path, &body) {
            tracing::info!(base_url = %base_url, "Login confirmed");
            Ok(Self { client, base_url })
        } else {
            diag.write_login_failure(&body);
            Err(auth_err("no login heuristic passed".to_string()))
        }
    }

    /// Navigate to the incident register before paging, as the registry's
    /// own UI does. Best-effort: some deployments gate the paging endpoint
    /// behind this page view, but a failure here is not fatal.
    pub fn open_register(&self) {
        let url = format!("{}{REGISTER_PATH}", self.base_url);
        match self.client.get(&url).send() {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %url, "Incident register opened");
            }
            Ok(response) => {
                tracing::warn!(url = %url, status = %response.status(), "Incident register returned non-success");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Incident register unreachable");
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Layered login-success check, in heuristic order.
fn login_confirmed(final_path: &str, body: &str) -> bool {
    if !final_path.contains(LOGIN_PATH) {
        return true;
    }
    body.contains(MARKER_REGISTER) || body.contains(MARKER_LOGOFF)
}

impl PageSource for AuthSession {
    fn fetch_page(&self, query: &PageQuery) -> Result<PageBatch, FetchError> {
        let url = format!("{}{PAGE_ENDPOINT_PATH}", self.base_url);

        let response = self
            .client
            .post(&url)
            .form(&query.form_fields())
            .send()
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| FetchError::Transient(format!("malformed page payload: {e}")))?;

        Ok(PageBatch::from_json(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_away_from_login_confirms() {
        assert!(login_confirmed("/", ""));
        assert!(login_confirmed("/Home/Index", ""));
    }

    #[test]
    fn register_marker_confirms_despite_login_url() {
        let body = r#"<a class="btn btn-warning" href="/Database/RiskBookingAllList">รายการ</a>"#;
        assert!(login_confirmed("/Account/Login", body));
    }

    #[test]
    fn logoff_marker_confirms_despite_login_url() {
        let body = r#"<a href="/Account/LogOff">ออกจากระบบ</a>"#;
        assert!(login_confirmed("/Account/Login", body));
    }

    #[test]
    fn no_signal_means_not_confirmed() {
        let body = "<form id=\"loginForm\"><input id=\"txtUserName\"></form>";
        assert!(!login_confirmed("/Account/Login", body));
    }
}
