//! Failure diagnostics bundle — artifacts written next to the export.
//!
//! Lives at `<export parent>/_diag`. Created lazily on the first write and
//! never cleaned up, so artifacts from earlier runs stay inspectable.
//! Writers log and carry on instead of panicking — a failed diagnostic write
//! must never take down the pipeline it is diagnosing.
//!
//! **Artifacts**:
//! - `login_failed.html` — full page markup when no login heuristic passed
//! - `request_<start>.txt` — status + body of a failed page request
//! - `summary.json` — `{total_reported, collected}`, written at every loop exit

use std::path::{Path, PathBuf};

/// Handle to the diagnostics directory for one pipeline run.
#[derive(Debug, Clone)]
pub struct DiagnosticsDir {
    dir: PathBuf,
}

impl DiagnosticsDir {
    /// Conventional location: a `_diag` sibling of the export file.
    pub fn for_export(csv_path: &Path) -> Self {
        let parent = csv_path.parent().unwrap_or_else(|| Path::new("."));
        Self {
            dir: parent.join("_diag"),
        }
    }

    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Snapshot of the page markup after a failed login.
    pub fn write_login_failure(&self, html: &str) {
        self.write("login_failed.html", html.as_bytes());
    }

    /// Status and body of a non-success page request, keyed by row offset.
    pub fn write_request_failure(&self, start: u64, status: u16, body: &str) {
        let text = format!("HTTP {status}\n{body}");
        self.write(&format!("request_{start}.txt"), text.as_bytes());
    }

    /// Collection summary, written unconditionally when the paging loop exits.
    pub fn write_summary(&self, total_reported: Option<u64>, collected: usize) {
        let summary = serde_json::json!({
            "total_reported": total_reported,
            "collected": collected,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => self.write("summary.json", json.as_bytes()),
            Err(e) => tracing::warn!(error = %e, "Diagnostics: failed to serialize summary"),
        }
    }

    fn write(&self, filename: &str, data: &[u8]) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(
                path = %self.dir.display(),
                error = %e,
                "Diagnostics: failed to create directory"
            );
            return;
        }
        let path = self.dir.join(filename);
        match std::fs::write(&path, data) {
            Ok(()) => tracing::debug!(
                path = %path.display(),
                size = data.len(),
                "Diagnostics: artifact written"
            ),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Diagnostics: failed to write artifact"
            ),
        }
    }
}
