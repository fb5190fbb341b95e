//! End-to-end scrape run: login → paginate → normalize → export → publish.
//!
//! One authenticated session drives the whole run, strictly sequentially.
//! The session lives only for the collection phase and is released on every
//! exit path. Export success and publish outcome are reported independently:
//! a failed publish fails the run, but the CSV already on disk stays valid.

use std::path::PathBuf;

use crate::config::ScrapeConfig;
use crate::export;
use crate::publish::GithubPublisher;
use crate::records::normalize::normalize_row;
use crate::records::CanonicalRecord;

use super::collector::Collector;
use super::diagnostics::DiagnosticsDir;
use super::session::AuthSession;
use super::ScrapeError;

/// Terminal outcome of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub csv_path: PathBuf,
    pub rows: usize,
    pub published_url: Option<String>,
}

/// Run the full pipeline.
pub fn run(config: &ScrapeConfig) -> Result<RunReport, ScrapeError> {
    let diag = DiagnosticsDir::for_export(&config.csv_path);

    // The session is scoped to collection; it drops (and releases its
    // connections) whether collection succeeds or errors out.
    let collected = {
        let session = AuthSession::login(&config.site, &diag)?;
        session.open_register();
        Collector::with_page_length(config.page_length).collect(&session, &diag)?
    };

    if collected.rows.is_empty() {
        return Err(ScrapeError::EmptyResult {
            diag_dir: diag.path().to_path_buf(),
        });
    }

    let records: Vec<CanonicalRecord> = collected.rows.iter().map(normalize_row).collect();

    export::write_csv(&records, &config.csv_path)?;
    tracing::info!(
        path = %config.csv_path.display(),
        rows = records.len(),
        "Saved CSV"
    );

    let published_url = match &config.github {
        Some(target) => {
            let content = std::fs::read(&config.csv_path)?;
            let url = GithubPublisher::new(target).publish(&content, &target.commit_message)?;
            tracing::info!(url = %url, "Pushed export to GitHub");
            Some(url)
        }
        None => None,
    };

    Ok(RunReport {
        csv_path: config.csv_path.clone(),
        rows: records.len(),
        published_url,
    })
}
