pub mod collector;
pub mod diagnostics;
pub mod pipeline;
pub mod session;

pub use collector::{
    CollectionResult, Collector, FetchError, PageBatch, PageQuery, PageSource, RetryPolicy,
    PAGE_LEN_DEFAULT,
};
pub use diagnostics::DiagnosticsDir;
pub use pipeline::{run, RunReport};
pub use session::AuthSession;

use std::path::PathBuf;

use thiserror::Error;

use crate::export::ExportError;
use crate::publish::PublishError;

/// Pipeline-level failures. Endpoint errors on a single page are absent by
/// design — they degrade to a partial collection instead of aborting.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("login could not be confirmed ({reason}); diagnostics in {diag_dir}")]
    Authentication { reason: String, diag_dir: PathBuf },

    #[error("page fetch failed after {attempts} attempts: {reason}")]
    FetchExhausted { attempts: u32, reason: String },

    #[error("no rows collected; diagnostics in {diag_dir}")]
    EmptyResult { diag_dir: PathBuf },

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
