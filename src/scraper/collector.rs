//! Paginated collection against the registry's server-side paging endpoint.
//!
//! The endpoint speaks the DataTables protocol: form-encoded requests with a
//! `draw` sequence number, a zero-based `start` offset and a page `length`,
//! answered with a JSON payload under `data` or `aaData` and a reported total
//! under `recordsTotal` or `iTotalRecords`.
//!
//! **Design**:
//! - `PageSource` is the seam between the loop and the wire — the
//!   authenticated session implements it in production, scripted fakes in
//!   tests.
//! - Transient (network-layer) failures of a single page fetch are retried
//!   with exponential backoff; a non-success HTTP response is not retried —
//!   it ends the loop and the rows already collected survive, on the theory
//!   that partial data beats none. The caller decides whether a short result
//!   is acceptable.
//! - `summary.json` is written on every exit path, success or not.

use serde_json::Value;

use crate::records::RawRow;

use super::diagnostics::DiagnosticsDir;
use super::ScrapeError;

/// Default page size; raise if the server allows more per window.
pub const PAGE_LEN_DEFAULT: u64 = 100;

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

/// One page request: `draw` is 1-based and increments per request, `start`
/// is the 0-based row offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub draw: u64,
    pub start: u64,
    pub length: u64,
}

impl PageQuery {
    /// The form fields of one page request, ordered as the registry's own
    /// list page sends them. The descending sort on column 0 is part of the
    /// server contract and keeps paging windows deterministic.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("draw", self.draw.to_string()),
            ("start", self.start.to_string()),
            ("length", self.length.to_string()),
            ("search[value]", String::new()),
            ("search[regex]", "false".to_string()),
            ("order[0][column]", "0".to_string()),
            ("order[0][dir]", "desc".to_string()),
        ]
    }
}

/// One successful endpoint response.
#[derive(Debug, Clone, Default)]
pub struct PageBatch {
    pub rows: Vec<RawRow>,
    pub records_total: Option<u64>,
}

impl PageBatch {
    /// Parse an endpoint response body. Rows arrive under `data` or `aaData`
    /// (first present wins); the total under `recordsTotal` or
    /// `iTotalRecords`. Object rows become keyed rows, array rows positional;
    /// anything else is skipped.
    pub fn from_json(body: &Value) -> Self {
        let rows = body
            .get("data")
            .or_else(|| body.get("aaData"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_row).collect())
            .unwrap_or_default();

        let records_total = body
            .get("recordsTotal")
            .or_else(|| body.get("iTotalRecords"))
            .and_then(Value::as_u64);

        Self {
            rows,
            records_total,
        }
    }
}

fn parse_row(item: &Value) -> Option<RawRow> {
    match item {
        Value::Object(map) => Some(RawRow::Keyed(
            map.iter()
                .map(|(k, v)| (k.clone(), cell_text(v)))
                .collect(),
        )),
        Value::Array(cells) => Some(RawRow::Positional(cells.iter().map(cell_text).collect())),
        _ => None,
    }
}

/// Coerce a JSON cell to text: the endpoint mixes strings, numbers and nulls.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Failure of a single page fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network-layer failure (connect, timeout, malformed body) — retried.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// Non-success HTTP response — not retried; ends the loop early.
    #[error("endpoint returned status {status}")]
    Endpoint { status: u16, body: String },
}

/// The seam between the pagination loop and the wire.
pub trait PageSource {
    fn fetch_page(&self, query: &PageQuery) -> Result<PageBatch, FetchError>;
}

// ═══════════════════════════════════════════════════════════
// Retry policy
// ═══════════════════════════════════════════════════════════

/// Bounded retry for transient page-fetch failures: up to `max_attempts`
/// tries, waiting `base_delay * 2^n` between them, capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: std::time::Duration,
    pub max_delay: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: std::time::Duration::from_secs(1),
            max_delay: std::time::Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> std::time::Duration {
        let doubled = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        doubled.min(self.max_delay)
    }
}

// ═══════════════════════════════════════════════════════════
// Collector
// ═══════════════════════════════════════════════════════════

/// Everything the paging loop produced: rows in server return order
/// (append-only, duplicates preserved) plus the latched reported total.
#[derive(Debug, Default)]
pub struct CollectionResult {
    pub rows: Vec<RawRow>,
    pub total_reported: Option<u64>,
}

/// Offset-pagination loop over a [`PageSource`].
#[derive(Debug, Clone, Copy)]
pub struct Collector {
    pub page_length: u64,
    pub retry: RetryPolicy,
}

impl Default for Collector {
    fn default() -> Self {
        Self {
            page_length: PAGE_LEN_DEFAULT,
            retry: RetryPolicy::default(),
        }
    }
}

impl Collector {
    pub fn with_page_length(page_length: u64) -> Self {
        Self {
            page_length,
            ..Self::default()
        }
    }

    /// Collect every available row.
    ///
    /// Stops when the server returns a short page, when the collected count
    /// reaches the reported total, when a page comes back empty, or when a
    /// page request returns a non-success status (recorded per offset in the
    /// diagnostics bundle; the rows collected so far are returned, not
    /// discarded). Exhausting the retry budget on one page is fatal.
    /// `summary.json` is written on every exit path.
    pub fn collect(
        &self,
        source: &dyn PageSource,
        diag: &DiagnosticsDir,
    ) -> Result<CollectionResult, ScrapeError> {
        let mut rows: Vec<RawRow> = Vec::new();
        let mut total: Option<u64> = None;
        let mut start: u64 = 0;
        let mut draw: u64 = 1;

        loop {
            let query = PageQuery {
                draw,
                start,
                length: self.page_length,
            };

            let batch = match self.fetch_with_retry(source, &query) {
                Ok(batch) => batch,
                Err(FetchError::Endpoint { status, body }) => {
                    tracing::warn!(start, status, "Page request rejected; keeping partial result");
                    diag.write_request_failure(start, status, &body);
                    break;
                }
                Err(FetchError::Transient(reason)) => {
                    diag.write_summary(total, rows.len());
                    return Err(ScrapeError::FetchExhausted {
                        attempts: self.retry.max_attempts,
                        reason,
                    });
                }
            };

            // The reported total is latched the first time it is seen and
            // assumed stable across pages.
            if total.is_none() {
                total = batch.records_total;
            }

            if batch.rows.is_empty() {
                break;
            }

            let got = batch.rows.len() as u64;
            rows.extend(batch.rows);

            match total {
                Some(t) if t > 0 => {
                    let pct = (rows.len() as u64 * 100 / t).min(100);
                    tracing::info!(collected = rows.len(), total = t, percent = pct, "Collected rows");
                }
                _ => tracing::info!(collected = rows.len(), "Collected rows"),
            }

            if got < self.page_length {
                break;
            }
            if let Some(t) = total {
                if rows.len() as u64 >= t {
                    break;
                }
            }

            start += self.page_length;
            draw += 1;
        }

        diag.write_summary(total, rows.len());
        Ok(CollectionResult {
            rows,
            total_reported: total,
        })
    }

    fn fetch_with_retry(
        &self,
        source: &dyn PageSource,
        query: &PageQuery,
    ) -> Result<PageBatch, FetchError> {
        let mut attempt = 1;
        loop {
            match source.fetch_page(query) {
                Ok(batch) => return Ok(batch),
                err @ Err(FetchError::Endpoint { .. }) => return err,
                Err(FetchError::Transient(reason)) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(FetchError::Transient(reason));
                    }
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        start = query.start,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason,
                        "Transient page-fetch failure; retrying"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
