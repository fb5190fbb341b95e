//! Pagination-loop behavior against scripted page sources.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use riskbook::records::RawRow;
use riskbook::scraper::{
    CollectionResult, Collector, DiagnosticsDir, FetchError, PageBatch, PageQuery, PageSource,
    RetryPolicy, ScrapeError,
};

/// Replays a scripted sequence of responses and records every query it sees.
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<PageBatch, FetchError>>>,
    queries: Mutex<Vec<PageQuery>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<PageBatch, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl PageSource for ScriptedSource {
    fn fetch_page(&self, query: &PageQuery) -> Result<PageBatch, FetchError> {
        self.queries.lock().unwrap().push(*query);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PageBatch::default()))
    }
}

fn page(rows: usize, offset: usize, total: Option<u64>) -> PageBatch {
    PageBatch {
        rows: (0..rows)
            .map(|i| RawRow::keyed([("Code", format!("AE-{}", offset + i))]))
            .collect(),
        records_total: total,
    }
}

fn fast_collector() -> Collector {
    Collector {
        page_length: 100,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        },
    }
}

fn collect(
    source: &ScriptedSource,
    diag: &DiagnosticsDir,
) -> Result<CollectionResult, ScrapeError> {
    fast_collector().collect(source, diag)
}

#[test]
fn walks_pages_in_order_until_reported_total() {
    let tmp = tempfile::tempdir().unwrap();
    let diag = DiagnosticsDir::at(tmp.path().join("_diag"));
    let source = ScriptedSource::new(vec![
        Ok(page(100, 0, Some(150))),
        Ok(page(50, 100, Some(150))),
    ]);

    let result = collect(&source, &diag).unwrap();

    assert_eq!(result.rows.len(), 150);
    assert_eq!(result.total_reported, Some(150));

    // Exactly two requests: draw increments, start moves by page length.
    let queries = source.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!((queries[0].draw, queries[0].start), (1, 0));
    assert_eq!((queries[1].draw, queries[1].start), (2, 100));

    // Order preserved across window boundaries.
    assert_eq!(result.rows[0], RawRow::keyed([("Code", "AE-0")]));
    assert_eq!(result.rows[100], RawRow::keyed([("Code", "AE-100")]));
    assert_eq!(result.rows[149], RawRow::keyed([("Code", "AE-149")]));
}

#[test]
fn short_page_stops_without_total() {
    let tmp = tempfile::tempdir().unwrap();
    let diag = DiagnosticsDir::at(tmp.path().join("_diag"));
    let source = ScriptedSource::new(vec![Ok(page(42, 0, None))]);

    let result = collect(&source, &diag).unwrap();

    assert_eq!(result.rows.len(), 42);
    assert_eq!(result.total_reported, None);
    assert_eq!(source.queries().len(), 1);
}

#[test]
fn total_is_latched_from_first_page() {
    let tmp = tempfile::tempdir().unwrap();
    let diag = DiagnosticsDir::at(tmp.path().join("_diag"));
    // A later page disagreeing about the total must not extend the loop.
    let source = ScriptedSource::new(vec![
        Ok(page(100, 0, Some(150))),
        Ok(page(50, 100, Some(999))),
    ]);

    let result = collect(&source, &diag).unwrap();
    assert_eq!(result.rows.len(), 150);
    assert_eq!(result.total_reported, Some(150));
    assert_eq!(source.queries().len(), 2);
}

#[test]
fn empty_first_page_yields_empty_result() {
    let tmp = tempfile::tempdir().unwrap();
    let diag = DiagnosticsDir::at(tmp.path().join("_diag"));
    let source = ScriptedSource::new(vec![Ok(page(0, 0, Some(0)))]);

    let result = collect(&source, &diag).unwrap();
    assert!(result.rows.is_empty());

    let summary = std::fs::read_to_string(diag.path().join("summary.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(json["collected"], 0);
}

#[test]
fn endpoint_error_keeps_partial_rows_and_records_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let diag = DiagnosticsDir::at(tmp.path().join("_diag"));
    let source = ScriptedSource::new(vec![
        Ok(page(100, 0, Some(150))),
        Err(FetchError::Endpoint {
            status: 500,
            body: "Internal Server Error".to_string(),
        }),
    ]);

    // Not an error: the 100 rows already collected survive.
    let result = collect(&source, &diag).unwrap();
    assert_eq!(result.rows.len(), 100);

    let artifact = std::fs::read_to_string(diag.path().join("request_100.txt")).unwrap();
    assert!(artifact.starts_with("HTTP 500"));
    assert!(artifact.contains("Internal Server Error"));

    // summary.json reflects the partial collection.
    let summary = std::fs::read_to_string(diag.path().join("summary.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(json["total_reported"], 150);
    assert_eq!(json["collected"], 100);
}

#[test]
fn transient_failure_is_retried_then_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let diag = DiagnosticsDir::at(tmp.path().join("_diag"));
    let source = ScriptedSource::new(vec![
        Err(FetchError::Transient("connection reset".to_string())),
        Err(FetchError::Transient("connection reset".to_string())),
        Ok(page(10, 0, Some(10))),
    ]);

    let result = collect(&source, &diag).unwrap();
    assert_eq!(result.rows.len(), 10);

    // Three fetches, all for the same window.
    let queries = source.queries();
    assert_eq!(queries.len(), 3);
    assert!(queries.iter().all(|q| q.start == 0 && q.draw == 1));
}

#[test]
fn exhausted_retries_fail_the_collection() {
    let tmp = tempfile::tempdir().unwrap();
    let diag = DiagnosticsDir::at(tmp.path().join("_diag"));
    let source = ScriptedSource::new(vec![
        Err(FetchError::Transient("timeout".to_string())),
        Err(FetchError::Transient("timeout".to_string())),
        Err(FetchError::Transient("timeout".to_string())),
    ]);

    let err = collect(&source, &diag).unwrap_err();
    match err {
        ScrapeError::FetchExhausted { attempts, reason } => {
            assert_eq!(attempts, 3);
            assert_eq!(reason, "timeout");
        }
        other => panic!("expected FetchExhausted, got {other:?}"),
    }
    assert_eq!(source.queries().len(), 3);

    // The summary is still written on the failure path.
    assert!(diag.path().join("summary.json").exists());
}
