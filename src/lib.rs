//! riskbook — session-authenticated retrieval of hospital incident reports.
//!
//! The crate has two halves:
//!
//! - **scrape**: log in to the registry, walk the paginated listing endpoint,
//!   normalize each row into a fixed canonical schema, write an atomic CSV
//!   export, and optionally publish it to a GitHub repository.
//! - **serve**: an HTTP API that aggregates the local export into a summary
//!   payload (counts by severity, by unit, daily timeline) with caching
//!   headers and exact-origin CORS.
//!
//! The scrape side is synchronous on purpose: one session, one page at a
//! time, in registry order. Only the API server is async.

pub mod api;
pub mod config;
pub mod export;
pub mod publish;
pub mod records;
pub mod scraper;
