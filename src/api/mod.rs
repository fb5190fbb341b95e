//! Aggregated summary API over the local CSV export.
//!
//! A thin read-through cache: every request re-reads the export, aggregates,
//! and serves JSON with caching headers (`Cache-Control`, a content-hash
//! `ETag` honoring `If-None-Match`) and exact-origin CORS.

pub mod server;
pub mod summary;

pub use server::{serve, serve_on, ApiServer, ServeError};
pub use summary::{aggregate, SummaryPayload};
