//! Upstream source adapters
//!
//! This module provides:
//! - The `Source` trait implemented by every upstream integration
//! - One adapter module per upstream API
//!
//! All API-specific knowledge (URLs, query strings, response shapes,
//! normalization rules) lives in the adapter modules. The collector
//! only talks to sources through the `Source` trait.

pub mod github;
pub mod network;
pub mod price;
pub mod protocols;
pub mod tvl;

use anyhow::Result;

use crate::http::HttpFetch;
use crate::schema::CollectedData;

/// Source is the abstraction between the collector and one upstream API.
///
/// Each implementation must:
/// - Issue its request(s) through the supplied `HttpFetch`
/// - Turn the raw JSON into its typed, normalized record
/// - Name the slot of `CollectedData` it owns
///
/// RETURN VALUE OF `fetch`:
/// - `Ok(Some(record))`: data collected
/// - `Ok(None)`: well-formed response that carries no data, not an error
/// - `Err(_)`: transport, parse or missing-data failure
///
/// MUST NOT:
/// - Touch `CollectedData` directly (the collector stores the record)
/// - Retry
///
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    type Record: Clone + Send;

    /// Output key, e.g. "sol_price"
    fn key(&self) -> &'static str;

    /// Progress line printed before the request
    fn announce(&self) -> &'static str;

    /// Prefix of every error-log entry produced by this source
    fn error_context(&self) -> &'static str;

    async fn fetch(&self, http: &dyn HttpFetch) -> Result<Option<Self::Record>>;

    /// One-line human summary printed on success
    fn summary(&self, record: &Self::Record) -> String;

    /// The slot in the output document owned by this source
    fn slot<'a>(&self, data: &'a mut CollectedData) -> &'a mut Option<Self::Record>;
}
