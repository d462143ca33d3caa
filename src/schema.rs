use serde::{Serialize, Deserialize};

/// The document produced by one collection run.
///
/// One optional slot per source plus the run metadata. Field order
/// is the serialization order, which matches the fixed fetch order
/// of the runner so the output reads top to bottom.
///
/// A source slot is `None` when that source failed or had no data;
/// absent slots are omitted from the serialized document entirely.
///
/// DESIGN NOTES:
/// - Only the collector's fetch methods write source slots (one each).
/// - Only the runner writes `metadata`.
/// - Nothing is ever removed within a run.
///
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CollectedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sol_price: Option<PriceRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub solana_tps: Option<NetworkRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub defi_tvl: Option<TvlRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_protocols: Option<ProtocolRankingRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_trends: Option<RepoTrendRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_repos: Option<AgentRepoRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl CollectedData {
    /// Number of source slots holding a record (metadata excluded).
    pub fn source_count(&self) -> usize {
        [
            self.sol_price.is_some(),
            self.solana_tps.is_some(),
            self.defi_tvl.is_some(),
            self.top_protocols.is_some(),
            self.github_trends.is_some(),
            self.agent_repos.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

// ------------------------------------------------------------
// Price record
// ------------------------------------------------------------
//
// Every numeric field is nullable: the price API may omit any
// of them and the record is still stored.
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceRecord {
    /// Spot price in USD
    pub price: Option<f64>,

    /// 24h change in percent
    pub change_24h: Option<f64>,

    /// Market capitalization in USD
    pub market_cap: Option<f64>,

    /// Local ISO-8601 timestamp of the successful fetch
    pub fetched_at: String,
}

// ------------------------------------------------------------
// Network performance record
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkRecord {
    /// Mean of per-sample TPS, rounded to 2 decimals
    pub average_tps: f64,

    /// Number of samples returned by the node
    pub samples: usize,

    pub fetched_at: String,
}

// ------------------------------------------------------------
// TVL record
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TvlRecord {
    /// Raw TVL in USD
    pub tvl: f64,

    /// Always expressed in billions, e.g. "$4.52B"
    pub tvl_formatted: String,

    pub fetched_at: String,
}

// ------------------------------------------------------------
// Protocol ranking record
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProtocolRankingRecord {
    /// Protocols deployed on the chain, counted before truncation
    pub total_solana_protocols: usize,

    /// Highest TVL first
    pub top_10: Vec<ProtocolSummary>,

    pub fetched_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProtocolSummary {
    pub name: Option<String>,

    /// TVL in millions of USD, rounded to 2 decimals
    pub tvl: f64,

    pub category: Option<String>,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
}

// ------------------------------------------------------------
// Repository trend record
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepoTrendRecord {
    /// Total matches reported by the search API (not just the page)
    pub total_new_repos: u64,

    pub trending_repos: Vec<TrendingRepo>,

    /// "Since YYYY-MM-DD"
    pub search_period: String,

    pub fetched_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendingRepo {
    /// `owner/name`
    pub name: Option<String>,

    /// At most 100 characters
    pub description: String,

    pub stars: Option<u64>,
    pub language: Option<String>,

    /// Date-only prefix (YYYY-MM-DD) of the creation timestamp
    pub created: String,

    /// At most 5 entries
    pub topics: Vec<String>,
}

// ------------------------------------------------------------
// Agent repository record
// ------------------------------------------------------------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AgentRepoRecord {
    pub total_count: u64,
    pub repos: Vec<AgentRepo>,
    pub fetched_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AgentRepo {
    pub name: Option<String>,
    pub description: String,
    pub stars: Option<u64>,

    /// Date-only prefix of the last update timestamp
    pub updated: String,
}

// ------------------------------------------------------------
// Run metadata
// ------------------------------------------------------------
//
// `successful` is derived from the final document, never from a
// running counter, so it always equals the number of source slots
// present.
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Metadata {
    pub collected_at: String,
    pub sources_queried: usize,
    pub successful: usize,
    pub errors: usize,
}
