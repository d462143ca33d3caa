use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::Config,
    http::HttpFetch,
    schema::{CollectedData, ProtocolRankingRecord, ProtocolSummary},
    util,
};

use super::Source;

/// DeFiLlama protocol ranking adapter
///
/// Endpoint: GET /protocols
///
/// Protocols are kept when their `chains` list contains the chain
/// name exactly, ranked by TVL (highest first, ties keep upstream
/// order) and cut to the top N. The total count is taken before
/// the cut.
pub struct ProtocolSource {
    base_url: String,
    chain: String,
    top_n: usize,
    timeout: Duration,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Protocol {
    pub name: Option<String>,
    pub chains: Option<Vec<String>>,
    pub tvl: Option<f64>,
    pub category: Option<String>,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
}

impl Protocol {
    fn deployed_on(&self, chain: &str) -> bool {
        self.chains
            .as_ref()
            .is_some_and(|chains| chains.iter().any(|c| c == chain))
    }
}

impl ProtocolSource {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.sources.llama_url.clone(),
            chain: cfg.sources.chain.clone(),
            top_n: cfg.sources.top_n,
            timeout: Duration::from_secs(cfg.http.default_timeout_secs),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/protocols", self.base_url)
    }
}

/// Filter, rank and truncate a protocol list.
pub fn rank(protocols: Vec<Protocol>, chain: &str, top_n: usize) -> (usize, Vec<ProtocolSummary>) {
    let mut on_chain: Vec<Protocol> = protocols
        .into_iter()
        .filter(|p| p.deployed_on(chain))
        .collect();

    // sort_by is stable: equal TVLs keep their upstream order
    on_chain.sort_by(|a, b| b.tvl.unwrap_or(0.0).total_cmp(&a.tvl.unwrap_or(0.0)));

    let total = on_chain.len();
    let top = on_chain
        .into_iter()
        .take(top_n)
        .map(|p| ProtocolSummary {
            name: p.name,
            tvl: util::round2(p.tvl.unwrap_or(0.0) / 1e6),
            category: p.category,
            change_1d: p.change_1d,
            change_7d: p.change_7d,
        })
        .collect();

    (total, top)
}

pub fn normalize(body: Value, chain: &str, top_n: usize, fetched_at: String) -> Result<ProtocolRankingRecord> {
    let protocols: Vec<Protocol> =
        serde_json::from_value(body).context("unexpected protocol list shape")?;

    let (total, top) = rank(protocols, chain, top_n);

    Ok(ProtocolRankingRecord {
        total_solana_protocols: total,
        top_10: top,
        fetched_at,
    })
}

#[async_trait::async_trait]
impl Source for ProtocolSource {
    type Record = ProtocolRankingRecord;

    fn key(&self) -> &'static str {
        "top_protocols"
    }

    fn announce(&self) -> &'static str {
        "Fetching top Solana protocols..."
    }

    fn error_context(&self) -> &'static str {
        "Protocols fetch error"
    }

    async fn fetch(&self, http: &dyn HttpFetch) -> Result<Option<ProtocolRankingRecord>> {
        let body = http.get_json(&self.url(), self.timeout).await?;
        normalize(body, &self.chain, self.top_n, util::now_iso()).map(Some)
    }

    fn summary(&self, r: &ProtocolRankingRecord) -> String {
        format!("Found {} Solana protocols", r.total_solana_protocols)
    }

    fn slot<'a>(&self, data: &'a mut CollectedData) -> &'a mut Option<ProtocolRankingRecord> {
        &mut data.top_protocols
    }
}
