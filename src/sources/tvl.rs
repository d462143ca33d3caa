use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::Config,
    http::HttpFetch,
    schema::{CollectedData, TvlRecord},
    util,
};

use super::Source;

/// DeFiLlama chain TVL adapter
///
/// Endpoint: GET /v2/chains
///
/// The chain entry is matched by name, case-insensitively. A list
/// without the chain is a failure.
pub struct TvlSource {
    base_url: String,
    chain: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ChainEntry {
    pub name: Option<String>,
    pub tvl: Option<f64>,
}

impl TvlSource {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.sources.llama_url.clone(),
            chain: cfg.sources.chain.clone(),
            timeout: Duration::from_secs(cfg.http.default_timeout_secs),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/v2/chains", self.base_url)
    }
}

pub fn normalize(body: Value, chain: &str, fetched_at: String) -> Result<TvlRecord> {
    let chains: Vec<ChainEntry> =
        serde_json::from_value(body).context("unexpected chain list shape")?;

    let entry = chains
        .iter()
        .find(|c| {
            c.name
                .as_deref()
                .is_some_and(|n| n.to_lowercase() == chain.to_lowercase())
        })
        .ok_or_else(|| anyhow!("chain '{chain}' not found in chain list"))?;

    let tvl = entry.tvl.unwrap_or(0.0);

    Ok(TvlRecord {
        tvl,
        tvl_formatted: util::format_billions(tvl),
        fetched_at,
    })
}

#[async_trait::async_trait]
impl Source for TvlSource {
    type Record = TvlRecord;

    fn key(&self) -> &'static str {
        "defi_tvl"
    }

    fn announce(&self) -> &'static str {
        "Fetching Solana DeFi TVL..."
    }

    fn error_context(&self) -> &'static str {
        "TVL fetch error"
    }

    async fn fetch(&self, http: &dyn HttpFetch) -> Result<Option<TvlRecord>> {
        let body = http.get_json(&self.url(), self.timeout).await?;
        normalize(body, &self.chain, util::now_iso()).map(Some)
    }

    fn summary(&self, r: &TvlRecord) -> String {
        format!("Solana TVL: {}", r.tvl_formatted)
    }

    fn slot<'a>(&self, data: &'a mut CollectedData) -> &'a mut Option<TvlRecord> {
        &mut data.defi_tvl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_chain_case_insensitively() {
        let body = json!([
            { "name": "Ethereum", "tvl": 60_000_000_000.0 },
            { "name": "SOLANA", "tvl": 4_520_000_000.0, "tokenSymbol": "SOL" }
        ]);
        let rec = normalize(body, "Solana", "t".into()).unwrap();
        assert_eq!(rec.tvl, 4_520_000_000.0);
        assert_eq!(rec.tvl_formatted, "$4.52B");
    }

    #[test]
    fn missing_tvl_counts_as_zero() {
        let rec = normalize(json!([{ "name": "Solana" }]), "Solana", "t".into()).unwrap();
        assert_eq!(rec.tvl, 0.0);
        assert_eq!(rec.tvl_formatted, "$0.00B");
    }

    #[test]
    fn absent_chain_is_an_error() {
        let err = normalize(json!([{ "name": "Ethereum", "tvl": 1.0 }]), "Solana", "t".into())
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn uses_default_timeout() {
        let src = TvlSource::from_config(&Config::default());
        assert_eq!(src.timeout, Duration::from_secs(10));
    }

    #[test]
    fn non_list_body_is_an_error() {
        assert!(normalize(json!({ "message": "rate limited" }), "Solana", "t".into()).is_err());
    }
}
