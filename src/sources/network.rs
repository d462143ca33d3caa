use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    config::Config,
    http::HttpFetch,
    schema::{CollectedData, NetworkRecord},
    util,
};

use super::Source;

/// Solana JSON-RPC performance adapter
///
/// Request:
/// POST { "jsonrpc": "2.0", "id": 1, "method": "getRecentPerformanceSamples", "params": [5] }
///
/// An absent or empty `result` means "no data": no record and no
/// error-log entry. Transport and parse failures, and samples with a
/// zero period, are errors.
pub struct NetworkSource {
    rpc_url: String,
    samples: u32,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSample {
    pub num_transactions: u64,
    pub sample_period_secs: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<PerformanceSample>>,
}

impl NetworkSource {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            rpc_url: cfg.sources.rpc_url.clone(),
            samples: cfg.sources.performance_samples,
            timeout: Duration::from_secs(cfg.http.slow_timeout_secs),
        }
    }

    pub fn request_body(&self) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getRecentPerformanceSamples",
            "params": [self.samples]
        })
    }
}

/// Mean of per-sample transactions-per-second, rounded to 2 decimals.
///
/// `None` for an empty slice. A sample with a zero period has no
/// rate and fails the whole computation.
pub fn average_tps(samples: &[PerformanceSample]) -> Result<Option<f64>> {
    if samples.is_empty() {
        return Ok(None);
    }

    let mut total = 0.0;
    for s in samples {
        if s.sample_period_secs == 0 {
            bail!("sample period is zero");
        }
        total += s.num_transactions as f64 / s.sample_period_secs as f64;
    }

    Ok(Some(util::round2(total / samples.len() as f64)))
}

pub fn normalize(body: Value, fetched_at: String) -> Result<Option<NetworkRecord>> {
    let resp: RpcResponse =
        serde_json::from_value(body).context("unexpected performance sample shape")?;

    let samples = match resp.result {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(None),
    };

    Ok(average_tps(&samples)?.map(|avg| NetworkRecord {
        average_tps: avg,
        samples: samples.len(),
        fetched_at,
    }))
}

#[async_trait::async_trait]
impl Source for NetworkSource {
    type Record = NetworkRecord;

    fn key(&self) -> &'static str {
        "solana_tps"
    }

    fn announce(&self) -> &'static str {
        "Fetching Solana network stats..."
    }

    fn error_context(&self) -> &'static str {
        "TPS fetch error"
    }

    async fn fetch(&self, http: &dyn HttpFetch) -> Result<Option<NetworkRecord>> {
        let body = http
            .post_json(&self.rpc_url, &self.request_body(), self.timeout)
            .await?;
        normalize(body, util::now_iso())
    }

    fn summary(&self, r: &NetworkRecord) -> String {
        format!("Average TPS: {}", r.average_tps)
    }

    fn slot<'a>(&self, data: &'a mut CollectedData) -> &'a mut Option<NetworkRecord> {
        &mut data.solana_tps
    }
}
