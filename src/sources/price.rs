use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    config::Config,
    http::HttpFetch,
    schema::{CollectedData, PriceRecord},
    util,
};

use super::Source;

/// CoinGecko simple-price adapter
///
/// Endpoint:
/// GET /simple/price?ids=<coin>&vs_currencies=usd&include_24hr_change=true&include_market_cap=true
///
/// Response shape:
/// { "<coin>": { "usd": 150.1, "usd_24h_change": -2.3, "usd_market_cap": 7.1e10 } }
///
/// A response without the `<coin>` entry is a failure. Individual
/// quote fields may be missing and are stored as null.
pub struct PriceSource {
    base_url: String,
    coin_id: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Quote {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    usd_market_cap: Option<f64>,
}

impl PriceSource {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.sources.coingecko_url.clone(),
            coin_id: cfg.sources.coin_id.clone(),
            timeout: Duration::from_secs(cfg.http.default_timeout_secs),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true&include_market_cap=true",
            self.base_url, self.coin_id
        )
    }
}

/// Extract the quote for `coin_id` from a simple-price response.
pub fn normalize(body: Value, coin_id: &str, fetched_at: String) -> Result<PriceRecord> {
    let mut quotes: Map<String, Value> = match body {
        Value::Object(map) => map,
        _ => bail!("unexpected price response shape"),
    };

    let entry = quotes
        .remove(coin_id)
        .ok_or_else(|| anyhow!("price response has no '{coin_id}' entry"))?;
    let quote: Quote =
        serde_json::from_value(entry).with_context(|| format!("unexpected '{coin_id}' quote shape"))?;

    Ok(PriceRecord {
        price: quote.usd,
        change_24h: quote.usd_24h_change,
        market_cap: quote.usd_market_cap,
        fetched_at,
    })
}

#[async_trait::async_trait]
impl Source for PriceSource {
    type Record = PriceRecord;

    fn key(&self) -> &'static str {
        "sol_price"
    }

    fn announce(&self) -> &'static str {
        "Fetching SOL price..."
    }

    fn error_context(&self) -> &'static str {
        "Price fetch error"
    }

    async fn fetch(&self, http: &dyn HttpFetch) -> Result<Option<PriceRecord>> {
        let body = http.get_json(&self.url(), self.timeout).await?;
        normalize(body, &self.coin_id, util::now_iso()).map(Some)
    }

    fn summary(&self, r: &PriceRecord) -> String {
        format!(
            "SOL: ${:.2} ({:+.2}% 24h)",
            r.price.unwrap_or(0.0),
            r.change_24h.unwrap_or(0.0)
        )
    }

    fn slot<'a>(&self, data: &'a mut CollectedData) -> &'a mut Option<PriceRecord> {
        &mut data.sol_price
    }
}
