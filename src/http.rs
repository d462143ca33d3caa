use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::HttpConfig;
use crate::metrics::METRICS;

/// HttpFetch is the only seam between the collector and the network.
///
/// Every source talks JSON, so both calls return a parsed
/// `serde_json::Value`; turning it into a typed upstream shape is
/// the source module's job.
///
/// CONTRACT:
/// - Any transport error, non-2xx status, timeout or non-JSON body
///   is an `Err`.
/// - Implementations never retry.
///
#[async_trait::async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value>;

    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value>;
}

/// reqwest-backed implementation used by the binary.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&cfg.user_agent).context("invalid user agent")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }

    async fn execute(&self, req: reqwest::RequestBuilder, url: &str) -> Result<Value> {
        METRICS.requests_sent.fetch_add(1, Ordering::Relaxed);

        let result = async {
            let resp = req.send().await?.error_for_status()?;
            let body = resp.bytes().await?;
            METRICS.bytes_received.fetch_add(body.len(), Ordering::Relaxed);
            let value: Value = serde_json::from_slice(&body)?;
            Ok::<Value, anyhow::Error>(value)
        }
        .await
        .with_context(|| format!("Error fetching {url}"));

        if result.is_err() {
            METRICS.request_errors.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

#[async_trait::async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value> {
        log::debug!("GET {url} (timeout {}s)", timeout.as_secs());
        self.execute(self.client.get(url).timeout(timeout), url).await
    }

    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value> {
        log::debug!("POST {url} (timeout {}s)", timeout.as_secs());
        self.execute(self.client.post(url).json(body).timeout(timeout), url)
            .await
    }
}

#[async_trait::async_trait]
impl HttpFetch for Box<dyn HttpFetch> {
    async fn get_json(&self, url: &str, timeout: Duration) -> Result<Value> {
        (**self).get_json(url, timeout).await
    }

    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value> {
        (**self).post_json(url, body, timeout).await
    }
}

/// Stand-in used when no HTTP client could be built.
///
/// Every request fails with the build error, so each source still
/// lands in the error log and the run still produces a document.
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn fail(&self, url: &str) -> Result<Value> {
        METRICS.request_errors.fetch_add(1, Ordering::Relaxed);
        Err(anyhow::anyhow!("HTTP client unavailable: {}", self.reason))
            .with_context(|| format!("Error fetching {url}"))
    }
}

#[async_trait::async_trait]
impl HttpFetch for Unavailable {
    async fn get_json(&self, url: &str, _timeout: Duration) -> Result<Value> {
        self.fail(url)
    }

    async fn post_json(&self, url: &str, _body: &Value, _timeout: Duration) -> Result<Value> {
        self.fail(url)
    }
}

/// Builds the client from `cfg`, then from defaults, then gives up
/// with an `Unavailable` fetcher. Never fails.
pub fn build_fetcher(cfg: &HttpConfig) -> Box<dyn HttpFetch> {
    match ReqwestFetcher::new(cfg) {
        Ok(f) => return Box::new(f),
        Err(e) => log::warn!("http settings rejected ({e:#}); using defaults"),
    }

    match ReqwestFetcher::new(&HttpConfig::default()) {
        Ok(f) => Box::new(f),
        Err(e) => {
            log::error!("could not build HTTP client: {e:#}");
            Box::new(Unavailable::new(format!("{e:#}")))
        }
    }
}
