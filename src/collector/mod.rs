/// Collector module
///
/// This module groups all logic responsible for:
/// - Driving each upstream source once per run
/// - Storing normalized records into the run document
/// - Keeping the run's error log
///
/// The collector is the orchestration layer between:
/// - Source adapters (price, RPC, DeFiLlama, GitHub)
/// - The output document (`CollectedData`)
///
/// Design notes:
/// - API-specific logic MUST NOT live here
/// - All state is owned by one `Collector` instance; a fresh
///   instance is used per run
/// - No fetch ever returns an error to the caller: failures become
///   log entries and `FetchOutcome::Failed`
pub mod runner;

use crate::{
    config::Config,
    http::HttpFetch,
    schema::{
        AgentRepoRecord, CollectedData, NetworkRecord, PriceRecord, ProtocolRankingRecord,
        RepoTrendRecord, TvlRecord,
    },
    sources::{
        Source,
        github::{AgentRepoSource, TrendSource},
        network::NetworkSource,
        price::PriceSource,
        protocols::ProtocolSource,
        tvl::TvlSource,
    },
};

/// Result of one fetch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<R> {
    /// Record stored under the source's key
    Collected(R),

    /// Well-formed response without data; nothing stored, nothing logged
    NoData,

    /// Failure message, also appended to the error log
    Failed(String),
}

#[cfg(test)]
impl<R> FetchOutcome<R> {
    pub fn record(self) -> Option<R> {
        match self {
            FetchOutcome::Collected(r) => Some(r),
            _ => None,
        }
    }
}

pub struct Collector<H: HttpFetch> {
    http: H,
    config: Config,
    data: CollectedData,
    errors: Vec<String>,
}

impl<H: HttpFetch> Collector<H> {
    pub fn new(http: H, config: Config) -> Self {
        Self {
            http,
            config,
            data: CollectedData::default(),
            errors: Vec::new(),
        }
    }

    pub fn data(&self) -> &CollectedData {
        &self.data
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Runs one source end to end and records the outcome.
    ///
    /// A successful record overwrites whatever the slot held.
    async fn collect<S: Source>(&mut self, source: S) -> FetchOutcome<S::Record> {
        println!("  → {}", source.announce());

        match source.fetch(&self.http).await {
            Ok(Some(record)) => {
                println!("    ✓ {}", source.summary(&record));
                *source.slot(&mut self.data) = Some(record.clone());
                FetchOutcome::Collected(record)
            }

            Ok(None) => {
                log::debug!("{}: upstream returned no data", source.key());
                FetchOutcome::NoData
            }

            Err(e) => {
                let message = format!("{}: {e:#}", source.error_context());
                log::warn!("[{}] {message}", source.key());

                let short: String = format!("{e:#}").chars().take(60).collect();
                println!("    ✗ Error: {short}");

                self.errors.push(message.clone());
                FetchOutcome::Failed(message)
            }
        }
    }

    pub async fn fetch_price(&mut self) -> FetchOutcome<PriceRecord> {
        let source = PriceSource::from_config(&self.config);
        self.collect(source).await
    }

    pub async fn fetch_network_performance(&mut self) -> FetchOutcome<NetworkRecord> {
        let source = NetworkSource::from_config(&self.config);
        self.collect(source).await
    }

    pub async fn fetch_tvl(&mut self) -> FetchOutcome<TvlRecord> {
        let source = TvlSource::from_config(&self.config);
        self.collect(source).await
    }

    pub async fn fetch_protocols(&mut self) -> FetchOutcome<ProtocolRankingRecord> {
        let source = ProtocolSource::from_config(&self.config);
        self.collect(source).await
    }

    pub async fn fetch_trending_repos(&mut self) -> FetchOutcome<RepoTrendRecord> {
        let source = TrendSource::from_config(&self.config);
        self.collect(source).await
    }

    pub async fn fetch_agent_repos(&mut self) -> FetchOutcome<AgentRepoRecord> {
        let source = AgentRepoSource::from_config(&self.config);
        self.collect(source).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::http::mock::MockFetch;
    use serde_json::{Value, json};

    pub const PRICE: &str = "https://api.coingecko.com/api/v3/simple/price";
    pub const RPC: &str = "https://api.mainnet-beta.solana.com";
    pub const CHAINS: &str = "https://api.llama.fi/v2/chains";
    pub const PROTOCOLS: &str = "https://api.llama.fi/protocols";
    pub const TRENDS: &str = "https://api.github.com/search/repositories?q=solana+created";
    pub const AGENTS: &str = "https://api.github.com/search/repositories?q=solana+agent";

    fn repo(i: usize) -> Value {
        json!({
            "full_name": format!("org/repo{i}"),
            "description": "d".repeat(150),
            "stargazers_count": 50,
            "language": "TypeScript",
            "created_at": "2026-03-01T00:00:00Z",
            "updated_at": "2026-03-02T00:00:00Z",
            "topics": ["a", "b"]
        })
    }

    /// Every source answering with realistic data.
    pub fn healthy_upstream() -> MockFetch {
        let protocols: Vec<Value> = (0..15)
            .map(|i| json!({ "name": format!("p{i}"), "chains": ["Solana"], "tvl": (i as f64) * 1e6 }))
            .collect();

        MockFetch::new()
            .json(PRICE, json!({ "solana": { "usd": 150.0, "usd_24h_change": 1.5, "usd_market_cap": 7.0e10 } }))
            .json(RPC, json!({ "result": [
                { "numTransactions": 100, "samplePeriodSecs": 10 },
                { "numTransactions": 200, "samplePeriodSecs": 10 }
            ] }))
            .json(CHAINS, json!([{ "name": "Solana", "tvl": 4_520_000_000.0 }]))
            .json(PROTOCOLS, Value::Array(protocols))
            .json(TRENDS, json!({ "total_count": 42, "items": [repo(0), repo(1)] }))
            .json(AGENTS, json!({ "total_count": 7, "items": [repo(2)] }))
    }

    fn collector(http: MockFetch) -> Collector<MockFetch> {
        Collector::new(http, Config::default())
    }

    #[tokio::test]
    async fn price_success_is_stored_and_returned() {
        let mut c = collector(healthy_upstream());

        let rec = c.fetch_price().await.record().unwrap();

        assert_eq!(rec.price, Some(150.0));
        assert_eq!(c.data().sol_price.as_ref(), Some(&rec));
        assert!(c.errors().is_empty());
    }

    #[tokio::test]
    async fn network_average_from_rpc() {
        let mut c = collector(healthy_upstream());
        let rec = c.fetch_network_performance().await.record().unwrap();
        assert_eq!(rec.average_tps, 15.0);
        assert_eq!(rec.samples, 2);
    }

    #[tokio::test]
    async fn empty_samples_are_silent() {
        let mut c = collector(MockFetch::new().json(RPC, json!({ "result": [] })));

        assert_eq!(c.fetch_network_performance().await, FetchOutcome::NoData);
        assert!(c.data().solana_tps.is_none());
        assert!(c.errors().is_empty());
    }

    #[tokio::test]
    async fn rpc_failure_is_logged() {
        let mut c = collector(MockFetch::new().fail(RPC, "timed out"));

        let outcome = c.fetch_network_performance().await;

        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        assert_eq!(c.errors().len(), 1);
        assert!(c.errors()[0].starts_with("TPS fetch error: Error fetching"));
        assert!(c.errors()[0].ends_with("timed out"));
    }

    #[tokio::test]
    async fn missing_price_entry_fails_without_record() {
        let mut c = collector(MockFetch::new().json(PRICE, json!({})));

        let outcome = c.fetch_price().await;

        assert!(matches!(outcome, FetchOutcome::Failed(ref m) if m.starts_with("Price fetch error:")));
        assert!(c.data().sol_price.is_none());
        assert_eq!(c.errors().len(), 1);
    }

    #[tokio::test]
    async fn tvl_and_protocols() {
        let mut c = collector(healthy_upstream());

        let tvl = c.fetch_tvl().await.record().unwrap();
        assert_eq!(tvl.tvl_formatted, "$4.52B");

        let ranking = c.fetch_protocols().await.record().unwrap();
        assert_eq!(ranking.total_solana_protocols, 15);
        assert_eq!(ranking.top_10.len(), 10);
        assert_eq!(ranking.top_10[0].tvl, 14.0);
    }

    #[tokio::test]
    async fn repo_searches() {
        let mut c = collector(healthy_upstream());

        let trends = c.fetch_trending_repos().await.record().unwrap();
        assert_eq!(trends.total_new_repos, 42);
        assert_eq!(trends.trending_repos[0].description.len(), 100);
        assert!(trends.search_period.starts_with("Since "));

        let agents = c.fetch_agent_repos().await.record().unwrap();
        assert_eq!(agents.total_count, 7);
        assert_eq!(agents.repos[0].updated, "2026-03-02");

        let calls = c.http.called();
        assert!(calls[0].contains("sort=stars&order=desc"));
        assert!(calls[1].contains("sort=updated&order=desc"));
    }

    #[tokio::test]
    async fn refetch_overwrites_slot() {
        let mut c = collector(healthy_upstream());
        c.fetch_tvl().await;
        c.fetch_tvl().await;
        assert_eq!(c.data().source_count(), 1);
        assert!(c.errors().is_empty());
    }
}
