use serde::Deserialize;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// Top-level configuration structure loaded from `collector.json`.
//
// Every field carries a default, so a missing file or a partial
// file both yield a usable configuration:
// - Upstream endpoints and query parameters
// - HTTP client behavior (user agent, timeouts)
// - Output location
// - Optional debug configuration
//
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Upstream API endpoints and query parameters
    pub sources: SourcesConfig,

    /// HTTP client settings
    pub http: HttpConfig,

    /// Where the collected document is written
    pub output: OutputConfig,

    /// Optional debug configuration
    pub debug: Option<DebugConfig>,
}

// ------------------------------------------------------------
// Source configuration
// ------------------------------------------------------------
//
// Base URLs have no trailing slash; paths are appended by the
// source modules.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    /// CoinGecko API base (price quotes)
    pub coingecko_url: String,

    /// JSON-RPC endpoint (performance samples)
    pub rpc_url: String,

    /// DeFiLlama API base (chains + protocols)
    pub llama_url: String,

    /// GitHub REST API base (repository search)
    pub github_url: String,

    /// Asset identifier used by the price API
    pub coin_id: String,

    /// Chain name as DeFiLlama spells it ("Solana")
    pub chain: String,

    /// Free-text term used in repository searches
    pub search_term: String,

    /// Number of performance samples requested from the RPC node
    pub performance_samples: u32,

    /// Look-back window for newly created repositories
    pub trend_window_days: i64,

    /// Length of every ranked list in the output
    pub top_n: usize,

    /// Maximum characters kept from a repository description
    pub description_limit: usize,

    /// Maximum topics kept per repository
    pub topic_limit: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            llama_url: "https://api.llama.fi".to_string(),
            github_url: "https://api.github.com".to_string(),
            coin_id: "solana".to_string(),
            chain: "Solana".to_string(),
            search_term: "solana".to_string(),
            performance_samples: 5,
            trend_window_days: 14,
            top_n: 10,
            description_limit: 100,
            topic_limit: 5,
        }
    }
}

// ------------------------------------------------------------
// HTTP configuration
// ------------------------------------------------------------
//
// Timeouts are per request. A timeout is handled exactly like
// any other request failure.
//
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    /// Sent as `User-Agent` on every request (GitHub rejects requests without one)
    pub user_agent: String,

    /// Timeout for price and DeFiLlama requests
    pub default_timeout_secs: u64,

    /// Timeout for the RPC node and GitHub search
    pub slow_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "SolanaNarrativeDetector/1.0".to_string(),
            default_timeout_secs: 10,
            slow_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file path
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "live_data.json".to_string(),
        }
    }
}

// ------------------------------------------------------------
// Debug configuration
// ------------------------------------------------------------
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DebugConfig {
    /// Logs the full serialized document at debug level
    pub log: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.sources.chain, "Solana");
        assert_eq!(cfg.sources.top_n, 10);
        assert_eq!(cfg.http.slow_timeout_secs, 15);
        assert_eq!(cfg.output.path, "live_data.json");
        assert!(cfg.debug.is_none());
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let cfg: Config = serde_json::from_str(
            r#"{ "sources": { "chain": "Ethereum" }, "debug": { "log": true } }"#,
        )
        .unwrap();
        assert_eq!(cfg.sources.chain, "Ethereum");
        assert_eq!(cfg.sources.coin_id, "solana");
        assert_eq!(cfg.debug.and_then(|d| d.log), Some(true));
    }
}
