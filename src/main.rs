// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:    Configuration structs loaded from JSON
// - schema:    Strongly typed output records
// - util:      Shared helpers (time, truncation, formatting)
// - http:      HTTP seam and the reqwest-backed client
// - sources:   One adapter per upstream API
// - collector: Run state, fetch operations, orchestration, persistence
// - metrics:   Process-wide request counters
//
mod config;
mod schema;
mod util;
mod http;
mod sources;
mod collector;
mod metrics;

use config::Config;
use collector::Collector;
use http::HttpFetch;
use metrics::METRICS;

use std::fs;
use std::io::ErrorKind;
use std::sync::atomic::Ordering;

/// Default configuration file, overridable with `COLLECTOR_CONFIG`.
const CONFIG_PATH: &str = "collector.json";

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize logging
// - Load configuration (falling back to defaults)
// - Run one collection and persist it
// - Report errors and counters
//
// Exit status is always 0: partial or total upstream failure is
// reported on stdout and in the document's metadata.
//
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::var("COLLECTOR_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
    let config = match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("ignoring config {path}: {e:#}");
            Config::default()
        }
    };

    let http = http::build_fetcher(&config.http);
    let collector = run(http, config).await;

    if !collector.errors().is_empty() {
        println!("\n⚠️ Errors encountered:");
        for err in collector.errors() {
            let short: String = err.chars().take(80).collect();
            println!("  - {short}");
        }
    }

    println!(
        "[METRICS] requests={} request_errors={} bytes={}",
        METRICS.requests_sent.load(Ordering::Relaxed),
        METRICS.request_errors.load(Ordering::Relaxed),
        METRICS.bytes_received.load(Ordering::Relaxed),
    );
}

// ------------------------------------------------------------
// One full collection
// ------------------------------------------------------------
//
// Always runs every source and always attempts the save; a save
// failure is reported, not raised.
//
async fn run<H: HttpFetch>(http: H, config: Config) -> Collector<H> {
    let mut collector = Collector::new(http, config);
    collector.run_all().await;
    if collector.data().source_count() == 0 {
        log::warn!("no source produced data; writing metadata only");
    }

    if let Err(e) = collector.save() {
        log::error!("{e:#}");
        println!("❌ Could not save collected data: {e:#}");
    }

    collector
}

// ------------------------------------------------------------
// Configuration loader
// ------------------------------------------------------------
//
// A missing file is not an error: every field has a default.
//
fn load_config(path: &str) -> anyhow::Result<Config> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e.into()),
    };
    let cfg = serde_json::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_means_defaults() {
        let cfg = load_config("/definitely/not/here/collector.json").unwrap();
        assert_eq!(cfg.output.path, "live_data.json");
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.json");
        fs::write(&path, r#"{ "output": { "path": "snapshot.json" } }"#).unwrap();

        let cfg = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.output.path, "snapshot.json");
    }

    #[tokio::test]
    async fn bad_user_agent_still_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.json");
        fs::write(
            dir.path().join("collector.json"),
            format!(
                r#"{{ "http": {{ "user_agent": "bad\nagent" }},
                     "sources": {{ "coingecko_url": "http://127.0.0.1:9", "rpc_url": "http://127.0.0.1:9",
                                   "llama_url": "http://127.0.0.1:9", "github_url": "http://127.0.0.1:9" }},
                     "output": {{ "path": {:?} }} }}"#,
                out.to_str().unwrap()
            ),
        )
        .unwrap();
        let config = load_config(dir.path().join("collector.json").to_str().unwrap()).unwrap();
        assert_eq!(config.http.user_agent, "bad\nagent");

        let http = http::build_fetcher(&config.http);
        let collector = run(http, config).await;

        let written: schema::CollectedData =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let meta = written.metadata.unwrap();
        assert_eq!(meta.sources_queried, 6);
        assert_eq!(meta.errors, collector.errors().len());
        assert!(collector.errors().iter().all(|e| !e.contains("HTTP client unavailable")));
    }

    #[tokio::test]
    async fn unavailable_client_writes_metadata_only_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.path = dir.path().join("out.json").to_str().unwrap().to_string();

        let collector = run(http::Unavailable::new("no TLS backend"), config.clone()).await;
        assert_eq!(collector.errors().len(), 6);

        let written: schema::CollectedData =
            serde_json::from_str(&fs::read_to_string(&config.output.path).unwrap()).unwrap();
        assert_eq!(written.source_count(), 0);
        let meta = written.metadata.unwrap();
        assert_eq!(meta.successful, 0);
        assert_eq!(meta.errors, 6);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load_config(path.to_str().unwrap()).is_err());
    }
}
