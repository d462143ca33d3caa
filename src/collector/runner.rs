use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{
    http::HttpFetch,
    schema::{CollectedData, Metadata},
    util,
};

use super::{Collector, FetchOutcome};

/// Number of sources attempted by `run_all`.
pub const SOURCES_QUERIED: usize = 6;

impl<H: HttpFetch> Collector<H> {
    /// Runs every source once, in fixed order, then stamps the metadata.
    ///
    /// GUARANTEES:
    /// - Never fails; a run where every source fails still returns a
    ///   document holding the metadata record
    /// - `metadata.successful` is counted from the final document
    /// - `metadata.errors` equals the error-log length
    ///
    /// Sources are awaited one after another. Order only affects the
    /// console output; the sources do not interact.
    pub async fn run_all(&mut self) -> &CollectedData {
        println!("\n📡 Collecting real-time Solana ecosystem data...\n");

        let outcomes = [
            tally(self.fetch_price().await),
            tally(self.fetch_network_performance().await),
            tally(self.fetch_tvl().await),
            tally(self.fetch_protocols().await),
            tally(self.fetch_trending_repos().await),
            tally(self.fetch_agent_repos().await),
        ];

        let count = |t: Tally| outcomes.iter().filter(|o| **o == t).count();
        log::info!(
            "run finished: {} collected, {} without data, {} failed",
            count(Tally::Collected),
            count(Tally::NoData),
            count(Tally::Failed)
        );

        self.data.metadata = Some(Metadata {
            collected_at: util::now_iso(),
            sources_queried: SOURCES_QUERIED,
            successful: self.data.source_count(),
            errors: self.errors.len(),
        });

        println!(
            "\n✅ Data collection complete: {} sources, {} errors",
            self.data.source_count(),
            self.errors.len()
        );

        &self.data
    }

    /// Writes the document as pretty-printed UTF-8 JSON.
    ///
    /// Keys follow `CollectedData` field order; non-ASCII text is
    /// written unescaped.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.data)
            .context("failed to serialize collected data")?;

        fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;

        if self.config.debug.as_ref().is_some_and(|d| d.log.unwrap_or(false)) {
            log::debug!("persisted document: {}", serde_json::to_string(&self.data)?);
        }

        println!("📦 Saved to {}", path.display());
        Ok(path.to_path_buf())
    }

    /// `persist` to the configured output path.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.config.output.path.clone();
        self.persist(path)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Tally {
    Collected,
    NoData,
    Failed,
}

fn tally<R>(outcome: FetchOutcome<R>) -> Tally {
    match outcome {
        FetchOutcome::Collected(_) => Tally::Collected,
        FetchOutcome::NoData => Tally::NoData,
        FetchOutcome::Failed(_) => Tally::Failed,
    }
}
