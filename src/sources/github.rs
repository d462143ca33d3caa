use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::Config,
    http::HttpFetch,
    schema::{AgentRepo, AgentRepoRecord, CollectedData, RepoTrendRecord, TrendingRepo},
    util,
};

use super::Source;

/// GitHub repository search adapters
///
/// Endpoint: GET /search/repositories
///
/// Two query variants share the response shape:
/// - trends: repos created inside the look-back window, by stars
/// - agent repos: repos mentioning agent + AI, by last update
///
/// A response without `items` is a failure.

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SearchResponse {
    pub total_count: u64,
    pub items: Option<Vec<RepoItem>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RepoItem {
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub stargazers_count: Option<u64>,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub topics: Vec<String>,
}

/// Shared list limits applied to every search result page.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub top_n: usize,
    pub description: usize,
    pub topics: usize,
}

impl Limits {
    fn from_config(cfg: &Config) -> Self {
        Self {
            top_n: cfg.sources.top_n,
            description: cfg.sources.description_limit,
            topics: cfg.sources.topic_limit,
        }
    }
}

fn parse(body: Value) -> Result<(u64, Vec<RepoItem>)> {
    let resp: SearchResponse =
        serde_json::from_value(body).context("unexpected search response shape")?;
    let items = resp
        .items
        .ok_or_else(|| anyhow!("search response has no items"))?;
    Ok((resp.total_count, items))
}

fn description(item: &RepoItem, limit: usize) -> String {
    util::truncate_chars(item.description.as_deref().unwrap_or(""), limit)
}

// ------------------------------------------------------------
// Trending (recently created) repositories
// ------------------------------------------------------------

pub struct TrendSource {
    base_url: String,
    term: String,
    window_days: i64,
    limits: Limits,
    timeout: Duration,
}

impl TrendSource {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.sources.github_url.clone(),
            term: cfg.sources.search_term.clone(),
            window_days: cfg.sources.trend_window_days,
            limits: Limits::from_config(cfg),
            timeout: Duration::from_secs(cfg.http.slow_timeout_secs),
        }
    }

    /// Search URL for repositories created after `since` (YYYY-MM-DD).
    pub fn url(&self, since: &str) -> String {
        format!(
            "{}/search/repositories?q={}+created:>{}&sort=stars&order=desc&per_page={}",
            self.base_url, self.term, since, self.limits.top_n
        )
    }

    pub fn since(&self, now: NaiveDateTime) -> String {
        util::days_before(now, self.window_days)
    }
}

pub fn normalize_trends(body: Value, since: &str, limits: Limits, fetched_at: String) -> Result<RepoTrendRecord> {
    let (total, items) = parse(body)?;

    let repos = items
        .iter()
        .take(limits.top_n)
        .map(|r| TrendingRepo {
            name: r.full_name.clone(),
            description: description(r, limits.description),
            stars: r.stargazers_count,
            language: r.language.clone(),
            created: util::date_prefix(r.created_at.as_deref().unwrap_or("")),
            topics: r.topics.iter().take(limits.topics).cloned().collect(),
        })
        .collect();

    Ok(RepoTrendRecord {
        total_new_repos: total,
        trending_repos: repos,
        search_period: format!("Since {since}"),
        fetched_at,
    })
}

#[async_trait::async_trait]
impl Source for TrendSource {
    type Record = RepoTrendRecord;

    fn key(&self) -> &'static str {
        "github_trends"
    }

    fn announce(&self) -> &'static str {
        "Fetching GitHub Solana trends..."
    }

    fn error_context(&self) -> &'static str {
        "GitHub trends fetch error"
    }

    async fn fetch(&self, http: &dyn HttpFetch) -> Result<Option<RepoTrendRecord>> {
        let since = self.since(Local::now().naive_local());
        let body = http.get_json(&self.url(&since), self.timeout).await?;
        normalize_trends(body, &since, self.limits, util::now_iso()).map(Some)
    }

    fn summary(&self, r: &RepoTrendRecord) -> String {
        format!(
            "{} new Solana repos in {} days",
            r.total_new_repos, self.window_days
        )
    }

    fn slot<'a>(&self, data: &'a mut CollectedData) -> &'a mut Option<RepoTrendRecord> {
        &mut data.github_trends
    }
}

// ------------------------------------------------------------
// AI agent repositories
// ------------------------------------------------------------

pub struct AgentRepoSource {
    base_url: String,
    term: String,
    limits: Limits,
    timeout: Duration,
}

impl AgentRepoSource {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.sources.github_url.clone(),
            term: cfg.sources.search_term.clone(),
            limits: Limits::from_config(cfg),
            timeout: Duration::from_secs(cfg.http.slow_timeout_secs),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/search/repositories?q={}+agent+AI&sort=updated&order=desc&per_page={}",
            self.base_url, self.term, self.limits.top_n
        )
    }
}

pub fn normalize_agents(body: Value, limits: Limits, fetched_at: String) -> Result<AgentRepoRecord> {
    let (total, items) = parse(body)?;

    let repos = items
        .iter()
        .take(limits.top_n)
        .map(|r| AgentRepo {
            name: r.full_name.clone(),
            description: description(r, limits.description),
            stars: r.stargazers_count,
            updated: util::date_prefix(r.updated_at.as_deref().unwrap_or("")),
        })
        .collect();

    Ok(AgentRepoRecord {
        total_count: total,
        repos,
        fetched_at,
    })
}

#[async_trait::async_trait]
impl Source for AgentRepoSource {
    type Record = AgentRepoRecord;

    fn key(&self) -> &'static str {
        "agent_repos"
    }

    fn announce(&self) -> &'static str {
        "Fetching AI Agent + Solana repos..."
    }

    fn error_context(&self) -> &'static str {
        "Agent repos fetch error"
    }

    async fn fetch(&self, http: &dyn HttpFetch) -> Result<Option<AgentRepoRecord>> {
        let body = http.get_json(&self.url(), self.timeout).await?;
        normalize_agents(body, self.limits, util::now_iso()).map(Some)
    }

    fn summary(&self, r: &AgentRepoRecord) -> String {
        format!("{} AI agent + Solana repos found", r.total_count)
    }

    fn slot<'a>(&self, data: &'a mut CollectedData) -> &'a mut Option<AgentRepoRecord> {
        &mut data.agent_repos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    const LIMITS: Limits = Limits { top_n: 10, description: 100, topics: 5 };

    fn item(i: usize) -> Value {
        json!({
            "full_name": format!("org/repo{i}"),
            "description": "x".repeat(150),
            "stargazers_count": 100 - i,
            "language": "Rust",
            "created_at": "2026-03-01T12:00:00Z",
            "updated_at": "2026-03-05T08:30:00Z",
            "topics": ["solana", "defi", "rust", "anchor", "sdk", "cli", "bot"]
        })
    }

    #[test]
    fn trends_are_truncated() {
        let items: Vec<Value> = (0..12).map(item).collect();
        let body = json!({ "total_count": 321, "incomplete_results": false, "items": items });

        let rec = normalize_trends(body, "2026-02-24", LIMITS, "t".into()).unwrap();

        assert_eq!(rec.total_new_repos, 321);
        assert_eq!(rec.trending_repos.len(), 10);
        assert_eq!(rec.search_period, "Since 2026-02-24");

        let first = &rec.trending_repos[0];
        assert_eq!(first.name.as_deref(), Some("org/repo0"));
        assert_eq!(first.description, "x".repeat(100));
        assert_eq!(first.created, "2026-03-01");
        assert_eq!(first.topics, vec!["solana", "defi", "rust", "anchor", "sdk"]);
    }

    #[test]
    fn null_fields_fall_back() {
        let body = json!({
            "total_count": 1,
            "items": [ { "full_name": "a/b", "description": null, "language": null } ]
        });
        let rec = normalize_trends(body, "2026-02-24", LIMITS, "t".into()).unwrap();
        let repo = &rec.trending_repos[0];
        assert_eq!(repo.description, "");
        assert_eq!(repo.created, "");
        assert!(repo.topics.is_empty());
        assert_eq!(repo.stars, None);
    }

    #[test]
    fn missing_items_is_an_error() {
        let body = json!({ "message": "API rate limit exceeded" });
        assert!(normalize_trends(body, "2026-02-24", LIMITS, "t".into()).is_err());
    }

    #[test]
    fn agent_repos_use_update_date() {
        let body = json!({ "total_count": 2, "items": [item(0), item(1)] });
        let rec = normalize_agents(body, LIMITS, "t".into()).unwrap();
        assert_eq!(rec.total_count, 2);
        assert_eq!(rec.repos.len(), 2);
        assert_eq!(rec.repos[1].updated, "2026-03-05");
        assert_eq!(rec.repos[1].description.chars().count(), 100);
        assert_eq!(rec.repos[1].stars, Some(99));
    }

    #[test]
    fn trend_url_uses_window_start() {
        let src = TrendSource::from_config(&Config::default());
        let now = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let since = src.since(now);
        assert_eq!(
            src.url(&since),
            "https://api.github.com/search/repositories?q=solana+created:>2026-02-24&sort=stars&order=desc&per_page=10"
        );
    }

    #[test]
    fn searches_use_slow_timeout() {
        let cfg = Config::default();
        assert_eq!(TrendSource::from_config(&cfg).timeout, Duration::from_secs(15));
        assert_eq!(AgentRepoSource::from_config(&cfg).timeout, Duration::from_secs(15));
    }

    #[test]
    fn agent_url_sorts_by_update() {
        let src = AgentRepoSource::from_config(&Config::default());
        assert_eq!(
            src.url(),
            "https://api.github.com/search/repositories?q=solana+agent+AI&sort=updated&order=desc&per_page=10"
        );
    }
}
