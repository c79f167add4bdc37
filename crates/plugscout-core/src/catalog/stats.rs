//! Repository statistics
//!
//! Stars, forks, push time and open issues from the GitHub REST API, cached
//! per marketplace for 24h. Stats are display-only: every failure degrades
//! to the listing's bundled snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::CacheKind;
use crate::context::ScoutContext;
use crate::error::{Result, ScoutError};
use crate::retry::RetryPolicy;
use crate::source::parse_github_repo;

use super::types::{CatalogListing, RepoStats};

/// Subset of `GET /repos/{owner}/{repo}`
#[derive(Debug, Deserialize)]
struct RepoMetadata {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    open_issues_count: u64,
}

impl From<RepoMetadata> for RepoStats {
    fn from(meta: RepoMetadata) -> Self {
        Self {
            stars: meta.stargazers_count,
            forks: meta.forks_count,
            last_pushed_at: meta.pushed_at,
            open_issues: meta.open_issues_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsFetcher {
    ctx: Arc<ScoutContext>,
    retry: RetryPolicy,
}

impl StatsFetcher {
    /// Stats use a single attempt; rate-limited display data is not worth
    /// waiting for.
    pub fn new(ctx: Arc<ScoutContext>) -> Self {
        Self {
            ctx,
            retry: RetryPolicy::single_attempt(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Metadata endpoint for a repository URL
    pub fn stats_url(&self, repository_url: &str) -> Result<String> {
        let repo = parse_github_repo(repository_url)?;
        Ok(format!(
            "{}/repos/{}/{}",
            self.ctx.network.api_base_url.trim_end_matches('/'),
            repo.owner,
            repo.repo
        ))
    }

    /// Live stats for one listing, cache-first.
    pub async fn fetch_stats(&self, listing: &CatalogListing) -> Result<RepoStats> {
        if let Some(stats) = self
            .ctx
            .cache
            .load::<RepoStats>(CacheKind::Stats, &listing.name)?
        {
            return Ok(stats);
        }

        let url = self.stats_url(&listing.repository_url)?;
        let http = &self.ctx.http;
        let token = self.ctx.github_token.as_deref();
        let stats_url = url.as_str();
        let body = self
            .retry
            .run(&listing.name, move |_| http.get_api(stats_url, token))
            .await?;

        let meta: RepoMetadata =
            serde_json::from_slice(&body).map_err(|source| ScoutError::Decode {
                what: format!("repository metadata for '{}'", listing.name),
                source,
            })?;
        let stats = RepoStats::from(meta);

        if let Err(e) = self
            .ctx
            .cache
            .save(CacheKind::Stats, &listing.name, &stats, &url)
        {
            tracing::warn!(marketplace = %listing.name, error = %e, "failed to cache stats");
        }

        Ok(stats)
    }

    /// Live stats if available, else the bundled snapshot, else nothing.
    pub async fn stats_or_snapshot(&self, listing: &CatalogListing) -> Option<RepoStats> {
        match self.fetch_stats(listing).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::debug!(
                    marketplace = %listing.name,
                    error = %e,
                    "live stats unavailable, using snapshot"
                );
                listing.static_stats.clone()
            }
        }
    }

    /// Stats for every listing, fetched concurrently. Never fails; entries
    /// without live or bundled stats are absent from the map.
    pub async fn fetch_all(&self, listing: &[CatalogListing]) -> HashMap<String, RepoStats> {
        let gate = Arc::new(Semaphore::new(self.ctx.max_concurrent()));
        let merged = Arc::new(Mutex::new(HashMap::new()));
        let mut tasks = JoinSet::new();

        for entry in listing.iter().cloned() {
            let fetcher = self.clone();
            let gate = gate.clone();
            let merged = merged.clone();
            tasks.spawn(async move {
                let Ok(_permit) = gate.acquire_owned().await else {
                    return;
                };
                if let Some(stats) = fetcher.stats_or_snapshot(&entry).await {
                    if let Ok(mut map) = merged.lock() {
                        map.insert(entry.name, stats);
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "stats task failed");
            }
        }

        let mut map = merged.lock().map(|mut m| std::mem::take(&mut *m)).unwrap_or_default();
        // Tasks that panicked never inserted; fall back for them too.
        for entry in listing {
            if !map.contains_key(&entry.name) {
                if let Some(snapshot) = &entry.static_stats {
                    map.insert(entry.name.clone(), snapshot.clone());
                }
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DiskCache;
    use crate::config::NetworkConfig;
    use crate::http::HttpClient;
    use tempfile::TempDir;

    fn create_test_fetcher() -> (StatsFetcher, TempDir) {
        let temp = TempDir::new().unwrap();
        let network = NetworkConfig {
            api_base_url: "http://127.0.0.1:9/".to_string(),
            ..NetworkConfig::default()
        };
        let ctx = ScoutContext::new(
            HttpClient::new().unwrap(),
            DiskCache::new(temp.path()),
            network,
        );
        (StatsFetcher::new(Arc::new(ctx)), temp)
    }

    #[test]
    fn test_parse_github_metadata() {
        let json = r#"{
            "full_name": "o/r",
            "stargazers_count": 42,
            "forks_count": 7,
            "pushed_at": "2025-06-01T12:00:00Z",
            "open_issues_count": 3
        }"#;
        let meta: RepoMetadata = serde_json::from_str(json).unwrap();
        let stats = RepoStats::from(meta);
        assert_eq!(stats.stars, 42);
        assert_eq!(stats.forks, 7);
        assert_eq!(stats.open_issues, 3);
        assert!(stats.last_pushed_at.is_some());
    }

    #[test]
    fn test_stats_url() {
        let (fetcher, _temp) = create_test_fetcher();
        assert_eq!(
            fetcher.stats_url("https://github.com/o/r.git").unwrap(),
            "http://127.0.0.1:9/repos/o/r"
        );
    }

    #[tokio::test]
    async fn test_cached_stats_skip_network() {
        let (fetcher, _temp) = create_test_fetcher();
        let stats = RepoStats {
            stars: 5,
            ..RepoStats::default()
        };
        fetcher
            .ctx
            .cache
            .save(CacheKind::Stats, "m", &stats, "test")
            .unwrap();

        let listing = CatalogListing::new("m", "https://github.com/o/r");
        assert_eq!(fetcher.fetch_stats(&listing).await.unwrap(), stats);
    }

    #[tokio::test]
    async fn test_unreachable_api_falls_back_to_snapshot() {
        let (fetcher, _temp) = create_test_fetcher();
        let snapshot = RepoStats {
            stars: 99,
            ..RepoStats::default()
        };

        let mut with_snapshot = CatalogListing::new("a", "https://github.com/o/a");
        with_snapshot.static_stats = Some(snapshot.clone());
        let without_snapshot = CatalogListing::new("b", "https://github.com/o/b");

        let all = fetcher.fetch_all(&[with_snapshot, without_snapshot]).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("a"), Some(&snapshot));
    }
}
