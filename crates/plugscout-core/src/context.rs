//! Shared collaborators for every fetcher
//!
//! Built once per process from [`Config`] and passed around by `Arc`.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::DiskCache;
use crate::config::{Config, NetworkConfig, GITHUB_TOKEN_ENV};
use crate::error::Result;
use crate::http::HttpClient;
use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY};

#[derive(Debug, Clone)]
pub struct ScoutContext {
    pub http: HttpClient,
    pub cache: DiskCache,
    pub retry: RetryPolicy,
    pub network: NetworkConfig,
    /// Bearer token for the statistics endpoint
    pub github_token: Option<String>,
}

impl ScoutContext {
    /// Resolve the cache root and build the HTTP client from `config`.
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let cache = DiskCache::new(config.resolve_cache_dir()?);
        let http = HttpClient::with_timeout(config.network.timeout())?;
        let retry = RetryPolicy::new(config.network.max_attempts, DEFAULT_BASE_DELAY);
        let github_token = std::env::var(GITHUB_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty());

        tracing::debug!(cache_root = %cache.root().display(), "context ready");

        Ok(Arc::new(Self {
            http,
            cache,
            retry,
            network: config.network.clone(),
            github_token,
        }))
    }

    /// Assemble a context from explicit parts (tests, embedding)
    pub fn new(http: HttpClient, cache: DiskCache, network: NetworkConfig) -> Self {
        Self {
            http,
            cache,
            retry: RetryPolicy::new(network.max_attempts, DEFAULT_BASE_DELAY),
            network,
            github_token: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_backoff(self, base_delay: Duration) -> Self {
        let attempts = self.network.max_attempts;
        self.with_retry(RetryPolicy::new(attempts, base_delay))
    }

    pub fn max_concurrent(&self) -> usize {
        self.network.max_concurrent.max(1)
    }
}
