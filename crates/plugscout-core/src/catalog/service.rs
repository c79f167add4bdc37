//! Marketplace service
//!
//! The operations a browser front-end consumes, wired over one shared
//! [`ScoutContext`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::ScoutContext;
use crate::error::Result;

use super::discovery::{Discovery, DiscoveryReport};
use super::fetcher::{CatalogFetcher, ManifestSource};
use super::registry::{ListingOrigin, RegistryResolver};
use super::stats::StatsFetcher;
use super::types::{CatalogListing, DiscoveredMarketplace, RepoStats};

/// Result of a registry update check
#[derive(Debug, Clone)]
pub struct UpdateCheck {
    pub listing: Vec<CatalogListing>,
    pub new_count: usize,
}

pub struct MarketplaceService {
    ctx: Arc<ScoutContext>,
    registry: RegistryResolver,
    stats: StatsFetcher,
    discovery: Discovery,
}

impl MarketplaceService {
    pub fn new(ctx: Arc<ScoutContext>) -> Self {
        let source: Arc<dyn ManifestSource> = Arc::new(CatalogFetcher::new(ctx.clone()));
        Self::with_source(ctx, source)
    }

    /// Use a custom manifest source (tests, alternative transports)
    pub fn with_source(ctx: Arc<ScoutContext>, source: Arc<dyn ManifestSource>) -> Self {
        Self {
            registry: RegistryResolver::new(ctx.clone()),
            stats: StatsFetcher::new(ctx.clone()),
            discovery: Discovery::new(source, ctx.max_concurrent()),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<ScoutContext> {
        &self.ctx
    }

    pub async fn resolve_listing(&self) -> Vec<CatalogListing> {
        self.registry.resolve_listing().await
    }

    pub async fn resolve_with_origin(&self) -> (Vec<CatalogListing>, ListingOrigin) {
        self.registry.resolve_with_origin().await
    }

    pub async fn discover_all(
        &self,
        listing: &[CatalogListing],
    ) -> Result<HashMap<String, DiscoveredMarketplace>> {
        self.discovery.discover_all(listing).await
    }

    pub async fn discover_all_detailed(&self, listing: &[CatalogListing]) -> DiscoveryReport {
        self.discovery.discover_all_detailed(listing).await
    }

    /// Remove every cached manifest, stats entry and registry snapshot.
    pub fn clear_cache(&self) -> Result<usize> {
        let removed = self.ctx.cache.clear()?;
        tracing::info!(removed, "cache cleared");
        Ok(removed)
    }

    /// Clear the cache, then resolve and discover everything from scratch.
    pub async fn refresh_all(&self) -> Result<HashMap<String, DiscoveredMarketplace>> {
        self.clear_cache()?;
        let listing = self.resolve_listing().await;
        self.discover_all(&listing).await
    }

    /// [`refresh_all`](Self::refresh_all) keeping per-entry failures
    pub async fn refresh_all_detailed(&self) -> Result<DiscoveryReport> {
        self.clear_cache()?;
        let listing = self.resolve_listing().await;
        Ok(self.discover_all_detailed(&listing).await)
    }

    pub async fn stats(&self, listing: &[CatalogListing]) -> HashMap<String, RepoStats> {
        self.stats.fetch_all(listing).await
    }

    /// Fetch the latest registry and count marketplaces not seen before.
    pub async fn check_for_updates(&self, prior: &[CatalogListing]) -> UpdateCheck {
        let (listing, new_count) = self.registry.resolve_with_new_count(prior).await;
        UpdateCheck { listing, new_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKind, DiskCache};
    use crate::catalog::builtin::builtin_listing;
    use crate::config::NetworkConfig;
    use crate::http::HttpClient;
    use crate::retry::RetryPolicy;
    use tempfile::TempDir;

    fn create_offline_service() -> (MarketplaceService, TempDir) {
        let temp = TempDir::new().unwrap();
        let network = NetworkConfig {
            registry_url: "http://127.0.0.1:9/registry.json".to_string(),
            raw_base_url: "http://127.0.0.1:9".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..NetworkConfig::default()
        };
        let ctx = ScoutContext::new(
            HttpClient::new().unwrap(),
            DiskCache::new(temp.path()),
            network,
        )
        .with_retry(RetryPolicy::single_attempt());
        (MarketplaceService::new(Arc::new(ctx)), temp)
    }

    #[test]
    fn test_clear_cache_counts_files() {
        let (service, _temp) = create_offline_service();
        let cache = &service.context().cache;
        cache.save(CacheKind::Manifest, "a", &1, "t").unwrap();
        cache.save(CacheKind::Stats, "a", &2, "t").unwrap();

        assert_eq!(service.clear_cache().unwrap(), 2);
        assert_eq!(service.clear_cache().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_discovery_fails_in_aggregate() {
        let (service, _temp) = create_offline_service();
        let listing = service.resolve_listing().await;
        assert_eq!(listing, builtin_listing());

        let report = service.discover_all_detailed(&listing).await;
        assert!(report.is_total_failure());
        assert_eq!(report.failures.len(), listing.len());
        assert!(service.refresh_all().await.is_err());
    }

    #[tokio::test]
    async fn test_offline_stats_use_snapshots() {
        let (service, _temp) = create_offline_service();
        let listing = builtin_listing();
        let stats = service.stats(&listing).await;
        assert_eq!(stats.len(), listing.len());
    }
}
