//! Registry Resolver
//!
//! Resolves the table of known marketplaces: cached registry snapshot,
//! then the remote registry document, then the builtin table. Resolution
//! itself never fails.

use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{validate_listing_name, CacheKind, REGISTRY_CACHE_NAME};
use crate::context::ScoutContext;
use crate::error::{Result, ScoutError};

use super::builtin::builtin_listing;
use super::types::{CatalogListing, RegistryDocument};

/// Where a resolved listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOrigin {
    Cache,
    Remote,
    Builtin,
}

impl std::fmt::Display for ListingOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingOrigin::Cache => write!(f, "cache"),
            ListingOrigin::Remote => write!(f, "remote"),
            ListingOrigin::Builtin => write!(f, "builtin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryResolver {
    ctx: Arc<ScoutContext>,
}

impl RegistryResolver {
    pub fn new(ctx: Arc<ScoutContext>) -> Self {
        Self { ctx }
    }

    /// Current listing: fresh cached registry, else remote, else builtin.
    pub async fn resolve_listing(&self) -> Vec<CatalogListing> {
        self.resolve_with_origin().await.0
    }

    /// [`resolve_listing`](Self::resolve_listing) plus where it came from
    pub async fn resolve_with_origin(&self) -> (Vec<CatalogListing>, ListingOrigin) {
        match self
            .ctx
            .cache
            .load::<Vec<CatalogListing>>(CacheKind::Registry, REGISTRY_CACHE_NAME)
        {
            Ok(Some(listing)) if !listing.is_empty() => return (listing, ListingOrigin::Cache),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable registry cache");
            }
        }

        match self.fetch_remote().await {
            Ok(listing) => (listing, ListingOrigin::Remote),
            Err(e) => {
                tracing::warn!(error = %e, "registry unavailable, using builtin marketplaces");
                (builtin_listing(), ListingOrigin::Builtin)
            }
        }
    }

    /// Fetch the latest registry and count entries not seen before.
    ///
    /// The baseline is the last cached registry regardless of age, or
    /// `prior` when nothing was ever cached. On failure the current listing
    /// is returned with a count of zero.
    pub async fn resolve_with_new_count(
        &self,
        prior: &[CatalogListing],
    ) -> (Vec<CatalogListing>, usize) {
        let baseline: HashSet<String> = match self
            .ctx
            .cache
            .peek_entry::<Vec<CatalogListing>>(CacheKind::Registry, REGISTRY_CACHE_NAME)
        {
            Ok(Some(entry)) => entry.payload.into_iter().map(|l| l.name).collect(),
            Ok(None) => prior.iter().map(|l| l.name.clone()).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable registry cache");
                prior.iter().map(|l| l.name.clone()).collect()
            }
        };

        match self.fetch_remote().await {
            Ok(listing) => {
                let new_count = listing
                    .iter()
                    .filter(|l| !baseline.contains(&l.name))
                    .count();
                tracing::debug!(total = listing.len(), new_count, "registry checked");
                (listing, new_count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "registry update check failed");
                (self.resolve_listing().await, 0)
            }
        }
    }

    /// Fetch, sanitize and cache the remote registry.
    async fn fetch_remote(&self) -> Result<Vec<CatalogListing>> {
        let url = self.ctx.network.registry_url.as_str();
        let http = &self.ctx.http;
        let body = self
            .ctx
            .retry
            .run(REGISTRY_CACHE_NAME, move |_| http.get_bytes(url))
            .await?;

        let document: RegistryDocument =
            serde_json::from_slice(&body).map_err(|source| ScoutError::Decode {
                what: "registry document".to_string(),
                source,
            })?;

        let listing = sanitize(document.into_listings());
        if listing.is_empty() {
            return Err(ScoutError::EmptyRegistry {
                url: url.to_string(),
            });
        }

        if let Err(e) =
            self.ctx
                .cache
                .save(CacheKind::Registry, REGISTRY_CACHE_NAME, &listing, url)
        {
            tracing::warn!(error = %e, "failed to cache registry");
        }

        tracing::debug!(url, marketplaces = listing.len(), "fetched registry");
        Ok(listing)
    }
}

/// Drop entries with unusable or duplicate stable names.
fn sanitize(entries: Vec<CatalogListing>) -> Vec<CatalogListing> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            if let Err(e) = validate_listing_name(&entry.name) {
                tracing::warn!(marketplace = %entry.name, error = %e, "dropping registry entry");
                return false;
            }
            if !seen.insert(entry.name.clone()) {
                tracing::warn!(marketplace = %entry.name, "dropping duplicate registry entry");
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DiskCache;
    use crate::config::NetworkConfig;
    use crate::http::HttpClient;
    use crate::retry::RetryPolicy;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_resolver() -> (RegistryResolver, TempDir) {
        let temp = TempDir::new().unwrap();
        let network = NetworkConfig {
            registry_url: "http://127.0.0.1:9/registry.json".to_string(),
            ..NetworkConfig::default()
        };
        let ctx = ScoutContext::new(
            HttpClient::new().unwrap(),
            DiskCache::new(temp.path()),
            network,
        )
        .with_retry(RetryPolicy::single_attempt());
        (RegistryResolver::new(Arc::new(ctx)), temp)
    }

    #[test]
    fn test_sanitize_drops_invalid_and_duplicate() {
        let entries = vec![
            CatalogListing::new("good", "https://github.com/o/a"),
            CatalogListing::new("../bad", "https://github.com/o/b"),
            CatalogListing::new("good", "https://github.com/o/c"),
            CatalogListing::new("", "https://github.com/o/d"),
            CatalogListing::new("_registry", "https://github.com/o/e"),
            CatalogListing::new("good_stats", "https://github.com/o/f"),
        ];
        let kept = sanitize(entries);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].repository_url, "https://github.com/o/a");
    }

    #[tokio::test]
    async fn test_unreachable_registry_falls_back_to_builtin() {
        let (resolver, _temp) = create_test_resolver();
        let (listing, origin) = resolver.resolve_with_origin().await;
        assert_eq!(origin, ListingOrigin::Builtin);
        assert_eq!(listing, builtin_listing());
    }

    #[tokio::test]
    async fn test_fresh_cache_is_used() {
        let (resolver, _temp) = create_test_resolver();
        let cached = vec![CatalogListing::new("cached", "https://github.com/o/r")];
        resolver
            .ctx
            .cache
            .save(CacheKind::Registry, REGISTRY_CACHE_NAME, &cached, "test")
            .unwrap();

        let (listing, origin) = resolver.resolve_with_origin().await;
        assert_eq!(origin, ListingOrigin::Cache);
        assert_eq!(listing, cached);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_a_miss() {
        let (resolver, temp) = create_test_resolver();
        fs::write(temp.path().join("_registry.json"), "{ not json").unwrap();

        let listing = resolver.resolve_listing().await;
        assert_eq!(listing, builtin_listing());
    }

    #[tokio::test]
    async fn test_new_count_is_zero_when_offline() {
        let (resolver, _temp) = create_test_resolver();
        let (listing, new_count) = resolver.resolve_with_new_count(&[]).await;
        assert_eq!(new_count, 0);
        assert!(!listing.is_empty());
    }
}
