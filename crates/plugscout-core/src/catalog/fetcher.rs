//! Marketplace Fetcher
//!
//! Resolves one listing entry to its marketplace.json, cache-first.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheKind;
use crate::context::ScoutContext;
use crate::error::{Result, ScoutError};
use crate::source::{derive_source, parse_github_repo};

use super::types::{CatalogListing, CatalogManifest, DiscoveredMarketplace};

/// Path of the manifest inside a marketplace repository
pub const MARKETPLACE_FILE: &str = ".claude-plugin/marketplace.json";

/// Branch the manifest is read from
pub const MANIFEST_BRANCH: &str = "main";

/// Anything that can turn a listing entry into a discovered marketplace.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch(&self, listing: &CatalogListing) -> Result<DiscoveredMarketplace>;
}

/// Fetches marketplace manifests over HTTP with a disk cache in front
#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    ctx: Arc<ScoutContext>,
}

impl CatalogFetcher {
    pub fn new(ctx: Arc<ScoutContext>) -> Self {
        Self { ctx }
    }

    /// Raw-content URL of a repository's marketplace.json
    pub fn manifest_url(&self, repository_url: &str) -> Result<String> {
        let repo = parse_github_repo(repository_url)?;
        Ok(format!(
            "{}/{}/{}/{}/{}",
            self.ctx.network.raw_base_url.trim_end_matches('/'),
            repo.owner,
            repo.repo,
            MANIFEST_BRANCH,
            MARKETPLACE_FILE
        ))
    }

    /// Resolve one listing entry.
    ///
    /// A fresh cached manifest is returned without touching the network.
    /// Otherwise the manifest is fetched under the retry policy, renamed to
    /// the listing's stable name and cached. A failed cache write is logged
    /// and does not fail the fetch.
    pub async fn fetch(&self, listing: &CatalogListing) -> Result<DiscoveredMarketplace> {
        let source = derive_source(&listing.repository_url)?;

        if let Some(manifest) = self
            .ctx
            .cache
            .load::<CatalogManifest>(CacheKind::Manifest, &listing.name)?
        {
            return Ok(Self::discovered(listing, source, manifest));
        }

        let url = self.manifest_url(&listing.repository_url)?;
        let http = &self.ctx.http;
        let manifest_url = url.as_str();
        let body = self
            .ctx
            .retry
            .run(&listing.name, move |_| http.get_bytes(manifest_url))
            .await?;

        // Not retried: a malformed payload will not become valid.
        let mut manifest: CatalogManifest =
            serde_json::from_slice(&body).map_err(|source| ScoutError::Decode {
                what: format!("marketplace.json for '{}'", listing.name),
                source,
            })?;

        if manifest.name != listing.name {
            tracing::debug!(
                marketplace = %listing.name,
                reported = %manifest.name,
                "replacing self-reported marketplace name"
            );
        }
        manifest.name = listing.name.clone();

        if let Err(e) = self
            .ctx
            .cache
            .save(CacheKind::Manifest, &listing.name, &manifest, &url)
        {
            tracing::warn!(marketplace = %listing.name, error = %e, "failed to cache manifest");
        }

        tracing::debug!(
            marketplace = %listing.name,
            plugins = manifest.plugins.len(),
            "fetched marketplace"
        );
        Ok(Self::discovered(listing, source, manifest))
    }

    fn discovered(
        listing: &CatalogListing,
        source: String,
        manifest: CatalogManifest,
    ) -> DiscoveredMarketplace {
        DiscoveredMarketplace {
            manifest,
            repository_url: listing.repository_url.clone(),
            source,
        }
    }
}

#[async_trait]
impl ManifestSource for CatalogFetcher {
    async fn fetch(&self, listing: &CatalogListing) -> Result<DiscoveredMarketplace> {
        CatalogFetcher::fetch(self, listing).await
    }
}
