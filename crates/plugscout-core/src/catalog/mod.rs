//! Plugin marketplace discovery
//!
//! # Concepts
//!
//! - **Listing**: the table of known marketplaces (remote registry or builtin)
//! - **Marketplace**: a repository publishing `.claude-plugin/marketplace.json`
//! - **Stable name**: the listing key used for cache files and map lookups
//!
//! # Flow
//!
//! ```text
//! RegistryResolver ──> [CatalogListing]
//!        │                   │
//!        │             Discovery (≤ max_concurrent in flight)
//!        │                   │
//!        │             CatalogFetcher ──> DiskCache / HttpClient + RetryPolicy
//!        │                   │
//!        └──────────> {name: DiscoveredMarketplace} ──> flatten / search
//!
//! Cache root (~/.cache/plugscout/)
//! ├── _registry.json            # registry snapshot (6h)
//! ├── <name>.json               # manifest (24h)
//! └── <name>_stats.json         # repository stats (24h)
//! ```

mod builtin;
mod discovery;
mod fetcher;
mod marketplace;
mod registry;
mod service;
mod stats;
mod types;

pub use builtin::{builtin_listing, BuiltinMarketplace, BUILTIN_MARKETPLACES};
pub use discovery::{Discovery, DiscoveryReport, FetchFailure};
pub use fetcher::{CatalogFetcher, ManifestSource, MANIFEST_BRANCH, MARKETPLACE_FILE};
pub use marketplace::{flatten_plugins, get_plugin, parse_manifest_str, search_plugins};
pub use registry::{ListingOrigin, RegistryResolver};
pub use service::{MarketplaceService, UpdateCheck};
pub use stats::StatsFetcher;
pub use types::{
    CatalogListing, CatalogManifest, CatalogMetadata, CatalogOwner, DiscoveredMarketplace,
    PluginAuthor, PluginEntry, PluginSource, RegistryDocument, RepoStats, ResolvedPlugin,
};
