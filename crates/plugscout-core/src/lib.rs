pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod retry;
pub mod source;

pub use cache::{
    validate_listing_name, validate_name, CacheEntry, CacheKind, DiskCache, REGISTRY_CACHE_NAME,
};
pub use catalog::{
    builtin_listing, flatten_plugins, get_plugin, search_plugins, CatalogFetcher, CatalogListing,
    CatalogManifest, DiscoveredMarketplace, Discovery, DiscoveryReport, FetchFailure,
    ListingOrigin, ManifestSource, MarketplaceService, PluginEntry, PluginSource,
    RegistryResolver, RepoStats, ResolvedPlugin, StatsFetcher, UpdateCheck,
};
pub use config::{Config, NetworkConfig};
pub use context::ScoutContext;
pub use error::{Result, ScoutError};
pub use http::HttpClient;
pub use retry::RetryPolicy;
pub use source::{derive_source, parse_github_repo, RepoRef};
