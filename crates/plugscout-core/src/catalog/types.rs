//! Claude Code plugin marketplace type definitions
//!
//! Types for marketplace.json manifests, listing entries, repository stats
//! and the discovery results built from them.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Claude Code plugin marketplace (parsed from marketplace.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Marketplace name. Replaced by the listing's stable name after a fetch.
    pub name: String,
    /// Owner information
    #[serde(default)]
    pub owner: CatalogOwner,
    /// Optional metadata
    #[serde(default)]
    pub metadata: CatalogMetadata,
    /// Available plugins
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
}

/// Marketplace owner information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogOwner {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Optional marketplace metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Base directory for relative plugin paths
    #[serde(
        default,
        rename = "pluginRoot",
        skip_serializing_if = "Option::is_none"
    )]
    pub plugin_root: Option<String>,
}

/// Plugin entry in marketplace.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    /// Plugin name (unique within its marketplace)
    pub name: String,
    /// Where the plugin lives
    pub source: PluginSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<PluginAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Raw `lspServers` block; only its presence matters here
    #[serde(
        default,
        rename = "lspServers",
        skip_serializing_if = "Option::is_none"
    )]
    pub lsp_servers: Option<serde_json::Value>,
}

impl PluginEntry {
    /// Whether the plugin ships language servers
    pub fn has_lsp_servers(&self) -> bool {
        self.lsp_servers.as_ref().is_some_and(|v| !v.is_null())
    }
}

/// Plugin author information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Resolved plugin location.
///
/// On the wire `source` is either a path string or an object such as
/// `{"source": "url", "url": "https://..."}`. Both collapse to a plain
/// location string at parse time; `external` records which form it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSource {
    pub location: String,
    pub external: bool,
}

impl PluginSource {
    pub fn path(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            external: false,
        }
    }

    pub fn external(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            external: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.location
    }
}

impl std::fmt::Display for PluginSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.location)
    }
}

/// Wire shapes of `source`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireSource {
    PlainPath(String),
    ExternalGit(ExternalGitSource),
}

#[derive(Serialize, Deserialize)]
struct ExternalGitSource {
    /// Source type: "url", "github", "git"
    #[serde(default)]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repo: Option<String>,
}

impl<'de> Deserialize<'de> for PluginSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireSource::deserialize(deserializer)? {
            WireSource::PlainPath(path) => Ok(Self::path(path)),
            WireSource::ExternalGit(ext) => {
                if let Some(url) = ext.url.filter(|u| !u.is_empty()) {
                    return Ok(Self::external(url));
                }
                match ext.repo.filter(|r| !r.is_empty()) {
                    Some(repo) => Ok(Self::external(format!("https://github.com/{repo}"))),
                    None => Err(D::Error::custom(
                        "plugin source object needs a `url` or `repo` field",
                    )),
                }
            }
        }
    }
}

impl Serialize for PluginSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = if self.external {
            WireSource::ExternalGit(ExternalGitSource {
                source: Some("url".to_string()),
                url: Some(self.location.clone()),
                repo: None,
            })
        } else {
            WireSource::PlainPath(self.location.clone())
        };
        wire.serialize(serializer)
    }
}

/// Point-in-time popularity snapshot of a repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStats {
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default)]
    pub last_pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub open_issues: u64,
}

/// One row of the curated or registry-provided marketplace table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListing {
    /// Stable key: cache file name and map key
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(alias = "repositoryURL", alias = "repo", alias = "url")]
    pub repository_url: String,
    #[serde(default)]
    pub description: String,
    /// Bundled stats used when live stats are unavailable
    #[serde(default, alias = "stats", skip_serializing_if = "Option::is_none")]
    pub static_stats: Option<RepoStats>,
}

impl CatalogListing {
    pub fn new(name: impl Into<String>, repository_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            repository_url: repository_url.into(),
            description: String::new(),
            static_stats: None,
        }
    }

    /// Display name, falling back to the stable name
    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// Remote registry document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Kept raw so one malformed entry cannot sink the whole document
    #[serde(default)]
    pub marketplaces: Vec<serde_json::Value>,
}

impl RegistryDocument {
    /// Decode each marketplace entry, dropping the ones that don't parse.
    pub fn into_listings(self) -> Vec<CatalogListing> {
        self.marketplaces
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value(raw) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    tracing::warn!(index, error = %e, "dropping undecodable registry entry");
                    None
                }
            })
            .collect()
    }
}

/// A marketplace resolved from its listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredMarketplace {
    pub manifest: CatalogManifest,
    pub repository_url: String,
    /// `owner/repo` on github.com, otherwise the full URL
    pub source: String,
}

/// Plugin with its marketplace context, for list/search consumers
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlugin {
    pub name: String,
    pub marketplace: String,
    /// Full identifier (name@marketplace)
    pub full_id: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<PluginAuthor>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub source: PluginSource,
    pub has_lsp_servers: bool,
}

impl ResolvedPlugin {
    /// Create from plugin entry and marketplace name
    pub fn from_entry(entry: &PluginEntry, marketplace: &str) -> Self {
        Self {
            name: entry.name.clone(),
            marketplace: marketplace.to_string(),
            full_id: format!("{}@{}", entry.name, marketplace),
            version: entry.version.clone(),
            description: entry.description.clone(),
            author: entry.author.clone(),
            category: entry.category.clone(),
            tags: entry.tags.clone(),
            keywords: entry.keywords.clone(),
            source: entry.source.clone(),
            has_lsp_servers: entry.has_lsp_servers(),
        }
    }
}
