//! Plugin views over discovered marketplaces
//!
//! Flattening and search for list/search consumers.

use std::collections::HashMap;

use crate::error::{Result, ScoutError};

use super::types::{CatalogManifest, DiscoveredMarketplace, PluginEntry, ResolvedPlugin};

/// Parse marketplace.json from a string
pub fn parse_manifest_str(content: &str) -> Result<CatalogManifest> {
    serde_json::from_str(content).map_err(|source| ScoutError::Decode {
        what: "marketplace.json".to_string(),
        source,
    })
}

/// Every plugin of every marketplace, sorted by marketplace then name
pub fn flatten_plugins(discovered: &HashMap<String, DiscoveredMarketplace>) -> Vec<ResolvedPlugin> {
    let mut plugins: Vec<ResolvedPlugin> = discovered
        .iter()
        .flat_map(|(key, found)| {
            found
                .manifest
                .plugins
                .iter()
                .map(move |p| ResolvedPlugin::from_entry(p, key))
        })
        .collect();

    plugins.sort_by(|a, b| {
        a.marketplace
            .cmp(&b.marketplace)
            .then_with(|| a.name.cmp(&b.name))
    });
    plugins
}

/// Case-insensitive substring search across all marketplaces
pub fn search_plugins(
    discovered: &HashMap<String, DiscoveredMarketplace>,
    query: &str,
) -> Vec<ResolvedPlugin> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return flatten_plugins(discovered);
    }

    let mut matches: Vec<ResolvedPlugin> = discovered
        .iter()
        .flat_map(|(key, found)| {
            let query = query_lower.as_str();
            found
                .manifest
                .plugins
                .iter()
                .filter(move |p| matches_query(p, query))
                .map(move |p| ResolvedPlugin::from_entry(p, key))
        })
        .collect();

    matches.sort_by(|a, b| {
        a.marketplace
            .cmp(&b.marketplace)
            .then_with(|| a.name.cmp(&b.name))
    });
    matches
}

/// Look up a plugin by `name` or `name@marketplace`
pub fn get_plugin(
    discovered: &HashMap<String, DiscoveredMarketplace>,
    id: &str,
) -> Option<ResolvedPlugin> {
    match id.split_once('@') {
        Some((name, marketplace)) => discovered
            .get(marketplace)?
            .manifest
            .plugins
            .iter()
            .find(|p| p.name == name)
            .map(|p| ResolvedPlugin::from_entry(p, marketplace)),
        None => flatten_plugins(discovered)
            .into_iter()
            .find(|p| p.name == id),
    }
}

fn matches_query(plugin: &PluginEntry, query: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(query);

    hit(&plugin.name)
        || plugin.description.as_deref().is_some_and(hit)
        || plugin.category.as_deref().is_some_and(hit)
        || plugin.tags.iter().any(|t| hit(t))
        || plugin.keywords.iter().any(|k| hit(k))
}
