//! Builtin Marketplace Definitions
//!
//! The compiled-in marketplace table, used whenever the remote registry is
//! unavailable.

use super::types::{CatalogListing, RepoStats};

/// Builtin marketplace table
pub const BUILTIN_MARKETPLACES: &[BuiltinMarketplace] = &[
    BuiltinMarketplace {
        name: "claude-plugins-official",
        display_name: "Claude Plugins (Official)",
        repository_url: "https://github.com/anthropics/claude-plugins-official",
        description: "Official directory of Claude Code plugins maintained by Anthropic.",
        stars: 2100,
        forks: 180,
        open_issues: 40,
    },
    BuiltinMarketplace {
        name: "claude-code-plugins",
        display_name: "Claude Code Bundled Plugins",
        repository_url: "https://github.com/anthropics/claude-code",
        description: "Example plugins shipped in the Claude Code repository.",
        stars: 38000,
        forks: 2500,
        open_issues: 3000,
    },
    BuiltinMarketplace {
        name: "anthropic-agent-skills",
        display_name: "Anthropic Agent Skills",
        repository_url: "https://github.com/anthropics/skills",
        description: "Agent skills for documents, design and development workflows.",
        stars: 17000,
        forks: 1600,
        open_issues: 90,
    },
    BuiltinMarketplace {
        name: "claude-code-workflows",
        display_name: "Claude Code Workflows",
        repository_url: "https://github.com/wshobson/agents",
        description: "Subagents, commands and workflows for software teams.",
        stars: 19000,
        forks: 2100,
        open_issues: 20,
    },
    BuiltinMarketplace {
        name: "superpowers-marketplace",
        display_name: "Superpowers",
        repository_url: "https://github.com/obra/superpowers-marketplace",
        description: "Core skills library: TDD, debugging and collaboration patterns.",
        stars: 500,
        forks: 40,
        open_issues: 5,
    },
];

/// Static marketplace definition
#[derive(Debug, Clone)]
pub struct BuiltinMarketplace {
    /// Stable key
    pub name: &'static str,
    pub display_name: &'static str,
    pub repository_url: &'static str,
    pub description: &'static str,
    /// Bundled stats snapshot
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
}

impl BuiltinMarketplace {
    pub fn to_listing(&self) -> CatalogListing {
        CatalogListing {
            name: self.name.to_string(),
            display_name: self.display_name.to_string(),
            repository_url: self.repository_url.to_string(),
            description: self.description.to_string(),
            static_stats: Some(RepoStats {
                stars: self.stars,
                forks: self.forks,
                last_pushed_at: None,
                open_issues: self.open_issues,
            }),
        }
    }
}

/// The builtin table as listing entries
pub fn builtin_listing() -> Vec<CatalogListing> {
    BUILTIN_MARKETPLACES.iter().map(|m| m.to_listing()).collect()
}
