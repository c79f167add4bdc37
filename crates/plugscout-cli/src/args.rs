use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "plugscout")]
#[command(about = "Discover Claude Code plugin marketplaces and their plugins")]
#[command(version)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Base directory (default: ~/.plugscout)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every known marketplace and summarize it
    Discover,

    /// List plugins across all marketplaces, optionally filtered
    Plugins {
        /// Search query (matches name, description, category, tags, keywords)
        query: Option<String>,

        /// Maximum results to show (0 = all)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Show the marketplace listing and where it came from
    Registry,

    /// Check the remote registry for newly listed marketplaces
    CheckUpdates,

    /// Show repository statistics for every marketplace
    Stats,

    /// Manage the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Clear the cache and rediscover everything
    Refresh,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove every cached manifest, stats entry and registry snapshot
    Clear,

    /// Show the cache directory
    Path,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., network.max_concurrent)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., network.max_concurrent)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
