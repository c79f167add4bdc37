use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the cache root
pub const CACHE_DIR_ENV: &str = "PLUGSCOUT_CACHE_DIR";

/// Environment variable with a GitHub token for the statistics API
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/plugscout/registry/main/v1/marketplaces.json";
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT: usize = 5;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# plugscout configuration file
# Location: ~/.plugscout/config.toml

[cache]
# Cache directory for marketplace manifests, stats and the registry snapshot.
# PLUGSCOUT_CACHE_DIR takes precedence over this value.
# Default: <user cache dir>/plugscout
# dir = "/tmp/plugscout-cache"

[network]
# Per-request timeout in seconds
timeout_secs = 30

# Maximum simultaneous marketplace fetches
max_concurrent = 5

# Total attempts per fetch (including the first)
max_attempts = 3

# Remote registry of known marketplaces
registry_url = "https://raw.githubusercontent.com/plugscout/registry/main/v1/marketplaces.json"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Cache-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache root override
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Network-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Raw-content host serving marketplace.json files
    #[serde(default = "default_raw_base_url")]
    pub raw_base_url: String,

    /// REST endpoint serving repository metadata
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_raw_base_url() -> String {
    DEFAULT_RAW_BASE_URL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            max_attempts: default_max_attempts(),
            registry_url: default_registry_url(),
            raw_base_url: default_raw_base_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| ScoutError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| ScoutError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Resolve the cache root.
    ///
    /// Precedence: `PLUGSCOUT_CACHE_DIR`, `cache.dir`, the platform user
    /// cache directory, `~/.cache`.
    pub fn resolve_cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        if let Some(dir) = &self.cache.dir {
            return Ok(dir.clone());
        }

        if let Some(dir) = dirs::cache_dir() {
            return Ok(dir.join("plugscout"));
        }

        let home = dirs::home_dir().ok_or(ScoutError::HomeNotFound)?;
        Ok(home.join(".cache").join("plugscout"))
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "cache.dir" => Some(
                self.cache
                    .dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            ),
            "network.timeout_secs" => Some(self.network.timeout_secs.to_string()),
            "network.max_concurrent" => Some(self.network.max_concurrent.to_string()),
            "network.max_attempts" => Some(self.network.max_attempts.to_string()),
            "network.registry_url" => Some(self.network.registry_url.clone()),
            "network.raw_base_url" => Some(self.network.raw_base_url.clone()),
            "network.api_base_url" => Some(self.network.api_base_url.clone()),
            _ => None,
        }
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "cache.dir" => {
                self.cache.dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "network.timeout_secs" => self.network.timeout_secs = parse_number(key, value)?,
            "network.max_concurrent" => {
                self.network.max_concurrent = parse_number::<usize>(key, value)?.max(1)
            }
            "network.max_attempts" => {
                self.network.max_attempts = parse_number::<u32>(key, value)?.max(1)
            }
            "network.registry_url" => self.network.registry_url = value.to_string(),
            "network.raw_base_url" => self.network.raw_base_url = value.to_string(),
            "network.api_base_url" => self.network.api_base_url = value.to_string(),
            _ => {
                return Err(ScoutError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        CONFIG_KEYS
            .iter()
            .map(|k| (k.to_string(), self.get(k).unwrap_or_default()))
            .collect()
    }
}

const CONFIG_KEYS: &[&str] = &[
    "cache.dir",
    "network.timeout_secs",
    "network.max_concurrent",
    "network.max_attempts",
    "network.registry_url",
    "network.raw_base_url",
    "network.api_base_url",
];

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| ScoutError::ConfigParse {
        path: PathBuf::from(CONFIG_FILE),
        message: format!("{key} expects a number, got '{value}'"),
    })
}
