//! Disk cache for marketplace manifests, repository stats and the registry
//!
//! One JSON file per entity under the cache root:
//!
//! ```text
//! <cache root>/                 (0700)
//! ├── <name>.json               manifest, 24h
//! ├── <name>_stats.json         repository stats, 24h
//! └── _registry.json            registry snapshot, 6h
//! ```
//!
//! Writes go to a temp file in the same directory and are renamed into
//! place, so a concurrent reader sees either the old entry or the new one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Maximum length of a cache name
pub const MAX_NAME_LEN: usize = 100;

/// Fixed file stem of the registry snapshot
pub const REGISTRY_CACHE_NAME: &str = "_registry";

/// File stem suffix of stats entries
const STATS_SUFFIX: &str = "_stats";

const MANIFEST_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const STATS_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const REGISTRY_TTL: Duration = Duration::from_secs(6 * 60 * 60);

const TEMP_PREFIX: &str = ".plugscout-";
const TEMP_SUFFIX: &str = ".tmp";

/// What a cache file holds; decides file naming and TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Manifest,
    Stats,
    Registry,
}

impl CacheKind {
    pub fn default_ttl(self) -> Duration {
        match self {
            Self::Manifest => MANIFEST_TTL,
            Self::Stats => STATS_TTL,
            Self::Registry => REGISTRY_TTL,
        }
    }

    fn file_name(self, name: &str) -> String {
        match self {
            Self::Manifest => format!("{name}.json"),
            Self::Stats => format!("{name}{STATS_SUFFIX}.json"),
            Self::Registry => format!("{REGISTRY_CACHE_NAME}.json"),
        }
    }
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manifest => write!(f, "manifest"),
            Self::Stats => write!(f, "stats"),
            Self::Registry => write!(f, "registry"),
        }
    }
}

/// A cached payload with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub fetched_at: DateTime<Utc>,
    /// Where the payload came from (usually the URL it was fetched from)
    pub origin: String,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T, origin: impl Into<String>) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
            origin: origin.into(),
        }
    }

    /// Age relative to now; a timestamp in the future counts as zero.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.fetched_at).to_std().unwrap_or_default()
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() <= ttl
    }
}

/// Validate a cache name.
///
/// This is the path-traversal boundary: a valid name can only ever address
/// a file directly inside the cache root.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = |reason| {
        Err(ScoutError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.contains("..") {
        return invalid("must not contain '..'");
    }
    if name.contains('/') || name.contains('\\') || name.contains(std::path::MAIN_SEPARATOR) {
        return invalid("must not contain path separators");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return invalid("must be at most 100 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return invalid("only letters, digits, '-', '_' and '.' are allowed");
    }

    Ok(())
}

/// Validate the name of a marketplace used as a manifest or stats key.
///
/// On top of [`validate_name`], rejects names whose file would land on
/// another kind's file: the registry snapshot stem and anything ending in
/// the stats suffix.
pub fn validate_listing_name(name: &str) -> Result<()> {
    validate_name(name)?;

    let reason = if name == REGISTRY_CACHE_NAME {
        "is reserved for the registry snapshot"
    } else if name.ends_with(STATS_SUFFIX) {
        "must not end in '_stats'"
    } else {
        return Ok(());
    };
    Err(ScoutError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// TTL-gated, atomically written JSON store
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    manifest_ttl: Duration,
    stats_ttl: Duration,
    registry_ttl: Duration,
}

impl DiskCache {
    /// Create a cache rooted at `root`. Nothing is touched on disk until
    /// the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest_ttl: MANIFEST_TTL,
            stats_ttl: STATS_TTL,
            registry_ttl: REGISTRY_TTL,
        }
    }

    /// Override the TTL for one kind of entry
    pub fn with_ttl(mut self, kind: CacheKind, ttl: Duration) -> Self {
        match kind {
            CacheKind::Manifest => self.manifest_ttl = ttl,
            CacheKind::Stats => self.stats_ttl = ttl,
            CacheKind::Registry => self.registry_ttl = ttl,
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::Manifest => self.manifest_ttl,
            CacheKind::Stats => self.stats_ttl,
            CacheKind::Registry => self.registry_ttl,
        }
    }

    /// Path of the file backing `name`
    pub fn path_for(&self, kind: CacheKind, name: &str) -> Result<PathBuf> {
        match kind {
            CacheKind::Manifest | CacheKind::Stats => validate_listing_name(name)?,
            CacheKind::Registry => validate_name(name)?,
        }
        Ok(self.root.join(kind.file_name(name)))
    }

    /// Load a fresh payload.
    ///
    /// Missing or expired entries are `Ok(None)`. A fresh entry that does
    /// not decode is an error.
    pub fn load<T: DeserializeOwned>(&self, kind: CacheKind, name: &str) -> Result<Option<T>> {
        Ok(self.load_entry(kind, name)?.map(|e| e.payload))
    }

    /// Like [`load`](Self::load) but keeps the entry metadata.
    pub fn load_entry<T: DeserializeOwned>(
        &self,
        kind: CacheKind,
        name: &str,
    ) -> Result<Option<CacheEntry<T>>> {
        let Some(entry) = self.peek_entry::<T>(kind, name)? else {
            tracing::debug!(kind = %kind, name, "cache miss");
            return Ok(None);
        };

        let ttl = self.ttl(kind);
        if !entry.is_fresh(ttl) {
            tracing::debug!(
                kind = %kind,
                name,
                age_secs = entry.age().as_secs(),
                "cache expired"
            );
            return Ok(None);
        }

        tracing::debug!(kind = %kind, name, age_secs = entry.age().as_secs(), "cache hit");
        Ok(Some(entry))
    }

    /// Load an entry regardless of its age.
    pub fn peek_entry<T: DeserializeOwned>(
        &self,
        kind: CacheKind,
        name: &str,
    ) -> Result<Option<CacheEntry<T>>> {
        let path = self.path_for(kind, name)?;

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry<T> = serde_json::from_slice(&content)
            .map_err(|source| ScoutError::CacheCorrupt { path, source })?;

        Ok(Some(entry))
    }

    /// Persist `payload` under `name`, replacing any previous entry.
    pub fn save<T: Serialize>(
        &self,
        kind: CacheKind,
        name: &str,
        payload: &T,
        origin: &str,
    ) -> Result<()> {
        let entry = CacheEntry::new(payload, origin);
        self.save_entry(kind, name, &entry)
    }

    /// Persist a prepared entry (keeps its `fetched_at`).
    pub fn save_entry<T: Serialize>(
        &self,
        kind: CacheKind,
        name: &str,
        entry: &CacheEntry<T>,
    ) -> Result<()> {
        let path = self.path_for(kind, name)?;
        self.ensure_root()?;

        let content = serde_json::to_vec_pretty(entry).map_err(|source| ScoutError::Encode {
            what: format!("{kind} cache entry '{name}'"),
            source,
        })?;

        // Dropping the temp file on any early return removes it.
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.root)?;
        temp.write_all(&content)?;
        temp.as_file().sync_all()?;
        set_owner_only(temp.path(), 0o600)?;

        temp.persist(&path).map_err(|e| ScoutError::Io(e.error))?;

        tracing::debug!(kind = %kind, name, path = %path.display(), "cache saved");
        Ok(())
    }

    /// Remove every cache file. Returns the number of files removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let is_entry = file_name.ends_with(".json");
            let is_stale_temp =
                file_name.starts_with(TEMP_PREFIX) && file_name.ends_with(TEMP_SUFFIX);

            if is_entry || is_stale_temp {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        tracing::debug!(root = %self.root.display(), removed, "cache cleared");
        Ok(removed)
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        set_owner_only(&self.root, 0o700)
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
