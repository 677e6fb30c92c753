//! Cache module for page revalidation
//!
//! Generated pages are reused until their revalidation window expires or
//! the backing document is republished. The cache remembers, per page,
//! when it was generated and which `last_publication_date` it reflected.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Cache directory, relative to the site base directory
pub const CACHE_DIR: &str = ".spacetraveling-cache";

/// Cache file name
const CACHE_FILE: &str = ".spacetraveling-cache/db.json";

/// Represents a cached entry for a generated page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Publication timestamp of the document the page was built from
    pub last_publication_date: Option<String>,
    /// Generation time (as unix timestamp)
    pub generated_at: u64,
    /// Output path relative to public dir
    pub output_path: String,
}

/// Cache database of generated pages
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Hash of the site config (changes invalidate every page)
    pub config_hash: u64,
    /// Entries keyed by page key (`index` or the article uid)
    pub pages: HashMap<String, CacheEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            if let Ok(cache) = serde_json::from_str::<CacheDb>(&content) {
                if cache.version == Self::VERSION {
                    return cache;
                }
                tracing::info!("Cache version mismatch, rebuilding cache");
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        fs::create_dir_all(base_dir.join(CACHE_DIR))?;

        let cache_path = base_dir.join(CACHE_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_path, content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Expire every entry if the configuration changed since the last run
    ///
    /// Entries are kept so that pages written earlier can still be pruned.
    pub fn check_config(&mut self, config_hash: u64) {
        if self.config_hash != config_hash {
            if !self.pages.is_empty() {
                tracing::info!("Configuration changed, revalidating all pages");
            }
            self.expire_all();
            self.config_hash = config_hash;
        }
    }

    /// Mark every page stale without forgetting it
    pub fn expire_all(&mut self) {
        for entry in self.pages.values_mut() {
            entry.generated_at = 0;
        }
    }

    /// Whether a page can be kept as is
    ///
    /// A page is fresh when it was generated less than `revalidate`
    /// seconds ago from the same document version.
    pub fn is_fresh(
        &self,
        key: &str,
        last_publication_date: Option<&str>,
        now: u64,
        revalidate: u64,
    ) -> bool {
        self.pages.get(key).is_some_and(|entry| {
            entry.last_publication_date.as_deref() == last_publication_date
                && now.saturating_sub(entry.generated_at) < revalidate
        })
    }

    /// Record a freshly generated page
    pub fn record(
        &mut self,
        key: &str,
        last_publication_date: Option<&str>,
        now: u64,
        output_path: &str,
    ) {
        self.pages.insert(
            key.to_string(),
            CacheEntry {
                last_publication_date: last_publication_date.map(str::to_string),
                generated_at: now,
                output_path: output_path.to_string(),
            },
        );
    }

    /// Forget pages whose key is not in `keep`, returning their entries
    pub fn prune<'a, I>(&mut self, keep: I) -> Vec<CacheEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: std::collections::HashSet<&str> = keep.into_iter().collect();
        let stale: Vec<String> = self
            .pages
            .keys()
            .filter(|k| !keep.contains(k.as_str()))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter_map(|k| self.pages.remove(&k))
            .collect()
    }
}

/// Calculate a hash for content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Current time as a unix timestamp
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
