use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::Catalog;
use crate::config::SchemaCacheConfig;
use crate::table_path::TablePath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<ColumnSchema>,
}

/// Cache entry with timestamp for TTL tracking.
#[derive(Debug, Clone)]
struct CacheEntry {
    catalog: Arc<Catalog>,
    inserted_at: Instant,
}

/// Catalog cache with TTL and size limits.
///
/// Entries are shared as `Arc<Catalog>`; a refresh swaps the Arc and never
/// mutates a catalog that an in-flight build may be reading.
#[derive(Debug)]
pub struct SchemaCache {
    catalogs: HashMap<TablePath, CacheEntry>,
    ttl: Duration,
    max_size: usize,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::with_config(&SchemaCacheConfig::default())
    }

    /// Create a schema cache with configuration.
    pub fn with_config(config: &SchemaCacheConfig) -> Self {
        Self {
            catalogs: HashMap::new(),
            ttl: Duration::from_secs(config.ttl_secs),
            max_size: config.max_size.max(1),
        }
    }

    pub fn insert(&mut self, path: TablePath, catalog: Arc<Catalog>) {
        if !self.catalogs.contains_key(&path) && self.catalogs.len() >= self.max_size {
            self.evict_oldest();
        }

        self.catalogs.insert(
            path,
            CacheEntry {
                catalog,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, path: &TablePath) -> Option<Arc<Catalog>> {
        self.catalogs.get(path).and_then(|entry| {
            if entry.inserted_at.elapsed() < self.ttl {
                Some(entry.catalog.clone())
            } else {
                // Expired - treat as cache miss
                None
            }
        })
    }

    pub fn contains(&self, path: &TablePath) -> bool {
        self.get(path).is_some()
    }

    /// Drop the entry for one table so the next lookup refetches it.
    pub fn invalidate(&mut self, path: &TablePath) {
        self.catalogs.remove(path);
    }

    /// Remove expired entries from the cache.
    pub fn evict_expired(&mut self) {
        self.catalogs
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest_key) = self
            .catalogs
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(k, _)| k.clone())
        {
            tracing::debug!(table = %oldest_key, "evicting oldest catalog from cache");
            self.catalogs.remove(&oldest_key);
        }
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    pub fn clear(&mut self) {
        self.catalogs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::from_pairs([("pts", "INT64")]))
    }

    fn path(table: &str) -> TablePath {
        TablePath::new("p", "d", table).unwrap()
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = SchemaCache::with_config(&SchemaCacheConfig {
            ttl_secs: 3600,
            max_size: 2,
        });
        cache.insert(path("a"), catalog());
        cache.insert(path("b"), catalog());
        cache.insert(path("c"), catalog());
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&path("a")));
        assert!(cache.contains(&path("c")));
    }

    #[test]
    fn zero_ttl_is_always_a_miss() {
        let mut cache = SchemaCache::with_config(&SchemaCacheConfig {
            ttl_secs: 0,
            max_size: 10,
        });
        cache.insert(path("a"), catalog());
        assert!(cache.get(&path("a")).is_none());
        cache.evict_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn refresh_does_not_touch_shared_catalog() {
        let mut cache = SchemaCache::new();
        cache.insert(path("a"), catalog());
        let held = cache.get(&path("a")).unwrap();
        cache.insert(
            path("a"),
            Arc::new(Catalog::from_pairs([("pts", "INT64"), ("fga", "INT64")])),
        );
        assert_eq!(held.len(), 1);
        assert_eq!(cache.get(&path("a")).unwrap().len(), 2);
        cache.invalidate(&path("a"));
        assert!(cache.is_empty());
    }
}
