//! Memoized listings keyed on catalog generation.
//!
//! A cached entry is only ever reused for the exact same catalog generation
//! and query, so a hit is indistinguishable from a fresh derivation.

use std::sync::Arc;

use cosmica_core::Product;
use moka::sync::Cache;
use tracing::debug;

use super::{CategoryCount, ListingQuery, category_counts, derive_listing};
use crate::catalog::CatalogSnapshot;

/// Cache key for derived listings and category counts.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Listing { generation: u64, query: ListingQuery },
    Categories { generation: u64 },
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Listing(Arc<Vec<Product>>),
    Categories(Arc<Vec<CategoryCount>>),
}

/// Memoizes [`derive_listing`] and [`category_counts`].
#[derive(Clone)]
pub struct ListingCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl ListingCache {
    /// Create a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// The listing for `query` over `snapshot`.
    pub fn listing(&self, snapshot: &CatalogSnapshot, query: &ListingQuery) -> Arc<Vec<Product>> {
        let key = CacheKey::Listing {
            generation: snapshot.generation,
            query: query.clone(),
        };

        if let Some(CacheValue::Listing(listing)) = self.cache.get(&key) {
            debug!(generation = snapshot.generation, "Cache hit for listing");
            return listing;
        }

        let listing = Arc::new(derive_listing(&snapshot.products, query));
        self.cache.insert(key, CacheValue::Listing(Arc::clone(&listing)));
        listing
    }

    /// Category counts over the unfiltered `snapshot`.
    pub fn categories(&self, snapshot: &CatalogSnapshot) -> Arc<Vec<CategoryCount>> {
        let key = CacheKey::Categories {
            generation: snapshot.generation,
        };

        if let Some(CacheValue::Categories(counts)) = self.cache.get(&key) {
            debug!(generation = snapshot.generation, "Cache hit for categories");
            return counts;
        }

        let counts = Arc::new(category_counts(&snapshot.products));
        self.cache.insert(key, CacheValue::Categories(Arc::clone(&counts)));
        counts
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::catalog::CatalogStatus;

    use super::*;

    fn snapshot(generation: u64, names: &[&str]) -> CatalogSnapshot {
        let products = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::from_value(serde_json::json!({
                    "id": i.to_string(),
                    "nombre": name,
                    "precio": 10,
                    "stock": 1,
                    "marca": "Brand",
                    "categoria": "Tech",
                    "descripcionCorta": "short",
                    "descripcionLarga": "long",
                    "envioSinCargo": false,
                    "edadDesde": 1,
                    "edadHasta": 5,
                    "foto": "https://example.com/x.jpg"
                }))
                .unwrap()
            })
            .collect();

        CatalogSnapshot {
            products: Arc::new(products),
            status: CatalogStatus::Ready,
            generation,
        }
    }

    #[test]
    fn test_hit_matches_fresh_derivation() {
        let cache = ListingCache::new(16);
        let snap = snapshot(1, &["Robot", "Doll"]);
        let query = ListingQuery::new(None, None, Some("name-asc"));

        let first = cache.listing(&snap, &query);
        let second = cache.listing(&snap, &query);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, derive_listing(&snap.products, &query));
    }

    #[test]
    fn test_new_generation_is_recomputed() {
        let cache = ListingCache::new(16);
        let query = ListingQuery::default();

        let old = cache.listing(&snapshot(1, &["Robot"]), &query);
        let new = cache.listing(&snapshot(2, &["Robot", "Doll"]), &query);

        assert_eq!(old.len(), 1);
        assert_eq!(new.len(), 2);
    }

    #[test]
    fn test_categories_cached_per_generation() {
        let cache = ListingCache::new(16);
        let snap = snapshot(3, &["Robot", "Drone"]);

        let counts = cache.categories(&snap);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, 2);
        assert!(Arc::ptr_eq(&counts, &cache.categories(&snap)));
    }

    #[test]
    fn test_clear_forces_recompute() {
        let cache = ListingCache::new(16);
        let snap = snapshot(1, &["Robot"]);
        let query = ListingQuery::default();

        let before = cache.listing(&snap, &query);
        cache.clear();
        let after = cache.listing(&snap, &query);

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before, after);
    }
}
