//! Cache types for API responses.

use capelli_core::CatalogEntry;

/// Cache key for cacheable responses.
///
/// Only the catalog is cached; everything else is per-user and must be read
/// fresh.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<CatalogEntry>),
}
