//! Cache invalidation hook.
//!
//! The engine owns no cache. When a read cache sits in front of the stores, it
//! plugs in here and is told which keys went stale after each successful
//! element mutation.

use async_trait::async_trait;

use crate::error::EntityKind;

/// Receives invalidations after successful mutations.
///
/// Failures are the implementor's concern; the engine never fails an element
/// because a cache could not be invalidated.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Drop the cached entry for one entity
    async fn invalidate(&self, entity: EntityKind, id: &str);

    /// Drop every entry matching a key pattern, e.g. `list:<id>:items:*`
    async fn invalidate_pattern(&self, pattern: &str);

    fn provider_name(&self) -> &'static str;
}

/// Default invalidator used when no cache is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NoopCacheInvalidator {
    async fn invalidate(&self, _entity: EntityKind, _id: &str) {}

    async fn invalidate_pattern(&self, _pattern: &str) {}

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}

/// Cache key for an entity
pub fn entity_key(entity: EntityKind, id: &str) -> String {
    match entity {
        EntityKind::Item => format!("item:{id}"),
        EntityKind::List => format!("list:{id}"),
    }
}

/// Pattern covering the cached item collections of a list
pub fn list_items_pattern(list_id: &str) -> String {
    format!("list:{list_id}:items:*")
}
