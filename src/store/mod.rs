//! # Entity Stores
//!
//! Persistence collaborators consumed by the engine. The engine only needs
//! per-entity CRUD plus the few relationship lookups the validators walk
//! (dependents of an item, child lists of a list, items of a list).
//!
//! - [`InMemoryStore`]: DashMap-backed store with fault injection, used by tests
//! - [`PgEntityStore`]: PostgreSQL store (feature `postgres`)

pub mod cache;
pub mod errors;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::models::{Item, List};

pub use cache::{CacheInvalidator, NoopCacheInvalidator};
pub use errors::{StoreError, StoreResult};
pub use in_memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgEntityStore;

/// Item persistence
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, id: &str) -> StoreResult<Option<Item>>;

    /// Insert a new item; fails with [`StoreError::Conflict`] when the id is taken
    async fn insert_item(&self, item: Item) -> StoreResult<Item>;

    /// Replace an existing item
    async fn update_item(&self, item: Item) -> StoreResult<Item>;

    /// Returns whether a row was removed
    async fn delete_item(&self, id: &str) -> StoreResult<bool>;

    async fn items_in_list(&self, list_id: &str) -> StoreResult<Vec<Item>>;

    async fn count_items_in_list(&self, list_id: &str) -> StoreResult<usize>;

    /// Items whose dependency set contains `id`
    async fn dependents_of(&self, id: &str) -> StoreResult<Vec<Item>>;
}

/// List persistence
#[async_trait]
pub trait ListStore: Send + Sync {
    async fn get_list(&self, id: &str) -> StoreResult<Option<List>>;

    /// Insert a new list; fails with [`StoreError::Conflict`] when the id is taken
    async fn insert_list(&self, list: List) -> StoreResult<List>;

    /// Replace an existing list
    async fn update_list(&self, list: List) -> StoreResult<List>;

    /// Returns whether a row was removed
    async fn delete_list(&self, id: &str) -> StoreResult<bool>;

    /// Direct children of `parent_id`
    async fn child_lists(&self, parent_id: &str) -> StoreResult<Vec<List>>;
}

/// A store handling both entities
pub trait EntityStore: ItemStore + ListStore {
    /// Name of the backing implementation, for logs
    fn store_name(&self) -> &'static str;
}
