//! # In-Memory Entity Store
//!
//! Thread-safe in-memory implementation of [`ItemStore`] and [`ListStore`] for
//! testing and development.
//!
//! ## Features
//!
//! - **Concurrent Access**: `DashMap` tables, no lock is held across an await point
//! - **Fault Injection**: simulate an unreachable store, per-id conflicts or
//!   unreachability, and per-id latency (for element timeout tests)
//! - **Call Accounting**: counts every store call so tests can assert that a
//!   rejected request never reached the store

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{EntityStore, ItemStore, ListStore, StoreError, StoreResult};
use crate::models::{Item, List};

#[derive(Debug, Default)]
struct FaultPlan {
    unavailable: bool,
    unreachable_ids: HashSet<String>,
    conflict_ids: HashSet<String>,
    latency: HashMap<String, Duration>,
}

/// In-memory store for items and lists
///
/// # Example
///
/// ```rust
/// use tasklist_core::store::{InMemoryStore, ListStore};
/// use tasklist_core::models::NewList;
/// use chrono::Utc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::new();
/// let list = NewList::new("Inbox").into_list("inbox".to_string(), None, Utc::now());
/// store.insert_list(list).await?;
///
/// assert!(store.get_list("inbox").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: DashMap<String, Item>,
    lists: DashMap<String, List>,
    faults: Mutex<FaultPlan>,
    calls: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store without going through the engine
    pub fn with_entities(lists: Vec<List>, items: Vec<Item>) -> Self {
        let store = Self::new();
        for list in lists {
            store.lists.insert(list.id.clone(), list);
        }
        for item in items {
            store.items.insert(item.id.clone(), item);
        }
        store
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.lock().unavailable = unavailable;
    }

    /// Fail calls touching `id` with [`StoreError::Unavailable`]
    pub fn make_unreachable_for(&self, id: impl Into<String>) {
        self.faults.lock().unreachable_ids.insert(id.into());
    }

    /// Fail writes touching `id` with [`StoreError::Conflict`]
    pub fn inject_conflict(&self, id: impl Into<String>) {
        self.faults.lock().conflict_ids.insert(id.into());
    }

    /// Delay calls touching `id`
    pub fn inject_latency(&self, id: impl Into<String>, delay: Duration) {
        self.faults.lock().latency.insert(id.into(), delay);
    }

    pub fn clear_faults(&self) {
        *self.faults.lock() = FaultPlan::default();
    }

    /// Number of store calls made so far
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    async fn enter(&self, operation: &str, id: Option<&str>) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = {
            let faults = self.faults.lock();
            if faults.unavailable {
                return Err(StoreError::Unavailable(format!(
                    "in-memory store offline during {operation}"
                )));
            }
            if let Some(id) = id {
                if faults.unreachable_ids.contains(id) {
                    return Err(StoreError::Unavailable(format!(
                        "in-memory store unreachable for {id} during {operation}"
                    )));
                }
            }
            id.and_then(|id| faults.latency.get(id).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn check_conflict(&self, id: &str) -> StoreResult<()> {
        if self.faults.lock().conflict_ids.contains(id) {
            return Err(StoreError::Conflict(format!("injected conflict on {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn get_item(&self, id: &str) -> StoreResult<Option<Item>> {
        self.enter("get_item", Some(id)).await?;
        Ok(self.items.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert_item(&self, item: Item) -> StoreResult<Item> {
        self.enter("insert_item", Some(&item.id)).await?;
        self.check_conflict(&item.id)?;
        match self.items.entry(item.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "item {} already exists",
                item.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(item.clone());
                Ok(item)
            }
        }
    }

    async fn update_item(&self, item: Item) -> StoreResult<Item> {
        self.enter("update_item", Some(&item.id)).await?;
        self.check_conflict(&item.id)?;
        match self.items.get_mut(&item.id) {
            Some(mut existing) => {
                *existing = item.clone();
                Ok(item)
            }
            None => Err(StoreError::Conflict(format!(
                "item {} no longer exists",
                item.id
            ))),
        }
    }

    async fn delete_item(&self, id: &str) -> StoreResult<bool> {
        self.enter("delete_item", Some(id)).await?;
        self.check_conflict(id)?;
        Ok(self.items.remove(id).is_some())
    }

    async fn items_in_list(&self, list_id: &str) -> StoreResult<Vec<Item>> {
        self.enter("items_in_list", Some(list_id)).await?;
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|entry| entry.list_id == list_id)
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn count_items_in_list(&self, list_id: &str) -> StoreResult<usize> {
        self.enter("count_items_in_list", Some(list_id)).await?;
        Ok(self
            .items
            .iter()
            .filter(|entry| entry.list_id == list_id)
            .count())
    }

    async fn dependents_of(&self, id: &str) -> StoreResult<Vec<Item>> {
        self.enter("dependents_of", Some(id)).await?;
        let mut dependents: Vec<Item> = self
            .items
            .iter()
            .filter(|entry| entry.depends_on(id))
            .map(|entry| entry.value().clone())
            .collect();
        dependents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(dependents)
    }
}

#[async_trait]
impl ListStore for InMemoryStore {
    async fn get_list(&self, id: &str) -> StoreResult<Option<List>> {
        self.enter("get_list", Some(id)).await?;
        Ok(self.lists.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert_list(&self, list: List) -> StoreResult<List> {
        self.enter("insert_list", Some(&list.id)).await?;
        self.check_conflict(&list.id)?;
        match self.lists.entry(list.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "list {} already exists",
                list.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(list.clone());
                Ok(list)
            }
        }
    }

    async fn update_list(&self, list: List) -> StoreResult<List> {
        self.enter("update_list", Some(&list.id)).await?;
        self.check_conflict(&list.id)?;
        match self.lists.get_mut(&list.id) {
            Some(mut existing) => {
                *existing = list.clone();
                Ok(list)
            }
            None => Err(StoreError::Conflict(format!(
                "list {} no longer exists",
                list.id
            ))),
        }
    }

    async fn delete_list(&self, id: &str) -> StoreResult<bool> {
        self.enter("delete_list", Some(id)).await?;
        self.check_conflict(id)?;
        Ok(self.lists.remove(id).is_some())
    }

    async fn child_lists(&self, parent_id: &str) -> StoreResult<Vec<List>> {
        self.enter("child_lists", Some(parent_id)).await?;
        let mut children: Vec<List> = self
            .lists
            .iter()
            .filter(|entry| entry.parent_list_id.as_deref() == Some(parent_id))
            .map(|entry| entry.value().clone())
            .collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(children)
    }
}

impl EntityStore for InMemoryStore {
    fn store_name(&self) -> &'static str {
        "in_memory"
    }
}
