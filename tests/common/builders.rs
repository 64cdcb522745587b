//! Builders for seeding the in-memory store directly, bypassing the engine.

#![allow(dead_code)]

use chrono::Utc;
use tasklist_core::bulk::{
    BulkDeleteRequest, BulkItemStatusRequest, BulkListStatusRequest, BulkMoveRequest,
    DeleteOptions, ListStatusOptions, MoveOptions,
};
use tasklist_core::models::{Item, List, NewItem, NewList};
use tasklist_core::store::InMemoryStore;
use tasklist_core::{ItemStatus, ListStatus};

/// Builder for stored lists
pub struct ListBuilder {
    new_list: NewList,
    id: String,
}

impl ListBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            new_list: NewList::new(format!("List {id}")),
            id: id.to_string(),
        }
    }

    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.new_list = self.new_list.with_parent(parent_id);
        self
    }

    pub fn with_status(mut self, status: ListStatus) -> Self {
        self.new_list = self.new_list.with_status(status);
        self
    }

    pub fn build(self) -> List {
        self.new_list.into_list(self.id, None, Utc::now())
    }
}

/// Builder for stored items
pub struct ItemBuilder {
    new_item: NewItem,
    id: String,
    position: i64,
}

impl ItemBuilder {
    pub fn new(id: &str, list_id: &str) -> Self {
        Self {
            new_item: NewItem::new(list_id, format!("Item {id}")),
            id: id.to_string(),
            position: 0,
        }
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.new_item = self.new_item.with_status(status);
        self
    }

    pub fn depends_on(mut self, dependencies: &[&str]) -> Self {
        self.new_item = self.new_item.with_dependencies(dependencies.iter().copied());
        self
    }

    pub fn at_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn build(self) -> Item {
        self.new_item
            .into_item(self.id, None, self.position, Utc::now())
    }
}

pub fn seeded_store(lists: Vec<List>, items: Vec<Item>) -> InMemoryStore {
    InMemoryStore::with_entities(lists, items)
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

pub fn item_status_request(item_ids: &[&str], status: ItemStatus) -> BulkItemStatusRequest {
    BulkItemStatusRequest {
        ids: ids(item_ids),
        status,
        options: Default::default(),
    }
}

pub fn list_status_request(
    list_ids: &[&str],
    status: ListStatus,
    options: ListStatusOptions,
) -> BulkListStatusRequest {
    BulkListStatusRequest {
        ids: ids(list_ids),
        status,
        options,
    }
}

pub fn move_request(entity_ids: &[&str], target: Option<&str>) -> BulkMoveRequest {
    BulkMoveRequest {
        ids: ids(entity_ids),
        target_list_id: Some(target.map(str::to_string)),
        options: MoveOptions::default(),
    }
}

pub fn delete_request(entity_ids: &[&str], options: DeleteOptions) -> BulkDeleteRequest {
    BulkDeleteRequest {
        ids: ids(entity_ids),
        options,
    }
}
