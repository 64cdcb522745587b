//! # Item
//!
//! A unit of work owned by a [`List`](super::List). Items declare dependencies on
//! other items; the dependency relation must stay acyclic and gates the
//! `in_progress`/`completed` transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Priority;
use crate::state_machine::ItemStatus;

/// A stored item.
///
/// An edge `self -> d` for every `d` in `dependencies` means "self requires d
/// completed before self may start".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub list_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ItemStatus,
    pub priority: Priority,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    pub position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Move the item into `status`, keeping `completed_at` consistent.
    ///
    /// `touch` controls whether `updated_at` is refreshed.
    pub fn apply_status(&mut self, status: ItemStatus, now: DateTime<Utc>, touch: bool) {
        if status == ItemStatus::Completed {
            if self.status != ItemStatus::Completed || self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.status = status;
        if touch {
            self.updated_at = now;
        }
    }

    pub fn depends_on(&self, other: &str) -> bool {
        self.dependencies.contains(other)
    }
}

/// Payload for creating an item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    /// Caller-supplied id; a UUID is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub list_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl NewItem {
    pub fn new(list_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Materialize the stored item.
    pub fn into_item(
        self,
        id: String,
        created_by: Option<String>,
        position: i64,
        now: DateTime<Utc>,
    ) -> Item {
        let status = self.status.unwrap_or_default();
        Item {
            id,
            list_id: self.list_id,
            title: self.title.trim().to_string(),
            description: self.description,
            status,
            priority: self.priority.unwrap_or_default(),
            dependencies: self.dependencies,
            position,
            created_by,
            completed_at: (status == ItemStatus::Completed).then_some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeSet<String>>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.dependencies.is_none()
    }

    pub fn changes_dependencies(&self) -> bool {
        self.dependencies.is_some()
    }

    /// Apply every field except `status`, which goes through the dependency guard.
    pub fn apply_fields(&self, item: &mut Item, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            item.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(dependencies) = &self.dependencies {
            item.dependencies = dependencies.clone();
        }
        item.updated_at = now;
    }
}
