//! # List
//!
//! Lists own items and nest through `parent_list_id`. The parent relation must
//! stay a forest: no list may become its own ancestor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Priority;
use crate::state_machine::ListStatus;
use crate::utils::serde::deserialize_nullable_field;

/// A stored list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ListStatus,
    pub priority: Priority,
    #[serde(default)]
    pub parent_list_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    /// Move the list into `status`, keeping `completed_at` consistent
    pub fn apply_status(&mut self, status: ListStatus, now: DateTime<Utc>) {
        match status {
            ListStatus::Completed if self.completed_at.is_none() => self.completed_at = Some(now),
            ListStatus::Active => self.completed_at = None,
            _ => {}
        }
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_root(&self) -> bool {
        self.parent_list_id.is_none()
    }
}

/// Payload for creating a list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_list_id: Option<String>,
}

impl NewList {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parent(mut self, parent_list_id: impl Into<String>) -> Self {
        self.parent_list_id = Some(parent_list_id.into());
        self
    }

    pub fn with_status(mut self, status: ListStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn into_list(self, id: String, created_by: Option<String>, now: DateTime<Utc>) -> List {
        let status = self.status.unwrap_or_default();
        List {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            status,
            priority: self.priority.unwrap_or_default(),
            parent_list_id: self.parent_list_id,
            created_by,
            completed_at: (status == ListStatus::Completed).then_some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// `Some(None)` re-parents the list to the root
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_list_id: Option<Option<String>>,
}

impl ListPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.parent_list_id.is_none()
    }

    pub fn changes_parent(&self) -> bool {
        self.parent_list_id.is_some()
    }

    /// Apply every field except `status` and `parent_list_id`, which are validated first.
    pub fn apply_fields(&self, list: &mut List, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            list.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            list.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            list.priority = priority;
        }
        list.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_list_defaults() {
        let list = NewList::new("Groceries").into_list("l1".to_string(), None, Utc::now());
        assert_eq!(list.status, ListStatus::Active);
        assert!(list.is_root());
        assert!(list.completed_at.is_none());
    }

    #[test]
    fn test_apply_status_completed_then_reactivated() {
        let mut list = NewList::new("Groceries").into_list("l1".to_string(), None, Utc::now());
        let now = Utc::now();
        list.apply_status(ListStatus::Completed, now);
        assert_eq!(list.completed_at, Some(now));
        list.apply_status(ListStatus::Active, now);
        assert!(list.completed_at.is_none());
    }

    #[test]
    fn test_patch_distinguishes_null_parent() {
        let to_root: ListPatch = serde_json::from_str(r#"{"parentListId": null}"#).unwrap();
        assert!(to_root.changes_parent());
        assert_eq!(to_root.parent_list_id, Some(None));

        let untouched: ListPatch = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert!(!untouched.changes_parent());
    }
}
