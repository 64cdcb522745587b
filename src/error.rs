//! Error types for the bulk mutation engine.
//!
//! Two layers:
//! - [`TaskListError`] fails a whole request (bounds violations, missing move
//!   target, unreachable store). Nothing after the failure point is reported.
//! - [`ElementError`] fails one element of a batch. The batch processor catches
//!   it and records it against the element's index.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigurationError;
use crate::constants::{error_codes, messages};
use crate::state_machine::ItemStatus;
use crate::store::StoreError;

/// Entity kinds handled by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Item,
    List,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Item => f.write_str("Item"),
            EntityKind::List => f.write_str("List"),
        }
    }
}

/// Request-level errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskListError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for TaskListError {
    fn from(err: StoreError) -> Self {
        if err.is_infrastructure() {
            TaskListError::Infrastructure(err.to_string())
        } else {
            TaskListError::Internal(err.to_string())
        }
    }
}

impl From<ConfigurationError> for TaskListError {
    fn from(err: ConfigurationError) -> Self {
        TaskListError::ConfigurationError(err.to_string())
    }
}

impl From<ElementError> for TaskListError {
    fn from(err: ElementError) -> Self {
        match err {
            ElementError::NotFound { .. } => TaskListError::NotFound(err.to_string()),
            ElementError::Store(store) => store.into(),
            ElementError::PartiallyApplied { ref source, .. } => {
                let message = err.to_string();
                match TaskListError::from(source.as_ref().clone()) {
                    TaskListError::ValidationError(_) => TaskListError::ValidationError(message),
                    TaskListError::NotFound(_) => TaskListError::NotFound(message),
                    TaskListError::Infrastructure(_) => TaskListError::Infrastructure(message),
                    TaskListError::ConfigurationError(_) => {
                        TaskListError::ConfigurationError(message)
                    }
                    TaskListError::Internal(_) => TaskListError::Internal(message),
                }
            }
            other => TaskListError::ValidationError(other.to_string()),
        }
    }
}

pub type TaskListResult<T> = anyhow::Result<T, TaskListError>;

/// Failure classes that drive the batch-level response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// An independent element failed (not found, store conflict, timeout)
    Element,
    /// The request was well formed but semantically invalid
    BusinessRule,
}

/// Per-element errors caught by the batch processor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: EntityKind, id: String },

    #[error("{}", messages::CANNOT_START_ITEM)]
    CannotStart {
        item_id: String,
        incomplete: Vec<String>,
    },

    #[error("{}", messages::CANNOT_COMPLETE_ITEM)]
    CannotComplete {
        item_id: String,
        incomplete: Vec<String>,
    },

    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    DependencyCycle { item_id: String, cycle: Vec<String> },

    #[error("Dependency {dependency_id} is created in the same batch; dependencies must already exist")]
    DependencyInBatch {
        item_id: Option<String>,
        dependency_id: String,
    },

    #[error("Cannot move list {list_id} under {parent_id}: circular reference detected")]
    CircularReference { list_id: String, parent_id: String },

    #[error("{}", messages::CANNOT_ARCHIVE_LIST)]
    ActiveChildren {
        list_id: String,
        active_lists: Vec<String>,
        open_items: Vec<String>,
    },

    #[error("Cannot delete item {item_id}: required by {}", .dependents.join(", "))]
    HasDependents {
        item_id: String,
        dependents: Vec<String>,
    },

    #[error("Cannot delete list {list_id}: it has {count} child list(s)")]
    HasChildLists { list_id: String, count: usize },

    #[error("Cannot delete list {list_id}: it contains {count} item(s)")]
    HasItems { list_id: String, count: usize },

    #[error("Operation {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A multi-write element failed after some of its writes were stored
    #[error("{source} (already applied: {})", .applied.join(", "))]
    PartiallyApplied {
        id: String,
        applied: Vec<String>,
        source: Box<ElementError>,
    },
}

impl ElementError {
    /// Dependency gating error worded for the requested target status
    pub fn dependencies_incomplete(
        item_id: impl Into<String>,
        target: ItemStatus,
        incomplete: Vec<String>,
    ) -> Self {
        let item_id = item_id.into();
        match target {
            ItemStatus::Completed => ElementError::CannotComplete {
                item_id,
                incomplete,
            },
            _ => ElementError::CannotStart {
                item_id,
                incomplete,
            },
        }
    }

    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        ElementError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ElementError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure with the ids already written for element `id`.
    /// Returns the error unchanged when nothing was written.
    pub fn partially_applied(self, id: impl Into<String>, applied: Vec<String>) -> Self {
        if applied.is_empty() {
            return self;
        }
        ElementError::PartiallyApplied {
            id: id.into(),
            applied,
            source: Box::new(self),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ElementError::PartiallyApplied { source, .. } => source.code(),
            ElementError::NotFound { .. } => error_codes::NOT_FOUND,
            ElementError::InvalidField { .. } => error_codes::INVALID_FIELD,
            ElementError::AlreadyExists { .. } => error_codes::ALREADY_EXISTS,
            ElementError::CannotStart { .. } | ElementError::CannotComplete { .. } => {
                error_codes::DEPENDENCIES_NOT_COMPLETED
            }
            ElementError::DependencyCycle { .. } => error_codes::DEPENDENCY_CYCLE,
            ElementError::DependencyInBatch { .. } => error_codes::DEPENDENCY_IN_BATCH,
            ElementError::CircularReference { .. } => error_codes::CIRCULAR_REFERENCE,
            ElementError::ActiveChildren { .. } => error_codes::ACTIVE_CHILDREN,
            ElementError::HasDependents { .. } => error_codes::HAS_DEPENDENTS,
            ElementError::HasChildLists { .. } => error_codes::HAS_CHILD_LISTS,
            ElementError::HasItems { .. } => error_codes::HAS_ITEMS,
            ElementError::Timeout { .. } | ElementError::Store(StoreError::Timeout { .. }) => {
                error_codes::TIMEOUT
            }
            ElementError::Store(StoreError::Conflict(_)) => error_codes::STORE_CONFLICT,
            ElementError::Store(_) => error_codes::STORE_ERROR,
        }
    }

    pub fn failure_class(&self) -> FailureClass {
        match self {
            ElementError::CannotStart { .. }
            | ElementError::CannotComplete { .. }
            | ElementError::DependencyCycle { .. }
            | ElementError::CircularReference { .. }
            | ElementError::ActiveChildren { .. }
            | ElementError::HasDependents { .. }
            | ElementError::HasChildLists { .. }
            | ElementError::HasItems { .. } => FailureClass::BusinessRule,
            ElementError::PartiallyApplied { source, .. } => source.failure_class(),
            _ => FailureClass::Element,
        }
    }

    pub fn is_business_rule(&self) -> bool {
        self.failure_class() == FailureClass::BusinessRule
    }

    pub fn is_infrastructure(&self) -> bool {
        match self {
            ElementError::Store(err) => err.is_infrastructure(),
            ElementError::PartiallyApplied { source, .. } => source.is_infrastructure(),
            _ => false,
        }
    }

    /// Id of the entity the error is about, when the error itself knows it
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            ElementError::NotFound { id, .. } | ElementError::AlreadyExists { id, .. } => Some(id),
            ElementError::CannotStart { item_id, .. }
            | ElementError::CannotComplete { item_id, .. }
            | ElementError::DependencyCycle { item_id, .. }
            | ElementError::HasDependents { item_id, .. } => Some(item_id),
            ElementError::DependencyInBatch { item_id, .. } => item_id.as_deref(),
            ElementError::CircularReference { list_id, .. }
            | ElementError::ActiveChildren { list_id, .. }
            | ElementError::HasChildLists { list_id, .. }
            | ElementError::HasItems { list_id, .. } => Some(list_id),
            ElementError::PartiallyApplied { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Structured context attached to the batch error entry
    pub fn details(&self) -> Option<Value> {
        match self {
            ElementError::CannotStart { incomplete, .. }
            | ElementError::CannotComplete { incomplete, .. } => {
                Some(json!({ "incompleteDependencies": incomplete }))
            }
            ElementError::DependencyCycle { cycle, .. } => Some(json!({ "cycle": cycle })),
            ElementError::DependencyInBatch { dependency_id, .. } => {
                Some(json!({ "dependencyId": dependency_id }))
            }
            ElementError::CircularReference { parent_id, .. } => {
                Some(json!({ "proposedParentId": parent_id }))
            }
            ElementError::ActiveChildren {
                active_lists,
                open_items,
                ..
            } => Some(json!({ "activeLists": active_lists, "openItems": open_items })),
            ElementError::HasDependents { dependents, .. } => {
                Some(json!({ "dependents": dependents }))
            }
            ElementError::InvalidField { field, .. } => Some(json!({ "field": field })),
            ElementError::PartiallyApplied {
                applied, source, ..
            } => {
                let mut details = source.details().unwrap_or_else(|| json!({}));
                details["appliedIds"] = json!(applied);
                Some(details)
            }
            _ => None,
        }
    }
}

pub type ElementResult<T> = Result<T, ElementError>;
