//! # System Constants
//!
//! Operational boundaries of the bulk mutation engine: batch bounds, default
//! chunk sizes per operation family, payload limits and the canonical
//! messages surfaced to callers.

use serde::{Deserialize, Serialize};

// Re-export state types for convenience
pub use crate::state_machine::{ItemStatus, ListStatus};

/// Request-level batch bounds, checked before any store call
pub mod limits {
    /// Maximum number of elements in an item batch
    pub const MAX_ITEM_BATCH: usize = 100;
    /// Maximum number of elements in a list batch
    pub const MAX_LIST_BATCH: usize = 50;
    /// Maximum title length for items and lists
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum description length for items and lists
    pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
    /// Ancestor walks give up past this depth and report a circular reference
    pub const MAX_HIERARCHY_DEPTH: usize = 100;
    /// Per-element store timeout in milliseconds
    pub const ELEMENT_TIMEOUT_MS: u64 = 5_000;
}

/// Default chunk sizes per operation family
pub mod batch_sizes {
    pub const ITEM_CREATE: usize = 100;
    pub const ITEM_UPDATE: usize = 50;
    pub const ITEM_STATUS: usize = 50;
    pub const ITEM_MOVE: usize = 50;
    pub const ITEM_DELETE: usize = 50;

    pub const LIST_CREATE: usize = 25;
    pub const LIST_UPDATE: usize = 25;
    pub const LIST_STATUS: usize = 25;
    pub const LIST_MOVE: usize = 25;
    pub const LIST_DELETE: usize = 25;
}

/// Canonical element error messages
pub mod messages {
    pub const CANNOT_START_ITEM: &str = "Cannot start item: dependencies not completed";
    pub const CANNOT_COMPLETE_ITEM: &str = "Cannot complete item due to incomplete dependencies";
    pub const CANNOT_ARCHIVE_LIST: &str = "Cannot archive list with active children";
}

/// Stable error codes attached to batch error entries
pub mod error_codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_FIELD: &str = "INVALID_FIELD";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const DEPENDENCIES_NOT_COMPLETED: &str = "DEPENDENCIES_NOT_COMPLETED";
    pub const DEPENDENCY_CYCLE: &str = "DEPENDENCY_CYCLE";
    pub const DEPENDENCY_IN_BATCH: &str = "DEPENDENCY_IN_BATCH";
    pub const CIRCULAR_REFERENCE: &str = "CIRCULAR_REFERENCE";
    pub const ACTIVE_CHILDREN: &str = "ACTIVE_CHILDREN";
    pub const HAS_DEPENDENTS: &str = "HAS_DEPENDENTS";
    pub const HAS_CHILD_LISTS: &str = "HAS_CHILD_LISTS";
    pub const HAS_ITEMS: &str = "HAS_ITEMS";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const STORE_CONFLICT: &str = "STORE_CONFLICT";
    pub const STORE_ERROR: &str = "STORE_ERROR";
}

/// Operation families handled by the bulk mutation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationFamily {
    Create,
    Update,
    Status,
    Move,
    Delete,
}

impl OperationFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationFamily::Create => "create",
            OperationFamily::Update => "update",
            OperationFamily::Status => "status",
            OperationFamily::Move => "move",
            OperationFamily::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OperationFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy for dependencies that point at items which no longer exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDependencyPolicy {
    /// A missing dependency counts as incomplete and blocks the transition
    #[default]
    Block,
    /// A missing dependency is treated as satisfied
    Allow,
}
