//! # Engine Configuration
//!
//! Batch bounds, per-family default batch sizes, element timeouts and the
//! missing-dependency policy. Every value has a default matching the crate
//! constants, so an empty configuration is valid.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasklist_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Layers config/tasklist.toml, config/environments/<env>.toml and TASKLIST_* variables
//! let manager = ConfigManager::load()?;
//!
//! let max_items = manager.config().limits.max_item_batch;
//! let timeout = manager.config().batch.element_timeout();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{batch_sizes, limits, MissingDependencyPolicy};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskListConfig {
    pub limits: LimitsConfig,
    pub batch: BatchConfig,
    pub items: ItemBatchConfig,
    pub lists: ListBatchConfig,
}

/// Request bounds and payload field limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_item_batch: usize,
    pub max_list_batch: usize,
    pub max_title_length: usize,
    pub max_description_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_item_batch: limits::MAX_ITEM_BATCH,
            max_list_batch: limits::MAX_LIST_BATCH,
            max_title_length: limits::MAX_TITLE_LENGTH,
            max_description_length: limits::MAX_DESCRIPTION_LENGTH,
        }
    }
}

/// Batch processor behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Per-element deadline in milliseconds; 0 disables it
    pub element_timeout_ms: u64,
    /// Ancestor walks give up beyond this many levels
    pub max_hierarchy_depth: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: limits::ELEMENT_TIMEOUT_MS,
            max_hierarchy_depth: limits::MAX_HIERARCHY_DEPTH,
        }
    }
}

impl BatchConfig {
    pub fn element_timeout(&self) -> Option<Duration> {
        (self.element_timeout_ms > 0).then(|| Duration::from_millis(self.element_timeout_ms))
    }
}

/// Default batch sizes for item operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemBatchConfig {
    pub create_batch_size: usize,
    pub update_batch_size: usize,
    pub status_batch_size: usize,
    pub move_batch_size: usize,
    pub delete_batch_size: usize,
    pub missing_dependency_policy: MissingDependencyPolicy,
}

impl Default for ItemBatchConfig {
    fn default() -> Self {
        Self {
            create_batch_size: batch_sizes::ITEM_CREATE,
            update_batch_size: batch_sizes::ITEM_UPDATE,
            status_batch_size: batch_sizes::ITEM_STATUS,
            move_batch_size: batch_sizes::ITEM_MOVE,
            delete_batch_size: batch_sizes::ITEM_DELETE,
            missing_dependency_policy: MissingDependencyPolicy::default(),
        }
    }
}

/// Default batch sizes for list operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListBatchConfig {
    pub create_batch_size: usize,
    pub update_batch_size: usize,
    pub status_batch_size: usize,
    pub move_batch_size: usize,
    pub delete_batch_size: usize,
}

impl Default for ListBatchConfig {
    fn default() -> Self {
        Self {
            create_batch_size: batch_sizes::LIST_CREATE,
            update_batch_size: batch_sizes::LIST_UPDATE,
            status_batch_size: batch_sizes::LIST_STATUS,
            move_batch_size: batch_sizes::LIST_MOVE,
            delete_batch_size: batch_sizes::LIST_DELETE,
        }
    }
}

impl TaskListConfig {
    /// Validate bounds and that every default batch size fits its request limit
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let positive = [
            ("limits.max_item_batch", self.limits.max_item_batch),
            ("limits.max_list_batch", self.limits.max_list_batch),
            ("limits.max_title_length", self.limits.max_title_length),
            ("batch.max_hierarchy_depth", self.batch.max_hierarchy_depth),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "must be greater than 0",
                ));
            }
        }

        let item_sizes = [
            ("items.create_batch_size", self.items.create_batch_size),
            ("items.update_batch_size", self.items.update_batch_size),
            ("items.status_batch_size", self.items.status_batch_size),
            ("items.move_batch_size", self.items.move_batch_size),
            ("items.delete_batch_size", self.items.delete_batch_size),
        ];
        Self::check_batch_sizes(&item_sizes, self.limits.max_item_batch)?;

        let list_sizes = [
            ("lists.create_batch_size", self.lists.create_batch_size),
            ("lists.update_batch_size", self.lists.update_batch_size),
            ("lists.status_batch_size", self.lists.status_batch_size),
            ("lists.move_batch_size", self.lists.move_batch_size),
            ("lists.delete_batch_size", self.lists.delete_batch_size),
        ];
        Self::check_batch_sizes(&list_sizes, self.limits.max_list_batch)
    }

    fn check_batch_sizes(sizes: &[(&str, usize)], max: usize) -> Result<(), ConfigurationError> {
        for (field, size) in sizes {
            if *size == 0 || *size > max {
                return Err(ConfigurationError::invalid_value(
                    *field,
                    size.to_string(),
                    format!("batch size must be between 1 and {max}"),
                ));
            }
        }
        Ok(())
    }
}
