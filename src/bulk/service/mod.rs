//! # Bulk Mutation Service
//!
//! Per-entity, per-family entry points over [`BatchProcessor`] and the two
//! validators. Each call:
//!
//! 1. checks request bounds (nothing touches the store on failure)
//! 2. resolves the family's options against configuration
//! 3. drives the element operation through the batch processor, running the
//!    relevant validator before every write
//! 4. maps the batch result onto a [`BulkResponse`] carrying the caller's
//!    correlation id
//!
//! The service holds no per-call state; one instance can serve concurrent
//! requests.

mod items;
mod lists;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::batch_processor::BatchProcessor;
use super::context::RequestContext;
use super::options::FamilyDefaults;
use super::response::{resolve_status, BulkResponse, FailurePolicy};
use super::types::BatchResult;
use crate::config::{ConfigManager, TaskListConfig};
use crate::constants::OperationFamily;
use crate::error::{EntityKind, TaskListError, TaskListResult};
use crate::logging::{log_batch_aborted, log_batch_summary};
use crate::models::{Item, List};
use crate::store::cache::{list_items_pattern, CacheInvalidator, NoopCacheInvalidator};
use crate::store::EntityStore;
use crate::validation::{DependencyGraphValidator, HierarchyValidator};

/// Result entry of a delete operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedEntity {
    pub id: String,
    /// Descendant lists removed along with a forced list delete, children first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_lists: Vec<String>,
    /// Items removed along with a list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_items: Vec<String>,
    /// Items whose dependency on a force-deleted item was dropped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated_dependents: Vec<String>,
}

impl DeletedEntity {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            removed_lists: Vec::new(),
            removed_items: Vec::new(),
            updated_dependents: Vec::new(),
        }
    }

    /// Every id written so far, items and dependents before lists
    fn removed_ids(&self) -> Vec<String> {
        self.removed_items
            .iter()
            .chain(&self.updated_dependents)
            .chain(&self.removed_lists)
            .cloned()
            .collect()
    }
}

/// Result entry of a list status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStatusOutcome {
    #[serde(flatten)]
    pub list: List,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cascaded_lists: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cascaded_items: Vec<String>,
}

pub struct BulkMutationService {
    store: Arc<dyn EntityStore>,
    cache: Arc<dyn CacheInvalidator>,
    config: Arc<TaskListConfig>,
    processor: BatchProcessor,
    dependencies: DependencyGraphValidator,
    hierarchy: HierarchyValidator,
}

impl std::fmt::Debug for BulkMutationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkMutationService")
            .field("store", &self.store.store_name())
            .field("cache", &self.cache.provider_name())
            .field("config", &self.config)
            .field("processor", &self.processor)
            .finish()
    }
}

impl BulkMutationService {
    pub fn new(store: Arc<dyn EntityStore>, config: TaskListConfig) -> Self {
        let processor = BatchProcessor::new(config.batch.element_timeout());
        let dependencies =
            DependencyGraphValidator::new(store.clone(), config.items.missing_dependency_policy);
        let hierarchy =
            HierarchyValidator::new(store.clone()).with_max_depth(config.batch.max_hierarchy_depth);

        Self {
            store,
            cache: Arc::new(NoopCacheInvalidator),
            config: Arc::new(config),
            processor,
            dependencies,
            hierarchy,
        }
    }

    pub fn from_manager(store: Arc<dyn EntityStore>, manager: &ConfigManager) -> Self {
        Self::new(store, manager.config().clone())
    }

    pub fn with_cache_invalidator(mut self, cache: Arc<dyn CacheInvalidator>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &TaskListConfig {
        &self.config
    }

    pub fn dependency_validator(&self) -> &DependencyGraphValidator {
        &self.dependencies
    }

    pub fn hierarchy_validator(&self) -> &HierarchyValidator {
        &self.hierarchy
    }

    /// Ancestors of a list from the root down to its immediate parent
    pub async fn breadcrumbs(&self, list_id: &str) -> TaskListResult<Vec<List>> {
        Ok(self.hierarchy.breadcrumbs(list_id).await?)
    }

    fn item_defaults(&self, family: OperationFamily) -> FamilyDefaults {
        let items = &self.config.items;
        let (operation, batch_size, continue_on_error) = match family {
            OperationFamily::Create => ("create_items", items.create_batch_size, false),
            OperationFamily::Update => ("update_items", items.update_batch_size, true),
            OperationFamily::Status => ("update_item_status", items.status_batch_size, true),
            OperationFamily::Move => ("move_items", items.move_batch_size, true),
            OperationFamily::Delete => ("delete_items", items.delete_batch_size, true),
        };
        FamilyDefaults {
            operation,
            batch_size,
            max_batch_size: self.config.limits.max_item_batch,
            continue_on_error,
        }
    }

    fn list_defaults(&self, family: OperationFamily) -> FamilyDefaults {
        let lists = &self.config.lists;
        let (operation, batch_size) = match family {
            OperationFamily::Create => ("create_lists", lists.create_batch_size),
            OperationFamily::Update => ("update_lists", lists.update_batch_size),
            OperationFamily::Status => ("update_list_status", lists.status_batch_size),
            OperationFamily::Move => ("move_lists", lists.move_batch_size),
            OperationFamily::Delete => ("delete_lists", lists.delete_batch_size),
        };
        FamilyDefaults {
            operation,
            batch_size,
            max_batch_size: self.config.limits.max_list_batch,
            continue_on_error: true,
        }
    }

    async fn invalidate_item(&self, item: &Item) {
        self.cache.invalidate(EntityKind::Item, &item.id).await;
        self.cache
            .invalidate_pattern(&list_items_pattern(&item.list_id))
            .await;
    }

    async fn invalidate_list(&self, list_id: &str) {
        self.cache.invalidate(EntityKind::List, list_id).await;
    }

    /// Map a finished (or aborted) batch onto the response and log it
    fn finish<T>(
        &self,
        ctx: &RequestContext,
        entity: EntityKind,
        family: OperationFamily,
        policy: FailurePolicy,
        started: Instant,
        outcome: TaskListResult<BatchResult<T>>,
    ) -> BulkResponse<T> {
        match outcome {
            Ok(result) => {
                let status = resolve_status(family, policy, &result);
                log_batch_summary(
                    &ctx.correlation_id,
                    entity,
                    family,
                    &result.summary,
                    status.code(),
                    elapsed_ms(started),
                );
                BulkResponse::from_batch(ctx, status, result)
            }
            Err(err) => {
                let response = BulkResponse::from_error(ctx, &err);
                log_batch_aborted(
                    &ctx.correlation_id,
                    entity,
                    family,
                    response.status_code(),
                    &err.to_string(),
                );
                response
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Request-level lookup of an entity that must exist before any element runs
fn require_found<T>(found: Option<T>, entity: EntityKind, id: &str) -> TaskListResult<T> {
    found.ok_or_else(|| TaskListError::NotFound(format!("{entity} not found: {id}")))
}
