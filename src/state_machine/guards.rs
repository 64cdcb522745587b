use async_trait::async_trait;

use super::states::{ItemStatus, ListStatus};
use crate::error::{ElementError, ElementResult};
use crate::models::{Item, List};
use crate::validation::{DependencyGraphValidator, HierarchyValidator};

/// Trait for implementing state transition guards
#[async_trait]
pub trait StateGuard<T: Sync, S: Send + 'static>: Send + Sync {
    /// Check if moving `entity` into `target` is allowed
    async fn check(&self, entity: &T, target: S) -> ElementResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Guard to check that every dependency is completed before an item starts or completes
pub struct ItemDependenciesGuard<'a> {
    validator: &'a DependencyGraphValidator,
}

impl<'a> ItemDependenciesGuard<'a> {
    pub fn new(validator: &'a DependencyGraphValidator) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl StateGuard<Item, ItemStatus> for ItemDependenciesGuard<'_> {
    async fn check(&self, item: &Item, target: ItemStatus) -> ElementResult<()> {
        if !target.requires_dependencies() || item.dependencies.is_empty() {
            return Ok(());
        }

        let incomplete = self
            .validator
            .incomplete_dependencies(&item.dependencies)
            .await?;
        if incomplete.is_empty() {
            return Ok(());
        }

        Err(ElementError::dependencies_incomplete(
            item.id.clone(),
            target,
            incomplete,
        ))
    }

    fn description(&self) -> &'static str {
        "All item dependencies must be completed"
    }
}

/// Guard to check that a list has no active children before it is archived
///
/// Children that the same request is about to archive (`cascade`) and items it
/// is about to complete (`cascade_to_items`) do not block.
pub struct ListArchiveGuard<'a> {
    validator: &'a HierarchyValidator,
    force: bool,
    cascade: bool,
    cascade_to_items: bool,
}

impl<'a> ListArchiveGuard<'a> {
    pub fn new(validator: &'a HierarchyValidator) -> Self {
        Self {
            validator,
            force: false,
            cascade: false,
            cascade_to_items: false,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn cascading(mut self, cascade: bool, cascade_to_items: bool) -> Self {
        self.cascade = cascade;
        self.cascade_to_items = cascade_to_items;
        self
    }
}

#[async_trait]
impl StateGuard<List, ListStatus> for ListArchiveGuard<'_> {
    async fn check(&self, list: &List, target: ListStatus) -> ElementResult<()> {
        if target != ListStatus::Archived || self.force {
            return Ok(());
        }

        let mut blockers = self.validator.archive_blockers(&list.id).await?;
        if self.cascade {
            blockers.active_lists.clear();
        }
        if self.cascade_to_items {
            blockers.open_items.clear();
        }
        if blockers.is_empty() {
            return Ok(());
        }

        Err(ElementError::ActiveChildren {
            list_id: list.id.clone(),
            active_lists: blockers.active_lists,
            open_items: blockers.open_items,
        })
    }

    fn description(&self) -> &'static str {
        "Archived lists must not have active children"
    }
}
