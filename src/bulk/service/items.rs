//! Item operation families.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use super::{require_found, BulkMutationService, DeletedEntity};
use crate::bulk::context::RequestContext;
use crate::bulk::options::ItemStatusSettings;
use crate::bulk::requests::{
    BulkCreateItemsRequest, BulkDeleteRequest, BulkItemStatusRequest, BulkMoveRequest,
    BulkUpdateItemsRequest, UpdateEntry,
};
use crate::bulk::response::{BulkResponse, FailurePolicy};
use crate::bulk::types::{BatchElement, BatchResult};
use crate::constants::OperationFamily;
use crate::error::{ElementError, ElementResult, EntityKind, TaskListError, TaskListResult};
use crate::models::{Item, ItemPatch, NewItem};
use crate::state_machine::{ItemDependenciesGuard, ItemStatus, StateGuard};
use crate::store::cache::list_items_pattern;
use crate::validation::{
    validate_batch_bounds, validate_ids, validate_item_patch, validate_new_item,
};

impl BulkMutationService {
    /// Create items.
    ///
    /// Stops at the first failing element unless `continueOnError` is set.
    /// Dependencies must already exist; referencing another element of the same
    /// batch is rejected.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.items.len()))]
    pub async fn create_items(
        &self,
        ctx: &RequestContext,
        request: BulkCreateItemsRequest,
    ) -> BulkResponse<Item> {
        let started = Instant::now();
        let outcome = self.run_create_items(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::Item,
            OperationFamily::Create,
            FailurePolicy::PartialSuccess,
            started,
            outcome,
        )
    }

    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.updates.len()))]
    pub async fn update_items(
        &self,
        ctx: &RequestContext,
        request: BulkUpdateItemsRequest,
    ) -> BulkResponse<Item> {
        let started = Instant::now();
        let outcome = self.run_update_items(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::Item,
            OperationFamily::Update,
            FailurePolicy::PartialSuccess,
            started,
            outcome,
        )
    }

    /// Change item status.
    ///
    /// Moving to `in_progress` or `completed` requires every dependency to be
    /// completed; any such violation fails the batch with 400.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.ids.len(), status = %request.status))]
    pub async fn update_item_status(
        &self,
        ctx: &RequestContext,
        request: BulkItemStatusRequest,
    ) -> BulkResponse<Item> {
        let started = Instant::now();
        let outcome = self.run_update_item_status(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::Item,
            OperationFamily::Status,
            FailurePolicy::BusinessRuleFailsBatch,
            started,
            outcome,
        )
    }

    /// Move items into `targetListId`; a missing target list fails the request with 404
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.ids.len()))]
    pub async fn move_items(
        &self,
        ctx: &RequestContext,
        request: BulkMoveRequest,
    ) -> BulkResponse<Item> {
        let started = Instant::now();
        let outcome = self.run_move_items(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::Item,
            OperationFamily::Move,
            FailurePolicy::PartialSuccess,
            started,
            outcome,
        )
    }

    /// Delete items. Items other items depend on are kept unless `force` is set,
    /// in which case the dependency is dropped from every dependent.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.ids.len()))]
    pub async fn delete_items(
        &self,
        ctx: &RequestContext,
        request: BulkDeleteRequest,
    ) -> BulkResponse<DeletedEntity> {
        let started = Instant::now();
        let outcome = self.run_delete_items(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::Item,
            OperationFamily::Delete,
            FailurePolicy::PartialSuccess,
            started,
            outcome,
        )
    }

    async fn run_create_items(
        &self,
        ctx: &RequestContext,
        request: BulkCreateItemsRequest,
    ) -> TaskListResult<BatchResult<Item>> {
        validate_batch_bounds(
            EntityKind::Item,
            request.items.len(),
            self.config.limits.max_item_batch,
        )?;
        let process = request
            .options
            .resolve(self.item_defaults(OperationFamily::Create))?;

        let same_batch: HashSet<String> = request
            .items
            .iter()
            .filter_map(|item| item.id.clone())
            .collect();

        self.processor
            .process(ctx, request.items, process, |element| {
                self.create_item(ctx, element, &same_batch)
            })
            .await
    }

    async fn create_item(
        &self,
        ctx: &RequestContext,
        element: BatchElement<NewItem>,
        same_batch: &HashSet<String>,
    ) -> ElementResult<Item> {
        let new_item = element.input;
        validate_new_item(&new_item, &self.config.limits)?;

        if self.store.get_list(&new_item.list_id).await?.is_none() {
            return Err(ElementError::not_found(
                EntityKind::List,
                new_item.list_id.clone(),
            ));
        }

        let id = match &new_item.id {
            Some(id) => {
                if self.store.get_item(id).await?.is_some() {
                    return Err(ElementError::AlreadyExists {
                        entity: EntityKind::Item,
                        id: id.clone(),
                    });
                }
                id.clone()
            }
            None => Uuid::new_v4().to_string(),
        };

        self.dependencies
            .validate_acyclic(&id, &new_item.dependencies)
            .await?;
        self.dependencies
            .validate_dependencies_exist(Some(&id), &new_item.dependencies, same_batch)
            .await?;

        let position = self.append_position(&new_item.list_id).await?;
        let item = new_item.into_item(id, ctx.actor.clone(), position, Utc::now());
        ItemDependenciesGuard::new(&self.dependencies)
            .check(&item, item.status)
            .await?;

        let item = self.store.insert_item(item).await?;
        self.invalidate_item(&item).await;
        Ok(item)
    }

    async fn run_update_items(
        &self,
        ctx: &RequestContext,
        request: BulkUpdateItemsRequest,
    ) -> TaskListResult<BatchResult<Item>> {
        validate_batch_bounds(
            EntityKind::Item,
            request.updates.len(),
            self.config.limits.max_item_batch,
        )?;
        let ids: Vec<String> = request.updates.iter().map(|u| u.id.clone()).collect();
        validate_ids(&ids)?;

        // two elements of one batch must not jointly close a dependency cycle
        let rewires = request.updates.iter().any(|u| u.data.changes_dependencies());
        let process = request
            .options
            .resolve(self.item_defaults(OperationFamily::Update))?
            .sequential(rewires);

        self.processor
            .process(ctx, request.updates, process, |element| {
                self.update_item(element.input)
            })
            .await
    }

    async fn update_item(&self, entry: UpdateEntry<ItemPatch>) -> ElementResult<Item> {
        let UpdateEntry { id, data: patch } = entry;
        validate_item_patch(&patch, &self.config.limits)?;
        let mut item = self.load_item(&id).await?;

        if let Some(dependencies) = &patch.dependencies {
            self.dependencies.validate_acyclic(&id, dependencies).await?;
            let added: BTreeSet<String> = dependencies
                .difference(&item.dependencies)
                .cloned()
                .collect();
            self.dependencies
                .validate_dependencies_exist(Some(&id), &added, &HashSet::new())
                .await?;
        }

        let now = Utc::now();
        patch.apply_fields(&mut item, now);
        if let Some(status) = patch.status.filter(|status| *status != item.status) {
            ItemDependenciesGuard::new(&self.dependencies)
                .check(&item, status)
                .await?;
            item.apply_status(status, now, true);
        }

        let item = self.store.update_item(item).await?;
        self.invalidate_item(&item).await;
        Ok(item)
    }

    async fn run_update_item_status(
        &self,
        ctx: &RequestContext,
        request: BulkItemStatusRequest,
    ) -> TaskListResult<BatchResult<Item>> {
        validate_batch_bounds(
            EntityKind::Item,
            request.ids.len(),
            self.config.limits.max_item_batch,
        )?;
        validate_ids(&request.ids)?;
        let settings = request
            .options
            .resolve(self.item_defaults(OperationFamily::Status))?;
        let status = request.status;

        self.processor
            .process(ctx, request.ids, settings.process, |element| {
                self.change_item_status(element.input, status, settings)
            })
            .await
    }

    async fn change_item_status(
        &self,
        id: String,
        status: ItemStatus,
        settings: ItemStatusSettings,
    ) -> ElementResult<Item> {
        let mut item = self.load_item(&id).await?;

        if settings.validate_dependencies && item.status != status {
            ItemDependenciesGuard::new(&self.dependencies)
                .check(&item, status)
                .await?;
        }

        item.apply_status(status, Utc::now(), settings.update_timestamps);
        let item = self.store.update_item(item).await?;
        self.invalidate_item(&item).await;
        Ok(item)
    }

    async fn run_move_items(
        &self,
        ctx: &RequestContext,
        request: BulkMoveRequest,
    ) -> TaskListResult<BatchResult<Item>> {
        validate_batch_bounds(
            EntityKind::Item,
            request.ids.len(),
            self.config.limits.max_item_batch,
        )?;
        validate_ids(&request.ids)?;
        let target_id = request
            .target_list_id
            .as_ref()
            .and_then(|target| target.as_deref())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                TaskListError::ValidationError(
                    "targetListId is required when moving items".to_string(),
                )
            })?;
        let settings = request
            .options
            .resolve(self.item_defaults(OperationFamily::Move))?;

        let target = require_found(
            self.store.get_list(target_id).await?,
            EntityKind::List,
            target_id,
        )?;

        self.processor
            .process(ctx, request.ids, settings.process, |element| {
                self.move_item(element.input, &target.id, settings.preserve_position)
            })
            .await
    }

    async fn move_item(
        &self,
        id: String,
        target_list_id: &str,
        preserve_position: bool,
    ) -> ElementResult<Item> {
        let mut item = self.load_item(&id).await?;
        if item.list_id == target_list_id {
            return Ok(item);
        }

        if !preserve_position {
            item.position = self.append_position(target_list_id).await?;
        }
        let source_list_id = std::mem::replace(&mut item.list_id, target_list_id.to_string());
        item.updated_at = Utc::now();

        let item = self.store.update_item(item).await?;
        self.invalidate_item(&item).await;
        self.cache
            .invalidate_pattern(&list_items_pattern(&source_list_id))
            .await;
        Ok(item)
    }

    async fn run_delete_items(
        &self,
        ctx: &RequestContext,
        request: BulkDeleteRequest,
    ) -> TaskListResult<BatchResult<DeletedEntity>> {
        validate_batch_bounds(
            EntityKind::Item,
            request.ids.len(),
            self.config.limits.max_item_batch,
        )?;
        validate_ids(&request.ids)?;
        let settings = request
            .options
            .resolve(self.item_defaults(OperationFamily::Delete))?;

        // dependents deleted by the same request do not block
        let requested: HashSet<String> = request.ids.iter().cloned().collect();

        self.processor
            .process(ctx, request.ids, settings.process, |element| {
                self.delete_item(element.input, settings.force, &requested)
            })
            .await
    }

    async fn delete_item(
        &self,
        id: String,
        force: bool,
        requested: &HashSet<String>,
    ) -> ElementResult<DeletedEntity> {
        let item = self.load_item(&id).await?;
        let dependents: Vec<Item> = self
            .store
            .dependents_of(&id)
            .await?
            .into_iter()
            .filter(|dependent| !requested.contains(&dependent.id))
            .collect();

        if !dependents.is_empty() && !force {
            return Err(ElementError::HasDependents {
                item_id: id,
                dependents: dependents.into_iter().map(|d| d.id).collect(),
            });
        }

        // dependents first so a deleted item is never referenced
        let mut outcome = DeletedEntity::new(&id);
        for mut dependent in dependents {
            dependent.dependencies.remove(&id);
            dependent.updated_at = Utc::now();
            let dependent = match self.store.update_item(dependent).await {
                Ok(dependent) => dependent,
                Err(err) => {
                    return Err(ElementError::from(err)
                        .partially_applied(&id, outcome.updated_dependents))
                }
            };
            self.invalidate_item(&dependent).await;
            outcome.updated_dependents.push(dependent.id);
        }

        match self.store.delete_item(&id).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(ElementError::not_found(EntityKind::Item, &id)
                    .partially_applied(&id, outcome.updated_dependents))
            }
            Err(err) => {
                return Err(
                    ElementError::from(err).partially_applied(&id, outcome.updated_dependents)
                )
            }
        }
        self.invalidate_item(&item).await;
        Ok(outcome)
    }

    async fn load_item(&self, id: &str) -> ElementResult<Item> {
        self.store
            .get_item(id)
            .await?
            .ok_or_else(|| ElementError::not_found(EntityKind::Item, id))
    }

    /// Position after the last item of `list_id`
    async fn append_position(&self, list_id: &str) -> ElementResult<i64> {
        let count = self.store.count_items_in_list(list_id).await?;
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}
