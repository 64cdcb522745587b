//! List operation families.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{require_found, BulkMutationService, DeletedEntity, ListStatusOutcome};
use crate::bulk::context::RequestContext;
use crate::bulk::options::{CreateListsSettings, DeleteSettings, ListStatusSettings};
use crate::bulk::requests::{
    BulkCreateListsRequest, BulkDeleteRequest, BulkListStatusRequest, BulkMoveRequest,
    BulkUpdateListsRequest, UpdateEntry,
};
use crate::bulk::response::{BulkResponse, FailurePolicy};
use crate::bulk::types::{BatchElement, BatchResult};
use crate::constants::OperationFamily;
use crate::error::{ElementError, ElementResult, EntityKind, TaskListError, TaskListResult};
use crate::models::{List, ListPatch, NewList};
use crate::state_machine::{ItemStatus, ListArchiveGuard, ListStatus, StateGuard};
use crate::validation::{
    validate_batch_bounds, validate_ids, validate_list_patch, validate_new_list,
};

impl BulkMutationService {
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.lists.len()))]
    pub async fn create_lists(
        &self,
        ctx: &RequestContext,
        request: BulkCreateListsRequest,
    ) -> BulkResponse<List> {
        let started = Instant::now();
        let outcome = self.run_create_lists(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::List,
            OperationFamily::Create,
            FailurePolicy::PartialSuccess,
            started,
            outcome,
        )
    }

    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.updates.len()))]
    pub async fn update_lists(
        &self,
        ctx: &RequestContext,
        request: BulkUpdateListsRequest,
    ) -> BulkResponse<List> {
        let started = Instant::now();
        let outcome = self.run_update_lists(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::List,
            OperationFamily::Update,
            FailurePolicy::PartialSuccess,
            started,
            outcome,
        )
    }

    /// Change list status, optionally cascading to descendant lists and their items.
    ///
    /// Archiving a list with active children fails the batch with 400 unless
    /// `force` is set or the cascade covers the blockers.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.ids.len(), status = %request.status))]
    pub async fn update_list_status(
        &self,
        ctx: &RequestContext,
        request: BulkListStatusRequest,
    ) -> BulkResponse<ListStatusOutcome> {
        let started = Instant::now();
        let outcome = self.run_update_list_status(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::List,
            OperationFamily::Status,
            FailurePolicy::BusinessRuleFailsBatch,
            started,
            outcome,
        )
    }

    /// Re-parent lists under `targetListId`, or to the root when it is `null`.
    ///
    /// A move that would make a list its own ancestor fails the batch with 400.
    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.ids.len()))]
    pub async fn move_lists(
        &self,
        ctx: &RequestContext,
        request: BulkMoveRequest,
    ) -> BulkResponse<List> {
        let started = Instant::now();
        let outcome = self.run_move_lists(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::List,
            OperationFamily::Move,
            FailurePolicy::BusinessRuleFailsBatch,
            started,
            outcome,
        )
    }

    #[instrument(skip(self, ctx, request), fields(correlation_id = %ctx.correlation_id, count = request.ids.len()))]
    pub async fn delete_lists(
        &self,
        ctx: &RequestContext,
        request: BulkDeleteRequest,
    ) -> BulkResponse<DeletedEntity> {
        let started = Instant::now();
        let outcome = self.run_delete_lists(ctx, request).await;
        self.finish(
            ctx,
            EntityKind::List,
            OperationFamily::Delete,
            FailurePolicy::PartialSuccess,
            started,
            outcome,
        )
    }

    async fn run_create_lists(
        &self,
        ctx: &RequestContext,
        request: BulkCreateListsRequest,
    ) -> TaskListResult<BatchResult<List>> {
        validate_batch_bounds(
            EntityKind::List,
            request.lists.len(),
            self.config.limits.max_list_batch,
        )?;
        let mut settings = request
            .options
            .resolve(self.list_defaults(OperationFamily::Create))?;

        // a parent created earlier in the same batch must be stored before its children
        let nested = request.lists.iter().any(|list| {
            list.parent_list_id.as_ref().is_some_and(|parent| {
                request
                    .lists
                    .iter()
                    .any(|other| other.id.as_ref() == Some(parent))
            })
        });
        settings.process = settings.process.sequential(nested);

        self.processor
            .process(ctx, request.lists, settings.process, |element| {
                self.create_list(ctx, element, settings)
            })
            .await
    }

    async fn create_list(
        &self,
        ctx: &RequestContext,
        element: BatchElement<NewList>,
        settings: CreateListsSettings,
    ) -> ElementResult<List> {
        let new_list = element.input;
        validate_new_list(&new_list, &self.config.limits)?;

        let id = match &new_list.id {
            Some(id) => {
                if self.store.get_list(id).await?.is_some() {
                    return Err(ElementError::AlreadyExists {
                        entity: EntityKind::List,
                        id: id.clone(),
                    });
                }
                id.clone()
            }
            None => Uuid::new_v4().to_string(),
        };

        if let Some(parent_id) = &new_list.parent_list_id {
            if *parent_id == id {
                return Err(ElementError::CircularReference {
                    list_id: id,
                    parent_id: parent_id.clone(),
                });
            }
            if settings.validate_hierarchy && self.store.get_list(parent_id).await?.is_none() {
                return Err(ElementError::not_found(EntityKind::List, parent_id.clone()));
            }
        }

        let list = new_list.into_list(id, ctx.actor.clone(), Utc::now());
        let list = self.store.insert_list(list).await?;
        self.invalidate_list(&list.id).await;
        Ok(list)
    }

    async fn run_update_lists(
        &self,
        ctx: &RequestContext,
        request: BulkUpdateListsRequest,
    ) -> TaskListResult<BatchResult<List>> {
        validate_batch_bounds(
            EntityKind::List,
            request.updates.len(),
            self.config.limits.max_list_batch,
        )?;
        let ids: Vec<String> = request.updates.iter().map(|u| u.id.clone()).collect();
        validate_ids(&ids)?;

        let reparents = request.updates.iter().any(|u| u.data.changes_parent());
        let process = request
            .options
            .resolve(self.list_defaults(OperationFamily::Update))?
            .sequential(reparents);

        self.processor
            .process(ctx, request.updates, process, |element| {
                self.update_list(element.input)
            })
            .await
    }

    async fn update_list(&self, entry: UpdateEntry<ListPatch>) -> ElementResult<List> {
        let UpdateEntry { id, data: patch } = entry;
        validate_list_patch(&patch, &self.config.limits)?;
        let mut list = self.load_list(&id).await?;

        if let Some(parent) = &patch.parent_list_id {
            if let Some(parent_id) = parent {
                if self.store.get_list(parent_id).await?.is_none() {
                    return Err(ElementError::not_found(EntityKind::List, parent_id.clone()));
                }
            }
            self.hierarchy.validate_move(&id, parent.as_deref()).await?;
            list.parent_list_id = parent.clone();
        }

        let now = Utc::now();
        patch.apply_fields(&mut list, now);
        if let Some(status) = patch.status.filter(|status| *status != list.status) {
            ListArchiveGuard::new(&self.hierarchy)
                .check(&list, status)
                .await?;
            list.apply_status(status, now);
        }

        let list = self.store.update_list(list).await?;
        self.invalidate_list(&list.id).await;
        Ok(list)
    }

    async fn run_update_list_status(
        &self,
        ctx: &RequestContext,
        request: BulkListStatusRequest,
    ) -> TaskListResult<BatchResult<ListStatusOutcome>> {
        validate_batch_bounds(
            EntityKind::List,
            request.ids.len(),
            self.config.limits.max_list_batch,
        )?;
        validate_ids(&request.ids)?;
        let settings = request
            .options
            .resolve(self.list_defaults(OperationFamily::Status))?;
        let status = request.status;

        self.processor
            .process(ctx, request.ids, settings.process, |element| {
                self.change_list_status(element.input, status, settings)
            })
            .await
    }

    async fn change_list_status(
        &self,
        id: String,
        status: ListStatus,
        settings: ListStatusSettings,
    ) -> ElementResult<ListStatusOutcome> {
        let mut list = self.load_list(&id).await?;

        if settings.validate_hierarchy {
            ListArchiveGuard::new(&self.hierarchy)
                .force(settings.force)
                .cascading(settings.cascade, settings.cascade_to_items)
                .check(&list, status)
                .await?;
        }

        let descendants = if settings.cascade {
            self.hierarchy.descendants(&id).await?
        } else {
            Vec::new()
        };
        let mut affected_lists = vec![id.clone()];
        affected_lists.extend(descendants.iter().map(|d| d.id.clone()));

        // cascaded completion bypasses the dependency guard
        let item_status = status
            .cascaded_item_status()
            .filter(|_| settings.cascade_to_items);

        let now = Utc::now();
        let mut cascaded_lists = Vec::new();
        let mut cascaded_items = Vec::new();
        let applied = |lists: &[String], items: &[String]| {
            items.iter().chain(lists).cloned().collect::<Vec<_>>()
        };

        // items, then descendants deepest first, then the list itself
        if let Some(item_status) = item_status {
            for list_id in &affected_lists {
                if let Err(err) = self
                    .cascade_items(list_id, item_status, now, &mut cascaded_items)
                    .await
                {
                    return Err(
                        err.partially_applied(&id, applied(&cascaded_lists, &cascaded_items))
                    );
                }
            }
        }

        for mut descendant in descendants.into_iter().rev() {
            if descendant.status == status {
                continue;
            }
            descendant.apply_status(status, now);
            let descendant = match self.store.update_list(descendant).await {
                Ok(descendant) => descendant,
                Err(err) => {
                    return Err(ElementError::from(err)
                        .partially_applied(&id, applied(&cascaded_lists, &cascaded_items)))
                }
            };
            self.invalidate_list(&descendant.id).await;
            cascaded_lists.push(descendant.id);
        }

        list.apply_status(status, now);
        let list = self.store.update_list(list).await.map_err(|err| {
            ElementError::from(err)
                .partially_applied(&id, applied(&cascaded_lists, &cascaded_items))
        })?;
        self.invalidate_list(&list.id).await;

        let outcome = ListStatusOutcome {
            list,
            cascaded_lists,
            cascaded_items,
        };

        debug!(
            list_id = %id,
            status = %status,
            cascaded_lists = outcome.cascaded_lists.len(),
            cascaded_items = outcome.cascaded_items.len(),
            "List status changed"
        );
        Ok(outcome)
    }

    async fn run_move_lists(
        &self,
        ctx: &RequestContext,
        request: BulkMoveRequest,
    ) -> TaskListResult<BatchResult<List>> {
        validate_batch_bounds(
            EntityKind::List,
            request.ids.len(),
            self.config.limits.max_list_batch,
        )?;
        validate_ids(&request.ids)?;
        // positions only apply to items, so list moves never need to serialize
        let process = request
            .options
            .resolve(self.list_defaults(OperationFamily::Move))?
            .process
            .sequential(false);

        // an absent key is an error; only an explicit null means the root
        let target_list_id = request.target_list_id.ok_or_else(|| {
            TaskListError::ValidationError(
                "targetListId is required when moving lists; use null to move to the root"
                    .to_string(),
            )
        })?;
        let target = match target_list_id.as_deref() {
            Some(target_id) => Some(
                require_found(
                    self.store.get_list(target_id).await?,
                    EntityKind::List,
                    target_id,
                )?
                .id,
            ),
            None => None,
        };

        self.processor
            .process(ctx, request.ids, process, |element| {
                self.move_list(element.input, target.as_deref())
            })
            .await
    }

    async fn move_list(&self, id: String, parent_id: Option<&str>) -> ElementResult<List> {
        let mut list = self.load_list(&id).await?;
        self.hierarchy.validate_move(&id, parent_id).await?;

        list.parent_list_id = parent_id.map(str::to_string);
        list.updated_at = Utc::now();
        let list = self.store.update_list(list).await?;
        self.invalidate_list(&list.id).await;
        Ok(list)
    }

    async fn run_delete_lists(
        &self,
        ctx: &RequestContext,
        request: BulkDeleteRequest,
    ) -> TaskListResult<BatchResult<DeletedEntity>> {
        validate_batch_bounds(
            EntityKind::List,
            request.ids.len(),
            self.config.limits.max_list_batch,
        )?;
        validate_ids(&request.ids)?;
        let settings = request
            .options
            .resolve(self.list_defaults(OperationFamily::Delete))?;

        self.processor
            .process(ctx, request.ids, settings.process, |element| {
                self.delete_list(element.input, settings)
            })
            .await
    }

    async fn delete_list(&self, id: String, settings: DeleteSettings) -> ElementResult<DeletedEntity> {
        let list = self.load_list(&id).await?;

        let descendants = self.hierarchy.descendants(&id).await?;
        if !descendants.is_empty() && !settings.force {
            let count = descendants
                .iter()
                .filter(|d| d.parent_list_id.as_deref() == Some(list.id.as_str()))
                .count();
            return Err(ElementError::HasChildLists { list_id: id, count });
        }

        let remove_items = settings.force || settings.delete_items;
        if !remove_items {
            let count = self.store.count_items_in_list(&id).await?;
            if count > 0 {
                return Err(ElementError::HasItems { list_id: id, count });
            }
        }

        let mut outcome = DeletedEntity::new(&id);
        // children before parents, the list itself last
        for descendant in descendants.iter().rev() {
            if let Err(err) = self.remove_list(&descendant.id, &mut outcome).await {
                return Err(err.partially_applied(&id, outcome.removed_ids()));
            }
            outcome.removed_lists.push(descendant.id.clone());
        }
        if let Err(err) = self.remove_list(&id, &mut outcome).await {
            return Err(err.partially_applied(&id, outcome.removed_ids()));
        }
        Ok(outcome)
    }

    /// Move the items of `list_id` to `status`, recording each one written
    async fn cascade_items(
        &self,
        list_id: &str,
        status: ItemStatus,
        now: DateTime<Utc>,
        cascaded: &mut Vec<String>,
    ) -> ElementResult<()> {
        for mut item in self.store.items_in_list(list_id).await? {
            if item.status == status {
                continue;
            }
            item.apply_status(status, now, true);
            let item = self.store.update_item(item).await?;
            self.invalidate_item(&item).await;
            cascaded.push(item.id);
        }
        Ok(())
    }

    /// Delete a list together with its items
    async fn remove_list(&self, list_id: &str, outcome: &mut DeletedEntity) -> ElementResult<()> {
        for item in self.store.items_in_list(list_id).await? {
            if self.store.delete_item(&item.id).await? {
                self.invalidate_item(&item).await;
                outcome.removed_items.push(item.id);
            }
        }
        if !self.store.delete_list(list_id).await? {
            return Err(ElementError::not_found(EntityKind::List, list_id));
        }
        self.invalidate_list(list_id).await;
        Ok(())
    }

    async fn load_list(&self, id: &str) -> ElementResult<List> {
        self.store
            .get_list(id)
            .await?
            .ok_or_else(|| ElementError::not_found(EntityKind::List, id))
    }
}
