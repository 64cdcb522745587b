//! Request shapes accepted by [`BulkMutationService`](super::BulkMutationService).

use serde::{Deserialize, Serialize};

use super::options::{
    CreateItemsOptions, CreateListsOptions, DeleteOptions, ItemStatusOptions, ListStatusOptions,
    MoveOptions, UpdateOptions,
};
use super::types::ElementIdentity;
use crate::models::{ItemPatch, ListPatch, NewItem, NewList};
use crate::state_machine::{ItemStatus, ListStatus};
use crate::utils::serde::deserialize_nullable_field;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateItemsRequest {
    pub items: Vec<NewItem>,
    #[serde(default)]
    pub options: CreateItemsOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateListsRequest {
    pub lists: Vec<NewList>,
    #[serde(default)]
    pub options: CreateListsOptions,
}

/// One element of an update batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntry<P> {
    pub id: String,
    pub data: P,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateRequest<P> {
    pub updates: Vec<UpdateEntry<P>>,
    #[serde(default)]
    pub options: UpdateOptions,
}

pub type BulkUpdateItemsRequest = BulkUpdateRequest<ItemPatch>;
pub type BulkUpdateListsRequest = BulkUpdateRequest<ListPatch>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemStatusRequest {
    pub ids: Vec<String>,
    pub status: ItemStatus,
    #[serde(default)]
    pub options: ItemStatusOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkListStatusRequest {
    pub ids: Vec<String>,
    pub status: ListStatus,
    #[serde(default)]
    pub options: ListStatusOptions,
}

/// Move items into a list, or re-parent lists.
///
/// `targetListId` must always be present. For items it names the destination
/// list. For lists it names the new parent, and an explicit `null` moves the
/// lists to the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMoveRequest {
    pub ids: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_list_id: Option<Option<String>>,
    #[serde(default)]
    pub options: MoveOptions,
}

impl BulkMoveRequest {
    /// Move `ids` under `target_list_id`
    pub fn to_list(ids: Vec<String>, target_list_id: impl Into<String>) -> Self {
        Self {
            ids,
            target_list_id: Some(Some(target_list_id.into())),
            options: MoveOptions::default(),
        }
    }

    /// Move lists to the root
    pub fn to_root(ids: Vec<String>) -> Self {
        Self {
            ids,
            target_list_id: Some(None),
            options: MoveOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
    #[serde(default)]
    pub options: DeleteOptions,
}

impl ElementIdentity for NewItem {
    fn element_id(&self) -> Option<String> {
        self.id.clone()
    }
}

impl ElementIdentity for NewList {
    fn element_id(&self) -> Option<String> {
        self.id.clone()
    }
}

impl<P> ElementIdentity for UpdateEntry<P> {
    fn element_id(&self) -> Option<String> {
        Some(self.id.clone())
    }
}
