//! Request and payload validation.
//!
//! Two layers run before anything is written:
//! - request bounds ([`validate_batch_bounds`], [`validate_batch_size`]) reject a
//!   whole request before any store call
//! - payload checks (`validate_new_*`, `validate_*_patch`) fail a single element
//!
//! Structural checks against stored data live in [`DependencyGraphValidator`]
//! and [`HierarchyValidator`]. Validators never mutate state.

pub mod dependency_graph;
pub mod hierarchy;

pub use dependency_graph::DependencyGraphValidator;
pub use hierarchy::{ArchiveBlockers, HierarchyValidator};

use crate::config::LimitsConfig;
use crate::error::{ElementError, ElementResult, EntityKind, TaskListError, TaskListResult};
use crate::models::{ItemPatch, ListPatch, NewItem, NewList};

/// Reject empty or oversized batches
pub fn validate_batch_bounds(entity: EntityKind, len: usize, max: usize) -> TaskListResult<()> {
    if len == 0 || len > max {
        return Err(TaskListError::ValidationError(format!(
            "{entity} batch must contain between 1 and {max} elements, got {len}"
        )));
    }
    Ok(())
}

/// Reject a caller-supplied chunk size outside `1..=max`
pub fn validate_batch_size(batch_size: usize, max: usize) -> TaskListResult<()> {
    if batch_size == 0 || batch_size > max {
        return Err(TaskListError::ValidationError(format!(
            "batchSize must be between 1 and {max}, got {batch_size}"
        )));
    }
    Ok(())
}

/// Reject blank or empty id lists entries
pub fn validate_ids(ids: &[String]) -> TaskListResult<()> {
    if let Some(position) = ids.iter().position(|id| id.trim().is_empty()) {
        return Err(TaskListError::ValidationError(format!(
            "ids[{position}] must not be empty"
        )));
    }
    Ok(())
}

pub fn validate_title(title: &str, max_length: usize) -> ElementResult<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ElementError::invalid_field("title", "must not be empty"));
    }
    if trimmed.chars().count() > max_length {
        return Err(ElementError::invalid_field(
            "title",
            format!("must be at most {max_length} characters"),
        ));
    }
    Ok(())
}

pub fn validate_description(description: Option<&str>, max_length: usize) -> ElementResult<()> {
    match description {
        Some(text) if text.chars().count() > max_length => Err(ElementError::invalid_field(
            "description",
            format!("must be at most {max_length} characters"),
        )),
        _ => Ok(()),
    }
}

fn validate_optional_id(field: &str, id: Option<&str>) -> ElementResult<()> {
    match id {
        Some(value) if value.trim().is_empty() => {
            Err(ElementError::invalid_field(field, "must not be empty"))
        }
        _ => Ok(()),
    }
}

pub fn validate_new_item(item: &NewItem, limits: &LimitsConfig) -> ElementResult<()> {
    validate_optional_id("id", item.id.as_deref())?;
    if item.list_id.trim().is_empty() {
        return Err(ElementError::invalid_field("listId", "must not be empty"));
    }
    validate_title(&item.title, limits.max_title_length)?;
    validate_description(item.description.as_deref(), limits.max_description_length)?;
    if item.dependencies.iter().any(|dep| dep.trim().is_empty()) {
        return Err(ElementError::invalid_field(
            "dependencies",
            "must not contain empty ids",
        ));
    }
    Ok(())
}

pub fn validate_new_list(list: &NewList, limits: &LimitsConfig) -> ElementResult<()> {
    validate_optional_id("id", list.id.as_deref())?;
    validate_optional_id("parentListId", list.parent_list_id.as_deref())?;
    validate_title(&list.title, limits.max_title_length)?;
    validate_description(list.description.as_deref(), limits.max_description_length)
}

pub fn validate_item_patch(patch: &ItemPatch, limits: &LimitsConfig) -> ElementResult<()> {
    if patch.is_empty() {
        return Err(ElementError::invalid_field("data", "no fields to update"));
    }
    if let Some(title) = &patch.title {
        validate_title(title, limits.max_title_length)?;
    }
    validate_description(patch.description.as_deref(), limits.max_description_length)?;
    if let Some(dependencies) = &patch.dependencies {
        if dependencies.iter().any(|dep| dep.trim().is_empty()) {
            return Err(ElementError::invalid_field(
                "dependencies",
                "must not contain empty ids",
            ));
        }
    }
    Ok(())
}

pub fn validate_list_patch(patch: &ListPatch, limits: &LimitsConfig) -> ElementResult<()> {
    if patch.is_empty() {
        return Err(ElementError::invalid_field("data", "no fields to update"));
    }
    if let Some(title) = &patch.title {
        validate_title(title, limits.max_title_length)?;
    }
    if let Some(Some(parent)) = &patch.parent_list_id {
        validate_optional_id("parentListId", Some(parent))?;
    }
    validate_description(patch.description.as_deref(), limits.max_description_length)
}
