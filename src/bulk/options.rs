//! Option structs per operation family.
//!
//! Callers send optional fields; each struct is resolved exactly once against
//! the configured defaults at the service boundary, producing the settings the
//! operation actually runs with.
//!
//! | Family | Defaults |
//! |---|---|
//! | create items | `continueOnError=false`, `batchSize=items.create_batch_size` |
//! | create lists | `continueOnError=true`, `batchSize=lists.create_batch_size`, `validateHierarchy=true` |
//! | update | `continueOnError=true`, family batch size |
//! | item status | `validateDependencies=true`, `updateTimestamps=true` |
//! | list status | `validateHierarchy=true`, no cascade, no force |
//! | move | `preservePosition=false` |
//! | delete | `force=false`, `deleteItems=false` |

use serde::{Deserialize, Serialize};

use super::batch_processor::ProcessOptions;
use crate::error::TaskListResult;
use crate::validation::validate_batch_size;

/// Defaults for one entity/family pair, taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyDefaults {
    pub operation: &'static str,
    pub batch_size: usize,
    pub max_batch_size: usize,
    pub continue_on_error: bool,
}

fn resolve_process(
    defaults: FamilyDefaults,
    continue_on_error: Option<bool>,
    batch_size: Option<usize>,
) -> TaskListResult<ProcessOptions> {
    let batch_size = batch_size.unwrap_or(defaults.batch_size);
    validate_batch_size(batch_size, defaults.max_batch_size)?;
    Ok(ProcessOptions::new(
        defaults.operation,
        continue_on_error.unwrap_or(defaults.continue_on_error),
        batch_size,
    ))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemsOptions {
    pub continue_on_error: Option<bool>,
    pub batch_size: Option<usize>,
}

impl CreateItemsOptions {
    pub fn resolve(&self, defaults: FamilyDefaults) -> TaskListResult<ProcessOptions> {
        resolve_process(defaults, self.continue_on_error, self.batch_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListsOptions {
    pub continue_on_error: Option<bool>,
    pub batch_size: Option<usize>,
    pub validate_hierarchy: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateListsSettings {
    pub process: ProcessOptions,
    pub validate_hierarchy: bool,
}

impl CreateListsOptions {
    pub fn resolve(&self, defaults: FamilyDefaults) -> TaskListResult<CreateListsSettings> {
        Ok(CreateListsSettings {
            process: resolve_process(defaults, self.continue_on_error, self.batch_size)?,
            validate_hierarchy: self.validate_hierarchy.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptions {
    pub continue_on_error: Option<bool>,
    pub batch_size: Option<usize>,
}

impl UpdateOptions {
    pub fn resolve(&self, defaults: FamilyDefaults) -> TaskListResult<ProcessOptions> {
        resolve_process(defaults, self.continue_on_error, self.batch_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatusOptions {
    pub continue_on_error: Option<bool>,
    pub batch_size: Option<usize>,
    pub validate_dependencies: Option<bool>,
    pub update_timestamps: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStatusSettings {
    pub process: ProcessOptions,
    pub validate_dependencies: bool,
    pub update_timestamps: bool,
}

impl ItemStatusOptions {
    pub fn resolve(&self, defaults: FamilyDefaults) -> TaskListResult<ItemStatusSettings> {
        Ok(ItemStatusSettings {
            process: resolve_process(defaults, self.continue_on_error, self.batch_size)?,
            validate_dependencies: self.validate_dependencies.unwrap_or(true),
            update_timestamps: self.update_timestamps.unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStatusOptions {
    pub continue_on_error: Option<bool>,
    pub batch_size: Option<usize>,
    pub validate_hierarchy: Option<bool>,
    /// Apply the status to every descendant list
    pub cascade: Option<bool>,
    /// Also complete the items of the list and its descendants; implies `cascade`
    pub cascade_to_items: Option<bool>,
    pub force: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStatusSettings {
    pub process: ProcessOptions,
    pub validate_hierarchy: bool,
    pub cascade: bool,
    pub cascade_to_items: bool,
    pub force: bool,
}

impl ListStatusOptions {
    pub fn resolve(&self, defaults: FamilyDefaults) -> TaskListResult<ListStatusSettings> {
        let cascade_to_items = self.cascade_to_items.unwrap_or(false);
        Ok(ListStatusSettings {
            // cascades touch shared descendants, so elements never overlap
            process: resolve_process(defaults, self.continue_on_error, self.batch_size)?
                .sequential(cascade_to_items || self.cascade.unwrap_or(false)),
            validate_hierarchy: self.validate_hierarchy.unwrap_or(true),
            cascade: cascade_to_items || self.cascade.unwrap_or(false),
            cascade_to_items,
            force: self.force.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOptions {
    pub continue_on_error: Option<bool>,
    pub batch_size: Option<usize>,
    /// Keep the item's position instead of appending it to the target list
    pub preserve_position: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSettings {
    pub process: ProcessOptions,
    pub preserve_position: bool,
}

impl MoveOptions {
    pub fn resolve(&self, defaults: FamilyDefaults) -> TaskListResult<MoveSettings> {
        let preserve_position = self.preserve_position.unwrap_or(false);
        Ok(MoveSettings {
            // appended positions are read from the target's item count
            process: resolve_process(defaults, self.continue_on_error, self.batch_size)?
                .sequential(!preserve_position),
            preserve_position,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    pub continue_on_error: Option<bool>,
    pub batch_size: Option<usize>,
    pub force: Option<bool>,
    /// Delete a list's items along with it
    pub delete_items: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSettings {
    pub process: ProcessOptions,
    pub force: bool,
    pub delete_items: bool,
}

impl DeleteOptions {
    pub fn resolve(&self, defaults: FamilyDefaults) -> TaskListResult<DeleteSettings> {
        Ok(DeleteSettings {
            process: resolve_process(defaults, self.continue_on_error, self.batch_size)?,
            force: self.force.unwrap_or(false),
            delete_items: self.delete_items.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskListError;

    fn defaults(continue_on_error: bool) -> FamilyDefaults {
        FamilyDefaults {
            operation: "test",
            batch_size: 25,
            max_batch_size: 50,
            continue_on_error,
        }
    }

    #[test]
    fn test_defaults_applied() {
        let process = CreateItemsOptions::default().resolve(defaults(false)).unwrap();
        assert!(!process.continue_on_error);
        assert_eq!(process.batch_size, 25);

        let status = ItemStatusOptions::default().resolve(defaults(true)).unwrap();
        assert!(status.validate_dependencies);
        assert!(status.update_timestamps);

        let lists = CreateListsOptions::default().resolve(defaults(true)).unwrap();
        assert!(lists.validate_hierarchy);
    }

    #[test]
    fn test_batch_size_bounds() {
        let options = DeleteOptions {
            batch_size: Some(0),
            ..DeleteOptions::default()
        };
        assert!(matches!(
            options.resolve(defaults(true)),
            Err(TaskListError::ValidationError(_))
        ));

        let options = UpdateOptions {
            batch_size: Some(51),
            ..UpdateOptions::default()
        };
        assert!(options.resolve(defaults(true)).is_err());
    }

    #[test]
    fn test_cascade_to_items_implies_cascade() {
        let settings = ListStatusOptions {
            cascade_to_items: Some(true),
            ..ListStatusOptions::default()
        }
        .resolve(defaults(true))
        .unwrap();
        assert!(settings.cascade);
        assert!(settings.process.sequential);
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: DeleteOptions =
            serde_json::from_str(r#"{"force": true, "deleteItems": true, "batchSize": 10}"#)
                .unwrap();
        assert_eq!(options.force, Some(true));
        assert_eq!(options.delete_items, Some(true));
        assert_eq!(options.batch_size, Some(10));
    }
}
