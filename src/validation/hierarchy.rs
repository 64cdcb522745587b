//! # Hierarchy Validator
//!
//! Lists form a forest through `parent_list_id`. Cycle detection for moves and
//! breadcrumb ancestry share one ancestor walk ([`HierarchyValidator::walk_up`])
//! so both always agree on what a list's ancestors are.
//!
//! The walk is bounded by a visited set and a maximum depth. Stored data that
//! already loops is reported as a circular reference rather than walked forever.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use tracing::warn;

use crate::constants::limits::MAX_HIERARCHY_DEPTH;
use crate::error::{ElementError, ElementResult, EntityKind};
use crate::models::List;
use crate::store::EntityStore;

/// What stands in the way of archiving a list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveBlockers {
    /// Descendant lists still `active`
    pub active_lists: Vec<String>,
    /// Items owned by the list that are not completed
    pub open_items: Vec<String>,
}

impl ArchiveBlockers {
    pub fn is_empty(&self) -> bool {
        self.active_lists.is_empty() && self.open_items.is_empty()
    }
}

#[derive(Clone)]
pub struct HierarchyValidator {
    store: Arc<dyn EntityStore>,
    max_depth: usize,
}

impl std::fmt::Debug for HierarchyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyValidator")
            .field("store", &self.store.store_name())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl HierarchyValidator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            max_depth: MAX_HIERARCHY_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Walk from `start_id` up through its ancestors, `start_id` first.
    ///
    /// Stops after reaching `stop_at` (included), a root, or a parent that no
    /// longer exists. Fails with [`ElementError::NotFound`] when `start_id` does
    /// not exist, and with [`ElementError::CircularReference`] when the stored
    /// chain repeats a list or exceeds the maximum depth.
    async fn walk_up(&self, start_id: &str, stop_at: Option<&str>) -> ElementResult<Vec<List>> {
        let start = self
            .store
            .get_list(start_id)
            .await?
            .ok_or_else(|| ElementError::not_found(EntityKind::List, start_id))?;

        let mut seen: HashSet<String> = HashSet::from([start.id.clone()]);
        let mut chain = vec![start];

        loop {
            let current = &chain[chain.len() - 1];
            if stop_at == Some(current.id.as_str()) {
                break;
            }
            let Some(parent_id) = current.parent_list_id.clone() else {
                break;
            };

            if !seen.insert(parent_id.clone()) || chain.len() >= self.max_depth {
                warn!(
                    list_id = %start_id,
                    parent_id = %parent_id,
                    depth = chain.len(),
                    "Ancestor walk aborted: stored hierarchy loops or is too deep"
                );
                return Err(ElementError::CircularReference {
                    list_id: start_id.to_string(),
                    parent_id,
                });
            }

            match self.store.get_list(&parent_id).await? {
                Some(parent) => chain.push(parent),
                None => break,
            }
        }

        Ok(chain)
    }

    /// True if `list_id` equals `proposed_parent_id` or is one of its ancestors
    pub async fn would_create_cycle(
        &self,
        list_id: &str,
        proposed_parent_id: &str,
    ) -> ElementResult<bool> {
        if list_id == proposed_parent_id {
            return Ok(true);
        }
        let chain = self.walk_up(proposed_parent_id, Some(list_id)).await?;
        Ok(chain.iter().any(|list| list.id == list_id))
    }

    /// Precondition for re-parenting `list_id` under `proposed_parent_id`.
    ///
    /// `None` moves the list to the root and is always acceptable. The parent
    /// pointer itself is written by the caller.
    pub async fn validate_move(
        &self,
        list_id: &str,
        proposed_parent_id: Option<&str>,
    ) -> ElementResult<()> {
        let Some(parent_id) = proposed_parent_id else {
            return Ok(());
        };
        if self.would_create_cycle(list_id, parent_id).await? {
            return Err(ElementError::CircularReference {
                list_id: list_id.to_string(),
                parent_id: parent_id.to_string(),
            });
        }
        Ok(())
    }

    /// All descendants of `list_id`, excluding itself, parents before children
    pub async fn descendants(&self, list_id: &str) -> ElementResult<Vec<List>> {
        let mut seen: HashSet<String> = HashSet::from([list_id.to_string()]);
        let mut queue: VecDeque<String> = VecDeque::from([list_id.to_string()]);
        let mut found = Vec::new();

        while let Some(parent_id) = queue.pop_front() {
            for child in self.store.child_lists(&parent_id).await? {
                if seen.insert(child.id.clone()) {
                    queue.push_back(child.id.clone());
                    found.push(child);
                }
            }
        }

        Ok(found)
    }

    pub async fn descendant_ids(&self, list_id: &str) -> ElementResult<BTreeSet<String>> {
        Ok(self
            .descendants(list_id)
            .await?
            .into_iter()
            .map(|list| list.id)
            .collect())
    }

    /// Ancestors of `list_id` from the root down to its immediate parent
    pub async fn breadcrumbs(&self, list_id: &str) -> ElementResult<Vec<List>> {
        let mut chain = self.walk_up(list_id, None).await?;
        chain.remove(0);
        chain.reverse();
        Ok(chain)
    }

    /// Active descendant lists and open directly-owned items of `list_id`
    pub async fn archive_blockers(&self, list_id: &str) -> ElementResult<ArchiveBlockers> {
        let active_lists = self
            .descendants(list_id)
            .await?
            .into_iter()
            .filter(|list| list.status.is_active())
            .map(|list| list.id)
            .collect();
        let open_items = self
            .store
            .items_in_list(list_id)
            .await?
            .into_iter()
            .filter(|item| !item.status.is_terminal())
            .map(|item| item.id)
            .collect();

        Ok(ArchiveBlockers {
            active_lists,
            open_items,
        })
    }

    pub async fn can_archive(&self, list_id: &str, force: bool) -> ElementResult<bool> {
        if force {
            return Ok(true);
        }
        Ok(self.archive_blockers(list_id).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, NewItem, NewList};
    use crate::state_machine::{ItemStatus, ListStatus};
    use crate::store::InMemoryStore;
    use chrono::Utc;

    fn list(id: &str, parent: Option<&str>) -> List {
        let mut new_list = NewList::new(format!("List {id}"));
        new_list.parent_list_id = parent.map(str::to_string);
        new_list.into_list(id.to_string(), None, Utc::now())
    }

    fn item(id: &str, list_id: &str, status: ItemStatus) -> Item {
        NewItem::new(list_id, id)
            .with_status(status)
            .into_item(id.to_string(), None, 0, Utc::now())
    }

    /// root -> a -> b -> c, root -> sibling
    fn tree() -> Vec<List> {
        vec![
            list("root", None),
            list("a", Some("root")),
            list("b", Some("a")),
            list("c", Some("b")),
            list("sibling", Some("root")),
        ]
    }

    fn validator(lists: Vec<List>, items: Vec<Item>) -> HierarchyValidator {
        HierarchyValidator::new(Arc::new(InMemoryStore::with_entities(lists, items)))
    }

    #[tokio::test]
    async fn test_move_under_self_or_descendant_rejected() {
        let validator = validator(tree(), vec![]);

        assert!(validator.would_create_cycle("a", "a").await.unwrap());
        assert!(validator.would_create_cycle("a", "c").await.unwrap());
        assert!(!validator.would_create_cycle("c", "sibling").await.unwrap());

        let err = validator.validate_move("a", Some("b")).await.unwrap_err();
        assert!(err.to_string().contains("circular"));
        assert!(validator.validate_move("a", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_move_under_missing_parent() {
        let validator = validator(tree(), vec![]);
        assert!(matches!(
            validator.validate_move("a", Some("ghost")).await,
            Err(ElementError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_descendants_exclude_self() {
        let validator = validator(tree(), vec![]);
        let ids = validator.descendant_ids("root").await.unwrap();
        assert_eq!(ids.len(), 4);
        assert!(!ids.contains("root"));

        let ordered: Vec<String> = validator
            .descendants("a")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ordered, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_breadcrumbs_root_first() {
        let validator = validator(tree(), vec![]);
        let crumbs: Vec<String> = validator
            .breadcrumbs("c")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(crumbs, vec!["root", "a", "b"]);
        assert!(validator.breadcrumbs("root").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_looping_data_reported_as_circular() {
        let validator = validator(vec![list("x", Some("y")), list("y", Some("x"))], vec![]);
        assert!(matches!(
            validator.breadcrumbs("x").await,
            Err(ElementError::CircularReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let validator = validator(tree(), vec![]).with_max_depth(2);
        assert!(matches!(
            validator.breadcrumbs("c").await,
            Err(ElementError::CircularReference { .. })
        ));
    }

    #[tokio::test]
    async fn test_archive_blockers() {
        let mut lists = tree();
        for l in lists.iter_mut().filter(|l| l.id != "root" && l.id != "a") {
            l.status = ListStatus::Archived;
        }
        let validator = validator(
            lists,
            vec![
                item("open", "root", ItemStatus::InProgress),
                item("done", "root", ItemStatus::Completed),
            ],
        );

        let blockers = validator.archive_blockers("root").await.unwrap();
        assert_eq!(blockers.active_lists, vec!["a"]);
        assert_eq!(blockers.open_items, vec!["open"]);
        assert!(!validator.can_archive("root", false).await.unwrap());
        assert!(validator.can_archive("root", true).await.unwrap());
        assert!(validator.can_archive("b", false).await.unwrap());
    }
}
