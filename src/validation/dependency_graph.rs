//! # Dependency Graph Validator
//!
//! Item dependencies form a directed graph: an edge `a -> b` means `a` requires
//! `b` completed before `a` may start. This validator keeps that graph acyclic
//! and answers whether an item's dependencies are satisfied.
//!
//! Edges are read from the store on demand; nothing is cached between calls.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::constants::MissingDependencyPolicy;
use crate::error::{ElementError, ElementResult, EntityKind};
use crate::store::EntityStore;

#[derive(Clone)]
pub struct DependencyGraphValidator {
    store: Arc<dyn EntityStore>,
    policy: MissingDependencyPolicy,
}

impl std::fmt::Debug for DependencyGraphValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraphValidator")
            .field("store", &self.store.store_name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl DependencyGraphValidator {
    pub fn new(store: Arc<dyn EntityStore>, policy: MissingDependencyPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> MissingDependencyPolicy {
        self.policy
    }

    /// Fail if giving `item_id` the `proposed` dependencies would close a cycle.
    ///
    /// Walks depth-first from each proposed dependency along stored edges. The
    /// stored dependencies of `item_id` itself are never followed, since they are
    /// the ones being replaced. Items that do not exist have no edges.
    pub async fn validate_acyclic(
        &self,
        item_id: &str,
        proposed: &BTreeSet<String>,
    ) -> ElementResult<()> {
        if proposed.contains(item_id) {
            return Err(ElementError::DependencyCycle {
                item_id: item_id.to_string(),
                cycle: vec![item_id.to_string(), item_id.to_string()],
            });
        }

        let mut visited: HashSet<String> = HashSet::new();
        // child -> node it was reached from, for naming the cycle
        let mut reached_from: HashMap<String, String> = HashMap::new();

        for root in proposed {
            if !visited.insert(root.clone()) {
                continue;
            }
            let mut stack = vec![root.clone()];

            while let Some(node) = stack.pop() {
                let Some(item) = self.store.get_item(&node).await? else {
                    continue;
                };

                for next in &item.dependencies {
                    if next == item_id {
                        let cycle = Self::cycle_path(item_id, &node, &reached_from);
                        debug!(item_id = %item_id, cycle = ?cycle, "Dependency cycle rejected");
                        return Err(ElementError::DependencyCycle {
                            item_id: item_id.to_string(),
                            cycle,
                        });
                    }
                    if visited.insert(next.clone()) {
                        reached_from.insert(next.clone(), node.clone());
                        stack.push(next.clone());
                    }
                }
            }
        }

        Ok(())
    }

    /// `item_id -> root dependency -> ... -> last -> item_id`
    fn cycle_path(item_id: &str, last: &str, reached_from: &HashMap<String, String>) -> Vec<String> {
        let mut reversed = vec![last.to_string()];
        let mut cursor = last;
        while let Some(previous) = reached_from.get(cursor) {
            reversed.push(previous.clone());
            cursor = previous;
        }

        let mut cycle = Vec::with_capacity(reversed.len() + 2);
        cycle.push(item_id.to_string());
        cycle.extend(reversed.into_iter().rev());
        cycle.push(item_id.to_string());
        cycle
    }

    /// Dependencies that do not satisfy a start/complete transition.
    ///
    /// Missing dependencies are reported under [`MissingDependencyPolicy::Block`]
    /// and skipped under [`MissingDependencyPolicy::Allow`].
    pub async fn incomplete_dependencies(
        &self,
        dependencies: &BTreeSet<String>,
    ) -> ElementResult<Vec<String>> {
        let mut incomplete = Vec::new();
        for dependency_id in dependencies {
            match self.store.get_item(dependency_id).await? {
                Some(dependency) if dependency.status.satisfies_dependencies() => {}
                Some(_) => incomplete.push(dependency_id.clone()),
                None if self.policy == MissingDependencyPolicy::Allow => {}
                None => incomplete.push(dependency_id.clone()),
            }
        }
        Ok(incomplete)
    }

    /// True iff every dependency of the item is completed
    pub async fn can_start(&self, item_id: &str) -> ElementResult<bool> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| ElementError::not_found(EntityKind::Item, item_id))?;
        Ok(self.incomplete_dependencies(&item.dependencies).await?.is_empty())
    }

    /// Every declared dependency must already be stored.
    ///
    /// Ids in `same_batch` are rejected with [`ElementError::DependencyInBatch`]:
    /// dependencies are never resolved against elements of the batch being
    /// processed.
    pub async fn validate_dependencies_exist(
        &self,
        item_id: Option<&str>,
        dependencies: &BTreeSet<String>,
        same_batch: &HashSet<String>,
    ) -> ElementResult<()> {
        for dependency_id in dependencies {
            if same_batch.contains(dependency_id) {
                return Err(ElementError::DependencyInBatch {
                    item_id: item_id.map(str::to_string),
                    dependency_id: dependency_id.clone(),
                });
            }
            if self.store.get_item(dependency_id).await?.is_none() {
                return Err(ElementError::invalid_field(
                    "dependencies",
                    format!("dependency {dependency_id} does not exist"),
                ));
            }
        }
        Ok(())
    }
}
