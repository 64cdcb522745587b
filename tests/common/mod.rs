pub mod builders;
pub mod strategies;

pub use builders::*;

use std::sync::Arc;

use tasklist_core::bulk::{BulkMutationService, RequestContext};
use tasklist_core::config::TaskListConfig;
use tasklist_core::store::InMemoryStore;

/// Service over a shared in-memory store, so tests can inspect and fault the store
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub service: BulkMutationService,
}

impl TestHarness {
    pub fn new(store: InMemoryStore) -> Self {
        Self::with_config(store, TaskListConfig::default())
    }

    pub fn with_config(store: InMemoryStore, config: TaskListConfig) -> Self {
        let store = Arc::new(store);
        let service = BulkMutationService::new(store.clone(), config);
        Self { store, service }
    }

    pub fn empty() -> Self {
        Self::new(InMemoryStore::new())
    }
}

pub fn ctx(correlation_id: &str) -> RequestContext {
    RequestContext::new()
        .with_correlation_id(Some(correlation_id))
        .with_actor("test-user")
}
