#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasklist Core
//!
//! Bulk mutation engine for task lists.
//!
//! ## Overview
//!
//! Lists own Items and nest into a forest; Items declare dependencies on other
//! Items. The engine accepts batches of create, update, status-change, move and
//! delete operations against both entities, applies them element by element with
//! partial-failure semantics, and keeps two structural invariants intact:
//!
//! - the Item dependency graph stays acyclic and gates the `in_progress` and
//!   `completed` transitions
//! - the List parent relation stays a forest, and archiving a List with active
//!   children is rejected unless forced or cascaded
//!
//! ## Module Organization
//!
//! - [`bulk`] - Batch processor, request/response shapes and the mutation service
//! - [`validation`] - Dependency graph and hierarchy validators, payload checks
//! - [`state_machine`] - Item/List statuses and transition guards
//! - [`models`] - Items and Lists with their create/patch payloads
//! - [`store`] - Persistence traits, in-memory and PostgreSQL stores, cache hook
//! - [`config`] - Layered TOML + environment configuration
//! - [`error`] - Request-level and element-level errors
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tasklist_core::bulk::{BulkCreateListsRequest, BulkMutationService, RequestContext};
//! use tasklist_core::config::TaskListConfig;
//! use tasklist_core::models::NewList;
//! use tasklist_core::store::InMemoryStore;
//!
//! # async fn example() {
//! let service = BulkMutationService::new(Arc::new(InMemoryStore::new()), TaskListConfig::default());
//! let ctx = RequestContext::new().with_actor("alice");
//!
//! let response = service
//!     .create_lists(
//!         &ctx,
//!         BulkCreateListsRequest {
//!             lists: vec![NewList::new("Groceries")],
//!             options: Default::default(),
//!         },
//!     )
//!     .await;
//! assert_eq!(response.status_code(), 201);
//! # }
//! ```

pub mod bulk;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod state_machine;
pub mod store;
pub mod utils;
pub mod validation;

pub use bulk::{BatchProcessor, BatchResult, BulkMutationService, BulkResponse, RequestContext};
pub use config::{ConfigManager, TaskListConfig};
pub use constants::{MissingDependencyPolicy, OperationFamily};
pub use error::{ElementError, ElementResult, EntityKind, TaskListError, TaskListResult};
pub use models::{Item, List};
pub use state_machine::{ItemStatus, ListStatus};
pub use store::{EntityStore, InMemoryStore};
