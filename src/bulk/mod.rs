//! # Bulk Operations
//!
//! Batched create/update/status/move/delete over Items and Lists with
//! per-element error isolation.
//!
//! - [`BatchProcessor`]: ordered fan-out with chunking, timeouts and cancellation
//! - [`BulkMutationService`]: the ten entry points (five families per entity)
//! - [`BulkResponse`]: uniform response envelope and status resolution

pub mod batch_processor;
pub mod context;
pub mod options;
pub mod requests;
pub mod response;
pub mod service;
pub mod types;

pub use batch_processor::{BatchProcessor, ProcessOptions};
pub use context::{CancellationFlag, RequestContext};
pub use options::{
    CreateItemsOptions, CreateListsOptions, CreateListsSettings, DeleteOptions, DeleteSettings,
    FamilyDefaults, ItemStatusOptions, ItemStatusSettings, ListStatusOptions, ListStatusSettings,
    MoveOptions, MoveSettings, UpdateOptions,
};
pub use requests::{
    BulkCreateItemsRequest, BulkCreateListsRequest, BulkDeleteRequest, BulkItemStatusRequest,
    BulkListStatusRequest, BulkMoveRequest, BulkUpdateItemsRequest, BulkUpdateListsRequest,
    BulkUpdateRequest, UpdateEntry,
};
pub use response::{resolve_status, BulkResponse, ErrorBody, FailurePolicy, ResponseStatus};
pub use service::{BulkMutationService, DeletedEntity, ListStatusOutcome};
pub use types::{BatchElement, BatchError, BatchResult, BatchSummary, ElementIdentity};
