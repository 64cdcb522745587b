//! Per-request context carried through a bulk call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

/// Cooperative cancellation shared between a caller and a running batch.
///
/// Checked between chunks: the chunk in flight runs to completion and its
/// results are kept.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Who is calling and how to correlate the call
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Propagated unchanged into every response and log line
    pub correlation_id: String,
    /// Stamped as `createdBy` on created entities
    pub actor: Option<String>,
    pub cancellation: CancellationFlag,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Fresh context with a generated correlation id
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            actor: None,
            cancellation: CancellationFlag::new(),
        }
    }

    /// Use the caller's correlation id, generating one when it is absent or blank
    pub fn with_correlation_id(mut self, correlation_id: Option<impl Into<String>>) -> Self {
        if let Some(id) = correlation_id.map(Into::into) {
            if !id.trim().is_empty() {
                self.correlation_id = id;
            }
        }
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_generated_when_absent() {
        let ctx = RequestContext::new().with_correlation_id(None::<String>);
        assert!(Uuid::parse_str(&ctx.correlation_id).is_ok());

        let blank = RequestContext::new().with_correlation_id(Some("  "));
        assert!(Uuid::parse_str(&blank.correlation_id).is_ok());

        let given = RequestContext::new().with_correlation_id(Some("req-42"));
        assert_eq!(given.correlation_id, "req-42");
    }

    #[test]
    fn test_cancellation_is_shared() {
        let flag = CancellationFlag::new();
        let ctx = RequestContext::new().with_cancellation(flag.clone());
        assert!(!ctx.is_cancelled());
        flag.cancel();
        assert!(ctx.is_cancelled());
    }
}
