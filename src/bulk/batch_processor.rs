//! # Batch Processor
//!
//! Drives a per-element operation over an ordered batch and folds the outcomes
//! into a [`BatchResult`].
//!
//! ## Execution model
//!
//! - The batch is cut into consecutive chunks of `batch_size`. Elements of one
//!   chunk run concurrently (`futures::future::join_all`), chunks run one after
//!   the other. Chunk boundaries are invisible in the result.
//! - With `continue_on_error = false`, or for operations marked `sequential`,
//!   elements run one at a time. Stop-on-error halts at the first failure and
//!   leaves the rest unattempted.
//! - Every element runs under the configured deadline; expiry is an element
//!   error ([`ElementError::Timeout`]).
//! - Element errors never escape. The exception is an infrastructure error
//!   (store unreachable), which aborts the whole batch with
//!   [`TaskListError::Infrastructure`] and no partial result.
//! - Cancellation is checked between chunks.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use super::context::RequestContext;
use super::types::{BatchElement, BatchError, BatchResult, ElementIdentity};
use crate::error::{ElementError, ElementResult, TaskListError, TaskListResult};

/// Per-call processing knobs, resolved from the operation family's options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub continue_on_error: bool,
    pub batch_size: usize,
    /// Run one element at a time even when continuing on error
    pub sequential: bool,
    /// Operation name for logs and timeout errors
    pub operation: &'static str,
}

impl ProcessOptions {
    pub fn new(operation: &'static str, continue_on_error: bool, batch_size: usize) -> Self {
        Self {
            continue_on_error,
            batch_size,
            sequential: false,
            operation,
        }
    }

    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    fn chunk_size(&self) -> usize {
        if self.continue_on_error && !self.sequential {
            self.batch_size.max(1)
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    element_timeout: Option<Duration>,
}

impl BatchProcessor {
    pub fn new(element_timeout: Option<Duration>) -> Self {
        Self { element_timeout }
    }

    pub fn element_timeout(&self) -> Option<Duration> {
        self.element_timeout
    }

    /// Run `op` once per input and collect the outcomes in input order
    pub async fn process<I, T, F, Fut>(
        &self,
        ctx: &RequestContext,
        inputs: Vec<I>,
        options: ProcessOptions,
        op: F,
    ) -> TaskListResult<BatchResult<T>>
    where
        I: ElementIdentity,
        F: Fn(BatchElement<I>) -> Fut,
        Fut: Future<Output = ElementResult<T>>,
    {
        let total = inputs.len();
        let chunk_size = options.chunk_size();
        let mut result = BatchResult::with_capacity(total);
        let mut pending = inputs.into_iter().enumerate().peekable();

        'chunks: while pending.peek().is_some() {
            if ctx.is_cancelled() {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    operation = options.operation,
                    attempted = result.summary.total,
                    total = total,
                    "Batch cancelled between chunks"
                );
                break;
            }

            let mut ids = Vec::with_capacity(chunk_size);
            let mut running = Vec::with_capacity(chunk_size);
            for (index, input) in pending.by_ref().take(chunk_size) {
                ids.push((index, input.element_id()));
                running.push(self.run_element(&op, options.operation, BatchElement { index, input }));
            }

            for ((index, id), outcome) in ids.into_iter().zip(join_all(running).await) {
                match outcome {
                    Ok(value) => result.push_success(index, value),
                    Err(err) if err.is_infrastructure() => {
                        warn!(
                            correlation_id = %ctx.correlation_id,
                            operation = options.operation,
                            index = index,
                            error = %err,
                            "Infrastructure failure, aborting batch"
                        );
                        return Err(TaskListError::from(err));
                    }
                    Err(err) => {
                        debug!(
                            correlation_id = %ctx.correlation_id,
                            operation = options.operation,
                            index = index,
                            code = err.code(),
                            error = %err,
                            "Element failed"
                        );
                        result.push_error(BatchError::from_element_error(index, id, &err));
                        if !options.continue_on_error {
                            break 'chunks;
                        }
                    }
                }
            }
        }

        Ok(result)
    }

    async fn run_element<I, T, F, Fut>(
        &self,
        op: &F,
        operation: &'static str,
        element: BatchElement<I>,
    ) -> ElementResult<T>
    where
        F: Fn(BatchElement<I>) -> Fut,
        Fut: Future<Output = ElementResult<T>>,
    {
        let Some(limit) = self.element_timeout else {
            return op(element).await;
        };

        match tokio::time::timeout(limit, op(element)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ElementError::Timeout {
                operation: operation.to_string(),
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
