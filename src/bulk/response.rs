//! Bulk responses and the batch-level status rules.
//!
//! - every element succeeded: 201 for create, 200 otherwise
//! - families where business rules fail the batch (item status, list status,
//!   list move): any business-rule error gives 400
//! - some succeeded, some failed: 207
//! - nothing succeeded: 400
//! - request rejected before processing: 400 (validation) or 404 (missing move
//!   target); infrastructure abort: 500

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::RequestContext;
use super::types::BatchResult;
use crate::constants::OperationFamily;
use crate::error::TaskListError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    Ok,
    Created,
    MultiStatus,
    BadRequest,
    NotFound,
    InternalError,
}

impl ResponseStatus {
    pub fn code(&self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::Created => 201,
            ResponseStatus::MultiStatus => 207,
            ResponseStatus::BadRequest => 400,
            ResponseStatus::NotFound => 404,
            ResponseStatus::InternalError => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code())
    }
}

impl From<&TaskListError> for ResponseStatus {
    fn from(err: &TaskListError) -> Self {
        match err {
            TaskListError::ValidationError(_) => ResponseStatus::BadRequest,
            TaskListError::NotFound(_) => ResponseStatus::NotFound,
            TaskListError::Infrastructure(_)
            | TaskListError::ConfigurationError(_)
            | TaskListError::Internal(_) => ResponseStatus::InternalError,
        }
    }
}

/// How element failures map onto the batch status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any success alongside failures is a partial success
    PartialSuccess,
    /// A business-rule violation in any element fails the batch
    BusinessRuleFailsBatch,
}

pub fn resolve_status<T>(
    family: OperationFamily,
    policy: FailurePolicy,
    result: &BatchResult<T>,
) -> ResponseStatus {
    if result.is_complete_success() {
        return match family {
            OperationFamily::Create => ResponseStatus::Created,
            _ => ResponseStatus::Ok,
        };
    }
    if policy == FailurePolicy::BusinessRuleFailsBatch && result.has_business_rule_failure() {
        return ResponseStatus::BadRequest;
    }
    if result.summary.successful > 0 {
        ResponseStatus::MultiStatus
    } else {
        ResponseStatus::BadRequest
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&TaskListError> for ErrorBody {
    fn from(err: &TaskListError) -> Self {
        let code = match err {
            TaskListError::ValidationError(_) => "VALIDATION_ERROR",
            TaskListError::NotFound(_) => "NOT_FOUND",
            TaskListError::Infrastructure(_) => "INFRASTRUCTURE_ERROR",
            TaskListError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            TaskListError::Internal(_) => "INTERNAL_ERROR",
        };
        Self {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

/// Response for every bulk operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResponse<T> {
    pub success: bool,
    #[serde(skip)]
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BatchResult<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

impl<T> BulkResponse<T> {
    pub fn from_batch(ctx: &RequestContext, status: ResponseStatus, result: BatchResult<T>) -> Self {
        Self {
            success: status.is_success(),
            status,
            data: Some(result),
            error: None,
            correlation_id: ctx.correlation_id.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn from_error(ctx: &RequestContext, err: &TaskListError) -> Self {
        let status = ResponseStatus::from(err);
        Self {
            success: false,
            status,
            data: None,
            error: Some(ErrorBody::from(err)),
            correlation_id: ctx.correlation_id.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.code()
    }

    /// Batch result, present unless the request was rejected or aborted
    pub fn data(&self) -> Option<&BatchResult<T>> {
        self.data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::types::BatchError;
    use crate::error::{ElementError, EntityKind};

    fn result(successes: usize, errors: Vec<ElementError>) -> BatchResult<usize> {
        let mut result = BatchResult::default();
        for index in 0..successes {
            result.push_success(index, index);
        }
        for (offset, err) in errors.iter().enumerate() {
            result.push_error(BatchError::from_element_error(successes + offset, None, err));
        }
        result
    }

    fn cycle() -> ElementError {
        ElementError::CircularReference {
            list_id: "a".into(),
            parent_id: "a".into(),
        }
    }

    #[test]
    fn test_all_succeed() {
        let ok = result(2, vec![]);
        assert_eq!(
            resolve_status(OperationFamily::Create, FailurePolicy::PartialSuccess, &ok),
            ResponseStatus::Created
        );
        assert_eq!(
            resolve_status(OperationFamily::Delete, FailurePolicy::PartialSuccess, &ok),
            ResponseStatus::Ok
        );
    }

    #[test]
    fn test_partial_and_total_failure() {
        let missing = ElementError::not_found(EntityKind::Item, "x");
        let partial = result(1, vec![missing.clone()]);
        assert_eq!(
            resolve_status(OperationFamily::Update, FailurePolicy::PartialSuccess, &partial),
            ResponseStatus::MultiStatus
        );

        let failed = result(0, vec![missing]);
        assert_eq!(
            resolve_status(OperationFamily::Update, FailurePolicy::PartialSuccess, &failed),
            ResponseStatus::BadRequest
        );
    }

    #[test]
    fn test_business_rule_fails_batch() {
        let mixed = result(3, vec![cycle()]);
        assert_eq!(
            resolve_status(OperationFamily::Move, FailurePolicy::BusinessRuleFailsBatch, &mixed),
            ResponseStatus::BadRequest
        );
        assert_eq!(
            resolve_status(OperationFamily::Move, FailurePolicy::PartialSuccess, &mixed),
            ResponseStatus::MultiStatus
        );
    }

    #[test]
    fn test_error_response_carries_correlation_id() {
        let ctx = RequestContext::new().with_correlation_id(Some("req-1"));
        let response: BulkResponse<usize> =
            BulkResponse::from_error(&ctx, &TaskListError::Infrastructure("down".into()));
        assert_eq!(response.status_code(), 500);
        assert!(!response.success);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["correlationId"], "req-1");
        assert_eq!(json["error"]["code"], "INFRASTRUCTURE_ERROR");
        assert!(json.get("data").is_none());
    }
}
