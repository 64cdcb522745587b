//! Batch value types: elements in, results and indexed errors out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ElementError, FailureClass};

/// One caller-supplied payload and its position in the submitted batch.
///
/// The index is the only correlation key between input and output: ids may not
/// exist yet (create) or may be invalid (update/delete of a missing id).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchElement<T> {
    pub index: usize,
    pub input: T,
}

/// Identity of an input element, when it can be determined before processing
pub trait ElementIdentity {
    fn element_id(&self) -> Option<String>;
}

impl ElementIdentity for String {
    fn element_id(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl ElementIdentity for &str {
    fn element_id(&self) -> Option<String> {
        Some((*self).to_string())
    }
}

/// A failed element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    /// Position of the element in the submitted batch
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip, default = "default_failure_class")]
    pub class: FailureClass,
}

fn default_failure_class() -> FailureClass {
    FailureClass::Element
}

impl BatchError {
    pub fn from_element_error(index: usize, id: Option<String>, err: &ElementError) -> Self {
        Self {
            index,
            id,
            error: err.to_string(),
            code: err.code().to_string(),
            details: err.details(),
            class: err.failure_class(),
        }
    }

    pub fn is_business_rule(&self) -> bool {
        self.class == FailureClass::BusinessRule
    }
}

/// Counts over the attempted elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Outcome of one batch call.
///
/// `results` and `errors` are both in ascending input order. Elements that were
/// never attempted (stop on first error, cancellation) appear in neither, so
/// `summary.total` only counts attempted elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult<T> {
    pub results: Vec<T>,
    /// Input index of each entry in `results`
    #[serde(skip)]
    pub result_indices: Vec<usize>,
    pub errors: Vec<BatchError>,
    pub summary: BatchSummary,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            result_indices: Vec::new(),
            errors: Vec::new(),
            summary: BatchSummary::default(),
        }
    }
}

impl<T> BatchResult<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
            result_indices: Vec::with_capacity(capacity),
            errors: Vec::new(),
            summary: BatchSummary::default(),
        }
    }

    pub(crate) fn push_success(&mut self, index: usize, value: T) {
        self.results.push(value);
        self.result_indices.push(index);
        self.summary.successful += 1;
        self.summary.total += 1;
    }

    pub(crate) fn push_error(&mut self, error: BatchError) {
        self.errors.push(error);
        self.summary.failed += 1;
        self.summary.total += 1;
    }

    pub fn is_complete_success(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn is_partial(&self) -> bool {
        self.summary.failed > 0 && self.summary.successful > 0
    }

    pub fn has_business_rule_failure(&self) -> bool {
        self.errors.iter().any(BatchError::is_business_rule)
    }

    /// Result paired with its input index
    pub fn indexed_results(&self) -> impl Iterator<Item = (usize, &T)> {
        self.result_indices.iter().copied().zip(self.results.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityKind;

    #[test]
    fn test_summary_tracks_pushes() {
        let mut result: BatchResult<&str> = BatchResult::with_capacity(3);
        result.push_success(0, "a");
        result.push_error(BatchError::from_element_error(
            1,
            Some("b".into()),
            &ElementError::not_found(EntityKind::Item, "b"),
        ));
        result.push_success(2, "c");

        assert_eq!(
            result.summary,
            BatchSummary {
                total: 3,
                successful: 2,
                failed: 1
            }
        );
        assert!(result.is_partial());
        assert!(!result.has_business_rule_failure());
        assert_eq!(
            result.indexed_results().map(|(i, _)| i).collect::<Vec<_>>(),
            vec![0, 2]
        );
    }

    #[test]
    fn test_batch_error_wire_shape() {
        let err = BatchError::from_element_error(
            4,
            None,
            &ElementError::invalid_field("title", "must not be empty"),
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["index"], 4);
        assert_eq!(json["code"], "INVALID_FIELD");
        assert_eq!(json["details"]["field"], "title");
        assert!(json.get("id").is_none());
        assert!(json.get("class").is_none());
    }
}
