//! Recovery Extractor — turns free-form language-model output into a JSON
//! record, or an `ErrorRecord` explaining why it could not.
//!
//! Pure and stateless: the same input always yields the same output, and no
//! failure escapes as an `Err` or a panic.

pub mod extractor;
pub mod handlers;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use extractor::{Extractor, SpanStrategy};

/// Candidate span used when the text contains no brace-delimited object.
pub const EMPTY_OBJECT: &str = "{}";

/// Outcome of `Extractor::recover`. Serialises untagged so callers receive either the
/// decoded value itself or the error record's fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecoveredRecord {
    Decoded(Value),
    Failed(ErrorRecord),
}

impl RecoveredRecord {
    #[cfg(test)]
    pub fn decoded(&self) -> Option<&Value> {
        match self {
            RecoveredRecord::Decoded(value) => Some(value),
            RecoveredRecord::Failed(_) => None,
        }
    }

    pub fn error_record(&self) -> Option<&ErrorRecord> {
        match self {
            RecoveredRecord::Decoded(_) => None,
            RecoveredRecord::Failed(record) => Some(record),
        }
    }
}

/// Evidence kept when recovery fails, so downstream steps can flag the
/// response for review or re-run the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub error: String,
    /// The model output exactly as received.
    pub raw_response: String,
    /// The span that was handed to the decoder.
    pub cleaned_attempt: String,
}

impl ErrorRecord {
    pub fn new(
        error: impl Into<String>,
        raw_response: impl Into<String>,
        cleaned_attempt: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            raw_response: raw_response.into(),
            cleaned_attempt: cleaned_attempt.into(),
        }
    }
}
