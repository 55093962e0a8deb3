//! Axum route handler for the Recovery API.
//!
//! The orchestrator posts its items in the shape `{"json": {"response": "..."}}`
//! (one item or a list) and expects a one-element list back with the result
//! under `json`.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::recovery::RecoveredRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PipelineItem {
    pub json: Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PipelineInput {
    Many(Vec<PipelineItem>),
    One(PipelineItem),
}

impl PipelineInput {
    fn first(self) -> Option<PipelineItem> {
        match self {
            PipelineInput::Many(items) => items.into_iter().next(),
            PipelineInput::One(item) => Some(item),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PipelineOutput {
    pub json: RecoveredRecord,
}

/// POST /api/v1/recover
///
/// Only the first item is read. A missing or non-string `response` is
/// treated as empty text, which recovers to an error record.
pub async fn handle_recover(
    State(state): State<AppState>,
    input: Result<Json<PipelineInput>, JsonRejection>,
) -> Result<Json<Vec<PipelineOutput>>, AppError> {
    let Json(input) = input.map_err(|e| AppError::Validation(e.body_text()))?;
    let item = input
        .first()
        .ok_or_else(|| AppError::Validation("Expected at least one item".to_string()))?;

    let response = item
        .json
        .get("response")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let record = state.extractor.recover(response);
    if let Some(failure) = record.error_record() {
        info!(
            "Returning error record to pipeline ({} bytes): {}",
            failure.raw_response.len(),
            failure.error
        );
    }

    Ok(Json(vec![PipelineOutput { json: record }]))
}
