//! Axum route handlers for the Access Grant API.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};

use crate::errors::AppError;
use crate::grant::{AccessGrant, GrantParams};
use crate::state::AppState;

/// GET /api/v1/grants?key=...&method=...&contentType=...
pub async fn handle_issue_grant_query(
    State(state): State<AppState>,
    params: Result<Query<GrantParams>, QueryRejection>,
) -> Result<Json<AccessGrant>, AppError> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let grant = state.grants.issue_grant(params).await?;
    Ok(Json(grant))
}

/// POST /api/v1/grants
///
/// Same contract as the query form, with the parameters in a JSON body.
pub async fn handle_issue_grant(
    State(state): State<AppState>,
    params: Result<Json<GrantParams>, JsonRejection>,
) -> Result<Json<AccessGrant>, AppError> {
    let Json(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let grant = state.grants.issue_grant(params).await?;
    Ok(Json(grant))
}
