pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::grant::handlers as grant_handlers;
use crate::recovery::handlers as recovery_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Access grants
        .route(
            "/api/v1/grants",
            get(grant_handlers::handle_issue_grant_query)
                .post(grant_handlers::handle_issue_grant),
        )
        // Model output recovery
        .route("/api/v1/recover", post(recovery_handlers::handle_recover))
        .with_state(state)
}
