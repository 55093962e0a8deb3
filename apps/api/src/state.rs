use std::sync::Arc;

use crate::grant::GrantService;
use crate::recovery::Extractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Grant issuance against the configured bucket. Stateless, so one
    /// instance serves every request.
    pub grants: Arc<GrantService>,
    pub extractor: Extractor,
}
