use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Config, MAX_EXPIRY_SECONDS};
use crate::grant::{
    AccessGrant, AccessRequest, GrantError, GrantParams, GrantSigner, Operation, SigningRequest,
};

/// Issues presigned grants against one bucket.
///
/// Holds no mutable state: every call validates, signs once, and echoes the
/// request back. Safe to share behind an `Arc` across concurrent handlers.
pub struct GrantService {
    signer: Arc<dyn GrantSigner>,
    bucket: String,
    default_ttl_seconds: u64,
}

impl GrantService {
    pub fn new(
        signer: Arc<dyn GrantSigner>,
        bucket: impl Into<String>,
        default_ttl_seconds: u64,
    ) -> Self {
        Self {
            signer,
            bucket: bucket.into(),
            default_ttl_seconds,
        }
    }

    pub fn from_config(signer: Arc<dyn GrantSigner>, config: &Config) -> Self {
        Self::new(signer, config.bucket.clone(), config.expiry_seconds)
    }

    /// Entry point for the HTTP layer.
    pub async fn issue_grant(&self, params: GrantParams) -> Result<AccessGrant, GrantError> {
        self.issue(AccessRequest::from(params)).await
    }

    /// Validates the request and delegates to the signer.
    ///
    /// A blank key is rejected before the signer is touched. Signer failures
    /// come back as `GrantError::Signer` with the signer's message.
    pub async fn issue(&self, request: AccessRequest) -> Result<AccessGrant, GrantError> {
        let resource_key = request.resource_key.as_str();
        if resource_key.trim().is_empty() {
            return Err(GrantError::MissingKey);
        }

        let ttl = request.ttl_seconds.unwrap_or(self.default_ttl_seconds);
        if ttl == 0 || ttl > MAX_EXPIRY_SECONDS {
            return Err(GrantError::InvalidTtl { got: ttl });
        }

        let content_type = match request.operation {
            Operation::Write => request.content_type.as_deref(),
            Operation::Read => None,
        };

        let signing = SigningRequest {
            bucket: &self.bucket,
            key: resource_key,
            operation: request.operation,
            content_type,
            expires_in: Duration::from_secs(ttl),
        };

        let url = match self.signer.presign(&signing).await {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    "Signer failed for {} s3://{}/{}: {e}",
                    request.operation.http_method(),
                    self.bucket,
                    resource_key
                );
                return Err(GrantError::Signer(e));
            }
        };

        let grant_id = Uuid::new_v4();
        info!(
            %grant_id,
            key = resource_key,
            operation = request.operation.http_method(),
            ttl,
            content_type = content_type.unwrap_or("-"),
            "Issued access grant"
        );

        Ok(AccessGrant {
            grant_id,
            url,
            operation: request.operation,
            method: request.operation.http_method(),
            resource_key: resource_key.to_string(),
            expires_in_seconds: ttl,
            expires_at: Utc::now() + chrono::Duration::seconds(ttl as i64),
        })
    }
}
