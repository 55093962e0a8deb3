//! Access Grant Service — issues time-limited, single-operation presigned URLs
//! for objects in the resume bucket.
//!
//! The service validates and normalises the request, then hands signing to a
//! `GrantSigner`. Expiry and signature checks happen at redemption time inside
//! the object store; nothing here re-verifies a grant once it is issued.

pub mod handlers;
pub mod service;
pub mod signer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MAX_EXPIRY_SECONDS;

pub use service::GrantService;
pub use signer::{GrantSigner, S3PresignSigner, SignerError, SigningRequest};

/// The single action a grant authorises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    #[default]
    Read,
    Write,
}

impl Operation {
    /// Maps an inbound HTTP method name to an operation.
    ///
    /// `PUT` (any case) is a write. Everything else, including a missing or
    /// unrecognised method, falls back to a read rather than being rejected.
    pub fn from_method(method: Option<&str>) -> Self {
        match method.map(str::trim) {
            Some(m) if m.eq_ignore_ascii_case("PUT") => Operation::Write,
            _ => Operation::Read,
        }
    }

    pub fn http_method(self) -> &'static str {
        match self {
            Operation::Read => "GET",
            Operation::Write => "PUT",
        }
    }
}

/// Wire-level grant request as sent by the orchestrator, either as a query
/// string or a JSON body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantParams {
    pub key: Option<String>,
    pub method: Option<String>,
    pub content_type: Option<String>,
    pub ttl_seconds: Option<u64>,
}

/// A normalised grant request. Validation of the key and ttl happens in
/// `GrantService::issue` so that every entry point is checked the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRequest {
    pub resource_key: String,
    pub operation: Operation,
    /// Only meaningful for `Operation::Write`.
    pub content_type: Option<String>,
    /// `None` means the service default applies.
    pub ttl_seconds: Option<u64>,
}

impl From<GrantParams> for AccessRequest {
    fn from(params: GrantParams) -> Self {
        AccessRequest {
            resource_key: params.key.unwrap_or_default(),
            operation: Operation::from_method(params.method.as_deref()),
            content_type: params.content_type.filter(|ct| !ct.trim().is_empty()),
            ttl_seconds: params.ttl_seconds,
        }
    }
}

/// A signed URL scoped to one operation on one object. Never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub grant_id: Uuid,
    pub url: String,
    pub operation: Operation,
    pub method: &'static str,
    pub resource_key: String,
    pub expires_in_seconds: u64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum GrantError {
    #[error("Missing key")]
    MissingKey,

    #[error("ttlSeconds must be between 1 and {max}, got {got}", max = MAX_EXPIRY_SECONDS)]
    InvalidTtl { got: u64 },

    #[error(transparent)]
    Signer(#[from] SignerError),
}

impl GrantError {
    /// True when the caller sent a bad request, as opposed to a signer failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, GrantError::Signer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_in_any_case_is_write() {
        assert_eq!(Operation::from_method(Some("PUT")), Operation::Write);
        assert_eq!(Operation::from_method(Some("put")), Operation::Write);
        assert_eq!(Operation::from_method(Some(" Put ")), Operation::Write);
    }

    #[test]
    fn test_unknown_or_missing_method_defaults_to_read() {
        assert_eq!(Operation::from_method(None), Operation::Read);
        assert_eq!(Operation::from_method(Some("GET")), Operation::Read);
        assert_eq!(Operation::from_method(Some("DELETE")), Operation::Read);
        assert_eq!(Operation::from_method(Some("")), Operation::Read);
    }

    #[test]
    fn test_operation_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&Operation::Read).unwrap(), "\"READ\"");
        assert_eq!(serde_json::to_string(&Operation::Write).unwrap(), "\"WRITE\"");
    }

    #[test]
    fn test_grant_params_deserialize_camel_case() {
        let params: GrantParams = serde_json::from_str(
            r#"{
                "key": "resumes/a.pdf",
                "method": "put",
                "contentType": "application/pdf",
                "ttlSeconds": 120
            }"#,
        )
        .unwrap();
        let request = AccessRequest::from(params);
        assert_eq!(request.resource_key, "resumes/a.pdf");
        assert_eq!(request.operation, Operation::Write);
        assert_eq!(request.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(request.ttl_seconds, Some(120));
    }

    #[test]
    fn test_missing_key_becomes_empty_resource_key() {
        let request = AccessRequest::from(GrantParams::default());
        assert_eq!(request.resource_key, "");
        assert_eq!(request.operation, Operation::Read);
    }

    #[test]
    fn test_blank_content_type_dropped() {
        let request = AccessRequest::from(GrantParams {
            key: Some("k".into()),
            content_type: Some("   ".into()),
            ..Default::default()
        });
        assert!(request.content_type.is_none());
    }

    #[test]
    fn test_grant_error_classification() {
        assert!(GrantError::MissingKey.is_client_error());
        assert!(GrantError::InvalidTtl { got: 0 }.is_client_error());
        assert!(!GrantError::Signer(SignerError::new("denied")).is_client_error());
        assert_eq!(GrantError::MissingKey.to_string(), "Missing key");
    }
}
