use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use thiserror::Error;
use tracing::debug;

use crate::grant::Operation;

/// Failure reported by a signer. Carries the signer's own message verbatim.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SignerError {
    message: String,
}

impl SignerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything the signer needs to produce one presigned URL.
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub operation: Operation,
    /// Embedded in the signature for writes, so the URL only accepts uploads
    /// declaring this exact content type.
    pub content_type: Option<&'a str>,
    pub expires_in: Duration,
}

/// The seam to the external object-store signer.
///
/// Implementations must not hold locks across the signing call; the grant
/// service issues grants concurrently through a shared `Arc<dyn GrantSigner>`.
#[async_trait]
pub trait GrantSigner: Send + Sync {
    async fn presign(&self, request: &SigningRequest<'_>) -> Result<String, SignerError>;
}

/// Presigns S3 (or S3-compatible) requests with the AWS SDK.
#[derive(Clone)]
pub struct S3PresignSigner {
    client: aws_sdk_s3::Client,
}

impl S3PresignSigner {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GrantSigner for S3PresignSigner {
    async fn presign(&self, request: &SigningRequest<'_>) -> Result<String, SignerError> {
        let presigning = PresigningConfig::expires_in(request.expires_in)
            .map_err(|e| SignerError::new(format!("Invalid presign expiry: {e}")))?;

        let presigned = match request.operation {
            Operation::Read => self
                .client
                .get_object()
                .bucket(request.bucket)
                .key(request.key)
                .presigned(presigning)
                .await
                .map_err(|e| SignerError::new(DisplayErrorContext(&e).to_string()))?,
            Operation::Write => self
                .client
                .put_object()
                .bucket(request.bucket)
                .key(request.key)
                .set_content_type(request.content_type.map(str::to_string))
                .presigned(presigning)
                .await
                .map_err(|e| SignerError::new(DisplayErrorContext(&e).to_string()))?,
        };

        debug!(
            "Presigned {} for s3://{}/{}",
            presigned.method(),
            request.bucket,
            request.key
        );

        Ok(presigned.uri().to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    fn offline_client() -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"))
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    #[tokio::test]
    async fn test_s3_signer_presigns_read_without_network() {
        let signer = S3PresignSigner::new(offline_client());
        let url = signer
            .presign(&SigningRequest {
                bucket: "resumes",
                key: "uploads/jane.pdf",
                operation: Operation::Read,
                content_type: None,
                expires_in: Duration::from_secs(900),
            })
            .await
            .unwrap();

        assert!(url.contains("resumes"));
        assert!(url.contains("uploads/jane.pdf"));
        assert!(url.contains("X-Amz-Expires=900"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-SignedHeaders=host"));
        assert!(!url.contains("content-type"));
    }

    #[tokio::test]
    async fn test_s3_signer_presigns_write() {
        let signer = S3PresignSigner::new(offline_client());
        let url = signer
            .presign(&SigningRequest {
                bucket: "resumes",
                key: "uploads/jane.pdf",
                operation: Operation::Write,
                content_type: Some("application/pdf"),
                expires_in: Duration::from_secs(60),
            })
            .await
            .unwrap();

        assert!(url.contains("X-Amz-Expires=60"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-SignedHeaders=content-type%3Bhost"));
    }

    #[tokio::test]
    async fn test_s3_signer_write_without_content_type_signs_host_only() {
        let signer = S3PresignSigner::new(offline_client());
        let url = signer
            .presign(&SigningRequest {
                bucket: "resumes",
                key: "uploads/jane.pdf",
                operation: Operation::Write,
                content_type: None,
                expires_in: Duration::from_secs(60),
            })
            .await
            .unwrap();

        assert!(url.contains("X-Amz-SignedHeaders=host"));
        assert!(!url.contains("content-type"));
    }

    #[tokio::test]
    async fn test_s3_signer_write_signature_depends_on_content_type() {
        let signer = S3PresignSigner::new(offline_client());
        let mut request = SigningRequest {
            bucket: "resumes",
            key: "uploads/jane.pdf",
            operation: Operation::Write,
            content_type: Some("application/pdf"),
            expires_in: Duration::from_secs(60),
        };
        let pdf = signer.presign(&request).await.unwrap();
        request.content_type = Some("text/html");
        let html = signer.presign(&request).await.unwrap();

        let signature = |url: &str| url.split("X-Amz-Signature=").nth(1).map(str::to_string);
        assert_ne!(signature(&pdf), signature(&html));
    }

    #[tokio::test]
    async fn test_s3_signer_rejects_expiry_beyond_one_week() {
        let signer = S3PresignSigner::new(offline_client());
        let err = signer
            .presign(&SigningRequest {
                bucket: "resumes",
                key: "k",
                operation: Operation::Read,
                content_type: None,
                expires_in: Duration::from_secs(604_801),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid presign expiry"));
    }
}
