use anyhow::{anyhow, bail, Context, Result};

use crate::recovery::SpanStrategy;

/// Default lifetime of an issued grant when neither the request nor the
/// environment overrides it.
pub const DEFAULT_EXPIRY_SECONDS: u64 = 3600;

/// Longest lifetime an S3 presigned URL may carry (7 days).
pub const MAX_EXPIRY_SECONDS: u64 = 604_800;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub bucket: String,
    pub region: String,
    pub expiry_seconds: u64,
    /// Set for S3-compatible stores (MinIO). Enables path-style addressing.
    pub s3_endpoint: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    /// How the recovery extractor picks a bare-object span.
    pub recovery_span_strategy: SpanStrategy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. `from_env` delegates here so tests
    /// never have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expiry_seconds = match non_empty(&lookup, "EXPIRY_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("EXPIRY_SECONDS must be a positive integer")?,
            None => DEFAULT_EXPIRY_SECONDS,
        };
        if expiry_seconds == 0 || expiry_seconds > MAX_EXPIRY_SECONDS {
            bail!(
                "EXPIRY_SECONDS must be between 1 and {MAX_EXPIRY_SECONDS}, got {expiry_seconds}"
            );
        }

        let recovery_span_strategy = match non_empty(&lookup, "RECOVERY_SPAN_STRATEGY") {
            Some(raw) => raw
                .parse::<SpanStrategy>()
                .map_err(|e| anyhow!("RECOVERY_SPAN_STRATEGY: {e}"))?,
            None => SpanStrategy::default(),
        };

        Ok(Config {
            bucket: require(&lookup, "BUCKET")?,
            region: non_empty(&lookup, "REGION").unwrap_or_else(|| "us-east-1".to_string()),
            expiry_seconds,
            s3_endpoint: non_empty(&lookup, "S3_ENDPOINT"),
            recovery_span_strategy,
            aws_access_key_id: non_empty(&lookup, "AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: non_empty(&lookup, "AWS_SECRET_ACCESS_KEY"),
            port: non_empty(&lookup, "PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: non_empty(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Static credentials are only used when both halves are present.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}
