use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::ranking::normalize::SimilarityScale;

/// Hosted sentence-similarity model the matcher was built around.
pub const DEFAULT_SIMILARITY_API_URL: &str =
    "https://api-inference.huggingface.co/models/Shushant/ApplicantTrackingSystemBERT";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub similarity_api_url: String,
    pub similarity_api_key: String,
    /// Declared numeric contract of the provider. Drives normalization.
    pub similarity_scale: SimilarityScale,
    pub provider_timeout: Duration,
    pub provider_max_attempts: u32,
    pub max_concurrent_scoring: usize,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a fixed map.
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let similarity_scale = match lookup("SIMILARITY_SCALE") {
            Some(raw) => raw
                .parse::<SimilarityScale>()
                .map_err(anyhow::Error::msg)
                .context("SIMILARITY_SCALE must be 'cosine' or 'unit'")?,
            None => SimilarityScale::Cosine,
        };

        let provider_max_attempts: u32 =
            parse_or(&lookup, "PROVIDER_MAX_ATTEMPTS", 3).context("PROVIDER_MAX_ATTEMPTS")?;
        if provider_max_attempts == 0 {
            bail!("PROVIDER_MAX_ATTEMPTS must be at least 1");
        }

        let max_concurrent_scoring: usize =
            parse_or(&lookup, "MAX_CONCURRENT_SCORING", 4).context("MAX_CONCURRENT_SCORING")?;
        if max_concurrent_scoring == 0 {
            bail!("MAX_CONCURRENT_SCORING must be at least 1");
        }

        let timeout_secs: u64 =
            parse_or(&lookup, "PROVIDER_TIMEOUT_SECS", 30).context("PROVIDER_TIMEOUT_SECS")?;
        if timeout_secs == 0 {
            bail!("PROVIDER_TIMEOUT_SECS must be at least 1");
        }

        Ok(Config {
            similarity_api_url: lookup("SIMILARITY_API_URL")
                .unwrap_or_else(|| DEFAULT_SIMILARITY_API_URL.to_string()),
            similarity_api_key: lookup("SIMILARITY_API_KEY")
                .context("Required environment variable 'SIMILARITY_API_KEY' is not set")?,
            similarity_scale,
            provider_timeout: Duration::from_secs(timeout_secs),
            provider_max_attempts,
            max_concurrent_scoring,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)
                .context("MAX_UPLOAD_BYTES")?,
            port: parse_or(&lookup, "PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Fixed config for unit tests; never reads the environment.
    pub fn for_tests() -> Self {
        Config {
            similarity_api_url: "http://127.0.0.1:9/score".to_string(),
            similarity_api_key: "test-key".to_string(),
            similarity_scale: SimilarityScale::Cosine,
            provider_timeout: Duration::from_secs(5),
            provider_max_attempts: 3,
            max_concurrent_scoring: 4,
            max_upload_bytes: 64 * 1024,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value '{raw}' for {key}: {e}")),
        None => Ok(default),
    }
}
