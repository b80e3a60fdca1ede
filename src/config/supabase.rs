//! Supabase Storage backend.
//!
//! Config via env:
//! - SUPABASE_URL
//! - SUPABASE_SERVICE_ROLE_KEY

use crate::core::Storage;
use crate::utils::error::{HoneycombError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use reqwest::Client;
use std::time::Duration;

pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

// 不要把 service role key 印到日誌
impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_role_key: service_role_key.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Both variables must be present and non-empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| HoneycombError::MissingConfigError {
                    field: key.to_string(),
                })
        };
        Ok(Self::new(read(SUPABASE_URL_VAR)?, read(SUPABASE_KEY_VAR)?))
    }
}

impl Validate for SupabaseConfig {
    fn validate(&self) -> Result<()> {
        validate_url(SUPABASE_URL_VAR, &self.url)?;
        validate_non_empty_string(SUPABASE_KEY_VAR, &self.service_role_key)
    }
}

/// Uploads objects through the Supabase Storage REST API.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: Client,
    config: SupabaseConfig,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, bucket: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("honeycomb-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config,
            bucket: bucket.into(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_endpoint(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

impl Storage for SupabaseStorage {
    async fn upload(&self, path: &str, data: &[u8], content_type: &str) -> Result<()> {
        let endpoint = self.object_endpoint(path);
        tracing::debug!("Uploading {} bytes to {}", data.len(), endpoint);

        let response = self
            .client
            .post(&endpoint)
            .header("apikey", &self.config.service_role_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.service_role_key),
            )
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HoneycombError::StorageError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}
