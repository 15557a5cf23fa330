//! QR / trace artifact client
//!
//! Produces the URL a consumer scans to reach a batch's public trace page.
//! Listing a batch calls the generator once; failures are reported to the
//! caller but never abort the listing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::CropBatch;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{ArtifactConfig, TraceConfig};
use crate::error::{AppError, AppResult};

/// Generates the scannable trace artifact for a listed batch
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    /// Returns the artifact URL for `batch`
    async fn generate_trace_artifact(&self, batch: &CropBatch) -> AppResult<String>;
}

/// Public trace page URL for a batch
pub fn trace_url(public_base_url: &str, public_batch_id: Uuid) -> String {
    format!(
        "{}/trace/{}",
        public_base_url.trim_end_matches('/'),
        public_batch_id
    )
}

/// Request body sent to the artifact service
#[derive(Debug, Serialize)]
pub struct GenerateArtifactRequest<'a> {
    pub product_batch_id: &'a str,
    pub public_batch_id: Uuid,
    pub payload: String,
}

/// Artifact service response
#[derive(Debug, Deserialize)]
pub struct GenerateArtifactResponse {
    pub url: String,
}

/// Artifact generator talking to a remote QR service over HTTP.
///
/// With no endpoint configured the trace URL itself is returned, which is
/// what the QR code would encode anyway.
#[derive(Clone)]
pub struct HttpArtifactClient {
    endpoint: String,
    api_key: String,
    public_base_url: String,
    http_client: Client,
}

impl HttpArtifactClient {
    pub fn new(artifact: &ArtifactConfig, trace: &TraceConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(artifact.timeout_secs.max(1)))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: artifact.endpoint.trim_end_matches('/').to_string(),
            api_key: artifact.api_key.clone(),
            public_base_url: trace.public_base_url.clone(),
            http_client,
        })
    }

    pub fn is_remote(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

#[async_trait]
impl ArtifactGenerator for HttpArtifactClient {
    async fn generate_trace_artifact(&self, batch: &CropBatch) -> AppResult<String> {
        let payload = trace_url(&self.public_base_url, batch.public_batch_id);
        if !self.is_remote() {
            return Ok(payload);
        }

        let request = GenerateArtifactRequest {
            product_batch_id: &batch.product_batch_id,
            public_batch_id: batch.public_batch_id,
            payload,
        };

        let response = self
            .http_client
            .post(format!("{}/artifacts/qr", self.endpoint))
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Artifact request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalService(format!(
                "Artifact service returned {}: {}",
                status, body
            )));
        }

        let result: GenerateArtifactResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse artifact response: {}", e))
        })?;

        Ok(result.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_url_strips_trailing_slash() {
        let id = Uuid::nil();
        assert_eq!(
            trace_url("https://trace.example.org/", id),
            format!("https://trace.example.org/trace/{}", id)
        );
    }

    #[test]
    fn empty_endpoint_is_local() {
        let client = HttpArtifactClient::new(
            &ArtifactConfig::default(),
            &TraceConfig {
                public_base_url: "https://trace.example.org".to_string(),
            },
        )
        .unwrap();
        assert!(!client.is_remote());
    }
}
