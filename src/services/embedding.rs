use crate::config::EmbeddingConfig;
use crate::error::{ApiError, Result};
use crate::ml::encoder::EncodedFeatures;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    instances: [&'a EncodedFeatures; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    predictions: Vec<Vec<f32>>,
}

/// HTTP client for the external embedding-generation service.
///
/// Every call carries an explicit request and connect timeout, and transient
/// failures are retried a bounded number of times with exponential backoff.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    service_url: String,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::InternalError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            service_url: config.service_url.clone(),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// Fetch the user embedding for an encoded profile.
    pub async fn embed(&self, features: &EncodedFeatures) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            instances: [features],
        };

        for attempt in 1..=self.retry_attempts {
            match self.request_embedding(&request).await {
                Ok(embedding) => {
                    debug!(
                        dimension = embedding.len(),
                        "received user embedding from service"
                    );
                    return Ok(embedding);
                }
                Err(e) if attempt < self.retry_attempts => {
                    let delay_ms = self.retry_delay_ms * 2u64.pow(attempt - 1);
                    warn!(
                        "embedding request failed (attempt {}/{}): {}; retrying in {}ms",
                        attempt, self.retry_attempts, e, delay_ms
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }

        // The loop always returns on the last attempt
        Err(ApiError::ExternalServiceError(
            "all embedding retry attempts failed".to_string(),
        ))
    }

    async fn request_embedding(&self, request: &EmbeddingRequest<'_>) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(&self.service_url)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::ExternalServiceError(format!(
                "embedding service returned {}: {}",
                status, text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let embedding = parsed.predictions.into_iter().next().ok_or_else(|| {
            ApiError::ExternalServiceError("embedding service returned no predictions".to_string())
        })?;

        if embedding.is_empty() {
            return Err(ApiError::ExternalServiceError(
                "embedding service returned an empty vector".to_string(),
            ));
        }

        Ok(embedding)
    }
}
