//! Inference service HTTP client

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config::InferenceConfig;
use crate::core::types::{EngineError, EngineResult};

use super::models::{ApiEnvelope, HealthResponse};

const PROVIDER: &str = "inference";

#[derive(Debug, Clone)]
pub(crate) struct InferenceClient {
    http: Client,
    base_url: String,
    health_timeout: Duration,
}

impl InferenceClient {
    pub(crate) fn new(config: &InferenceConfig) -> EngineResult<Self> {
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                EngineError::internal(format!("failed to create inference HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    /// POST a JSON body and unwrap the service's response envelope.
    pub(crate) async fn post_json<Req: Serialize + Sync, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> EngineResult<T> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(endpoint, "inference request");

        let response = self.http.post(&url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::provider_unavailable(PROVIDER, "request timeout")
            } else {
                EngineError::provider_unavailable_with_source(PROVIDER, "network error", Box::new(e))
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            EngineError::provider_unavailable(PROVIDER, format!("failed to read response: {e}"))
        })?;

        if status.is_server_error() {
            return Err(EngineError::provider_unavailable(
                PROVIDER,
                format!("HTTP {status}: {text}"),
            ));
        }
        if status.is_client_error() {
            return Err(EngineError::invalid_input("image", client_error_message(status, &text)));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&text).map_err(|e| {
            EngineError::normalization(PROVIDER, "$", format!("unparseable response body: {e}"))
        })?;

        if !envelope.success {
            let message = envelope
                .error
                .map(|e| e.describe())
                .unwrap_or_else(|| "backend reported failure".to_string());
            return Err(EngineError::invalid_input("image", message));
        }

        envelope
            .data
            .ok_or_else(|| EngineError::normalization(PROVIDER, "data", "required field missing"))
    }

    /// Probe `/health` with its own short deadline.
    pub(crate) async fn health(&self) -> Result<bool, String> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| format!("health check failed: {e}"))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| format!("health response unparseable: {e}"))?;
        Ok(health.is_healthy())
    }
}

/// Client errors may arrive either as the service envelope or as a
/// FastAPI-style `detail` list; pull out whichever message is present.
fn client_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_array()) {
            let messages: Vec<String> = detail
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()).map(String::from))
                .collect();
            if !messages.is_empty() {
                return messages.join(", ");
            }
        }
        if let Some(error) = value.get("error") {
            if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                return message.to_string();
            }
            if let Some(message) = error.as_str() {
                return message.to_string();
            }
        }
    }
    format!("HTTP {status}: {body}")
}
