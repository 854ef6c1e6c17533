//! Rekognition HTTP client
//!
//! Signed amz-json-1.1 requests against the Rekognition regional
//! endpoint. Timeouts and network failures surface as
//! `ProviderUnavailable`; request-shape rejections surface as
//! `InvalidInput`.

use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::RekognitionConfig;
use crate::core::types::{EngineError, EngineResult};
use crate::utils::sigv4::SigV4Signer;

use super::models::WireError;

const PROVIDER: &str = "rekognition";

/// Backend rejections that indicate a bad request rather than an outage.
const INVALID_INPUT_KINDS: [&str; 3] = [
    "InvalidParameterException",
    "InvalidImageFormatException",
    "ImageTooLargeException",
];

#[derive(Debug, Clone)]
pub(crate) struct RekognitionClient {
    http: Client,
    endpoint: String,
    signer: SigV4Signer,
}

impl RekognitionClient {
    pub(crate) fn new(config: &RekognitionConfig) -> EngineResult<Self> {
        let endpoint = format!("https://rekognition.{}.amazonaws.com/", config.region);
        Self::with_endpoint(config, endpoint)
    }

    /// Build against an explicit endpoint; used by tests to point at a
    /// local server.
    pub(crate) fn with_endpoint(
        config: &RekognitionConfig,
        endpoint: String,
    ) -> EngineResult<Self> {
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                EngineError::internal(format!("failed to create rekognition HTTP client: {e}"))
            })?;

        let signer = SigV4Signer::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.session_token.clone(),
            config.region.clone(),
            "rekognition",
        );

        Ok(Self {
            http,
            endpoint,
            signer,
        })
    }

    /// Send one signed operation, e.g. `RekognitionService.DetectFaces`.
    pub(crate) async fn post_target<T: DeserializeOwned>(
        &self,
        target: &str,
        body: Value,
    ) -> EngineResult<T> {
        let body_str = serde_json::to_string(&body)
            .map_err(|e| EngineError::internal(format!("request serialization failed: {e}")))?;

        let mut headers = HashMap::new();
        headers.insert("x-amz-target".to_string(), target.to_string());
        headers.insert(
            "content-type".to_string(),
            "application/x-amz-json-1.1".to_string(),
        );

        let signed = self
            .signer
            .sign_request("POST", &self.endpoint, &headers, &body_str, chrono::Utc::now())
            .map_err(|e| EngineError::internal(format!("request signing failed: {e}")))?;

        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in signed {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(&value),
            ) {
                header_map.insert(name, value);
            }
        }

        debug!(target, "rekognition request");
        let response = self
            .http
            .post(&self.endpoint)
            .headers(header_map)
            .body(body_str)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::provider_unavailable(PROVIDER, "request timeout")
                } else {
                    EngineError::provider_unavailable_with_source(
                        PROVIDER,
                        "network error",
                        Box::new(e),
                    )
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            EngineError::provider_unavailable(PROVIDER, format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(self.map_http_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            EngineError::normalization(PROVIDER, "$", format!("unparseable response body: {e}"))
        })
    }

    fn map_http_error(&self, status: u16, body: &str) -> EngineError {
        let wire: WireError = serde_json::from_str(body).unwrap_or(WireError {
            kind: None,
            message: None,
        });
        let kind = wire.kind.unwrap_or_default();
        // The __type field carries a namespace prefix on some errors.
        let kind = kind.rsplit('#').next().unwrap_or(&kind).to_string();
        let message = wire
            .message
            .unwrap_or_else(|| format!("HTTP {status}: {body}"));

        if INVALID_INPUT_KINDS.contains(&kind.as_str()) {
            EngineError::invalid_input("image", format!("{kind}: {message}"))
        } else {
            EngineError::provider_unavailable(
                PROVIDER,
                if kind.is_empty() {
                    message
                } else {
                    format!("{kind}: {message}")
                },
            )
        }
    }
}
