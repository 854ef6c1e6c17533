//! AWS Rekognition provider
//!
//! The metered cloud backend. Native scales already match the canonical
//! model (percentages, `Left`/`Top` boxes), so normalization is mostly
//! strict extraction plus per-field clamping.

mod client;
mod models;

use async_trait::async_trait;
use serde_json::json;

use crate::config::RekognitionConfig;
use crate::core::normalize::strip_data_uri;
use crate::core::traits::FaceAnalysisProvider;
use crate::core::types::{
    EngineResult, FaceComparisonResult, FaceDetails, HealthStatus, ProviderKind,
};

use client::RekognitionClient;
use models::{CompareFacesResponse, DetectFacesResponse};

/// Cloud face-analysis provider backed by AWS Rekognition.
#[derive(Debug, Clone)]
pub struct RekognitionProvider {
    client: RekognitionClient,
    has_credentials: bool,
}

impl RekognitionProvider {
    pub fn new(config: &RekognitionConfig) -> EngineResult<Self> {
        Ok(Self {
            client: RekognitionClient::new(config)?,
            has_credentials: config.has_credentials(),
        })
    }

    /// Build against an explicit endpoint; used by tests.
    pub fn with_endpoint(config: &RekognitionConfig, endpoint: String) -> EngineResult<Self> {
        Ok(Self {
            client: RekognitionClient::with_endpoint(config, endpoint)?,
            has_credentials: config.has_credentials(),
        })
    }
}

#[async_trait]
impl FaceAnalysisProvider for RekognitionProvider {
    fn name(&self) -> &'static str {
        "rekognition"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Rekognition
    }

    async fn detect_faces(&self, image: &str) -> EngineResult<Vec<FaceDetails>> {
        let response: DetectFacesResponse = self
            .client
            .post_target(
                "RekognitionService.DetectFaces",
                json!({
                    "Image": { "Bytes": strip_data_uri(image) },
                    "Attributes": ["ALL"],
                }),
            )
            .await?;
        response.into_canonical()
    }

    async fn compare_faces(
        &self,
        source_image: &str,
        target_image: &str,
        similarity_threshold: f64,
    ) -> EngineResult<FaceComparisonResult> {
        let response: CompareFacesResponse = self
            .client
            .post_target(
                "RekognitionService.CompareFaces",
                json!({
                    "SourceImage": { "Bytes": strip_data_uri(source_image) },
                    "TargetImage": { "Bytes": strip_data_uri(target_image) },
                    "SimilarityThreshold": similarity_threshold,
                }),
            )
            .await?;
        response.into_canonical()
    }

    /// Probe without spending quota: the service has no free health
    /// endpoint, so availability means credentials are configured.
    async fn health_check(&self) -> HealthStatus {
        if self.has_credentials {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}
