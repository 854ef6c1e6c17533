//! Self-hosted inference provider
//!
//! The free backend. Native scales are 0.0-1.0 ratios with `x`/`y`
//! bounding boxes; normalization rescales per field and backfills the
//! attributes the backend does not report.

mod client;
mod models;

use async_trait::async_trait;

use crate::config::InferenceConfig;
use crate::core::normalize::{ensure_data_uri, percent_to_ratio};
use crate::core::traits::FaceAnalysisProvider;
use crate::core::types::{
    EngineResult, FaceComparisonResult, FaceDetails, HealthStatus, ProviderKind,
};

use client::InferenceClient;
use models::{CompareRequest, ComparisonData, DetectRequest, DetectionData};

/// Self-hosted face-analysis provider.
#[derive(Debug, Clone)]
pub struct InferenceProvider {
    client: InferenceClient,
}

impl InferenceProvider {
    pub fn new(config: &InferenceConfig) -> EngineResult<Self> {
        Ok(Self {
            client: InferenceClient::new(config)?,
        })
    }
}

#[async_trait]
impl FaceAnalysisProvider for InferenceProvider {
    fn name(&self) -> &'static str {
        "inference"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Inference
    }

    async fn detect_faces(&self, image: &str) -> EngineResult<Vec<FaceDetails>> {
        let image = ensure_data_uri(image);
        let data: DetectionData = self
            .client
            .post_json(
                "/detect-faces",
                &DetectRequest {
                    image: &image,
                    include_landmarks: true,
                    include_attributes: true,
                    max_faces: 10,
                },
            )
            .await?;
        data.into_canonical()
    }

    async fn compare_faces(
        &self,
        source_image: &str,
        target_image: &str,
        similarity_threshold: f64,
    ) -> EngineResult<FaceComparisonResult> {
        let source_image = ensure_data_uri(source_image);
        let target_image = ensure_data_uri(target_image);
        let data: ComparisonData = self
            .client
            .post_json(
                "/compare-faces",
                &CompareRequest {
                    source_image: &source_image,
                    target_image: &target_image,
                    similarity_threshold: percent_to_ratio(similarity_threshold),
                },
            )
            .await?;
        data.into_canonical()
    }

    async fn health_check(&self) -> HealthStatus {
        match self.client.health().await {
            Ok(true) => HealthStatus::Healthy,
            Ok(false) => HealthStatus::Degraded,
            Err(_) => HealthStatus::Unhealthy,
        }
    }
}
