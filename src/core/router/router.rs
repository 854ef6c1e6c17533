//! Hybrid router
//!
//! Per-request pipeline: SELECT a provider from policy, INVOKE its
//! adapter, FALLBACK once to the other provider on outage, RECORD usage
//! on success. The pipeline runs inside its own task so a caller that
//! disconnects mid-request cannot cancel a backend call that has already
//! been billed — the usage record still lands.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, RoutingConfig};
use crate::core::cost::PriceTable;
use crate::core::providers::{InferenceProvider, RekognitionProvider};
use crate::core::traits::{DEFAULT_SIMILARITY_THRESHOLD, FaceAnalysisProvider, validate_candidates};
use crate::core::types::{
    EngineError, EngineResult, EngineStatus, FaceComparisonResult, FaceDetails,
    FindSimilarResponse, HealthStatus, Operation, ProviderAvailability, ProviderKind, Routed,
};
use crate::core::usage::UsageLedger;

use super::policy::{UsageSnapshot, select_provider};

/// Routes each operation to one of the two providers and owns the
/// fallback and usage-recording semantics.
pub struct HybridRouter {
    rekognition: Arc<dyn FaceAnalysisProvider>,
    inference: Arc<dyn FaceAnalysisProvider>,
    ledger: Arc<UsageLedger>,
    routing: RoutingConfig,
    prices: PriceTable,
}

impl HybridRouter {
    /// Build a router with the real provider adapters.
    pub fn new(config: &EngineConfig, ledger: Arc<UsageLedger>) -> EngineResult<Self> {
        let rekognition = Arc::new(RekognitionProvider::new(&config.rekognition)?);
        let inference = Arc::new(InferenceProvider::new(&config.inference)?);
        Ok(Self::with_providers(
            config.routing.clone(),
            config.pricing,
            rekognition,
            inference,
            ledger,
        ))
    }

    /// Build a router over injected providers; tests substitute stubs.
    pub fn with_providers(
        routing: RoutingConfig,
        prices: PriceTable,
        rekognition: Arc<dyn FaceAnalysisProvider>,
        inference: Arc<dyn FaceAnalysisProvider>,
        ledger: Arc<UsageLedger>,
    ) -> Self {
        Self {
            rekognition,
            inference,
            ledger,
            routing,
            prices,
        }
    }

    pub fn ledger(&self) -> Arc<UsageLedger> {
        Arc::clone(&self.ledger)
    }

    /// Detect all faces in an image.
    pub async fn detect_faces(&self, image: &str) -> EngineResult<Routed<Vec<FaceDetails>>> {
        let image = image.to_string();
        self.execute(Operation::DetectFaces, move |provider| {
            let image = image.clone();
            Box::pin(async move { provider.detect_faces(&image).await })
        })
        .await
    }

    /// Compare a source face against a target image. The threshold
    /// defaults to the permissive 1.0 so a no-match comparison succeeds
    /// with an empty result.
    pub async fn compare_faces(
        &self,
        source_image: &str,
        target_image: &str,
        similarity_threshold: Option<f64>,
    ) -> EngineResult<Routed<FaceComparisonResult>> {
        let threshold = similarity_threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
        if !(0.0..=100.0).contains(&threshold) {
            return Err(EngineError::invalid_input(
                "similarityThreshold",
                format!("must be within [0, 100], got {threshold}"),
            ));
        }

        let source = source_image.to_string();
        let target = target_image.to_string();
        self.execute(Operation::CompareFaces, move |provider| {
            let source = source.clone();
            let target = target.clone();
            Box::pin(async move { provider.compare_faces(&source, &target, threshold).await })
        })
        .await
    }

    /// Rank candidate images by similarity to the source face.
    pub async fn find_similar_faces(
        &self,
        source_image: &str,
        target_images: &[String],
    ) -> EngineResult<Routed<FindSimilarResponse>> {
        // Bounds are checked before SELECT so an oversized request costs
        // nothing: no task, no adapter call, no backend spend.
        validate_candidates(target_images)?;

        let source = source_image.to_string();
        let candidates = target_images.to_vec();
        self.execute(Operation::FindSimilarFaces, move |provider| {
            let source = source.clone();
            let candidates = candidates.clone();
            Box::pin(async move { provider.find_similar_faces(&source, &candidates).await })
        })
        .await
    }

    /// Health of both providers plus the routing configuration, for the
    /// operational status endpoint.
    pub async fn provider_status(&self) -> EngineStatus {
        let (rekognition, inference) = tokio::join!(
            self.rekognition.health_check(),
            self.inference.health_check()
        );
        EngineStatus {
            rekognition: availability(rekognition),
            inference: availability(inference),
            default_provider: self.routing.default_provider,
            operation_overrides: self.routing.operation_overrides.clone(),
        }
    }

    fn provider_for(&self, kind: ProviderKind) -> Arc<dyn FaceAnalysisProvider> {
        match kind {
            ProviderKind::Rekognition => Arc::clone(&self.rekognition),
            ProviderKind::Inference => Arc::clone(&self.inference),
        }
    }

    async fn execute<T, F>(&self, operation: Operation, call: F) -> EngineResult<Routed<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn FaceAnalysisProvider>) -> BoxFuture<'static, EngineResult<T>>
            + Send
            + 'static,
    {
        let snapshot = UsageSnapshot::capture(&self.ledger, &self.prices);
        let selection = select_provider(&self.routing, operation, &snapshot);
        let primary_kind = selection.provider;
        let secondary_kind = primary_kind.other();
        let primary = self.provider_for(primary_kind);
        let secondary = self.provider_for(secondary_kind);
        let fallback_enabled = self.routing.fallback_enabled;
        let ledger = Arc::clone(&self.ledger);
        let request_id = Uuid::new_v4();

        debug!(
            %request_id,
            operation = %operation,
            provider = %primary_kind,
            reason = ?selection.reason,
            spend_usd = snapshot.estimated_spend_usd,
            "provider selected"
        );

        let span = info_span!("face_operation", %request_id, operation = %operation);
        let task = tokio::spawn(
            async move {
                match call(primary).await {
                    Ok(result) => {
                        record_usage_detached(ledger, operation);
                        Ok(Routed {
                            result,
                            provider: primary_kind,
                            used_fallback: false,
                        })
                    }
                    Err(primary_err) if fallback_enabled && primary_err.is_fallback_eligible() => {
                        warn!(
                            provider = %primary_kind,
                            error = %primary_err,
                            "primary provider unavailable, invoking fallback"
                        );
                        match call(secondary).await {
                            Ok(result) => {
                                record_usage_detached(ledger, operation);
                                Ok(Routed {
                                    result,
                                    provider: secondary_kind,
                                    used_fallback: true,
                                })
                            }
                            Err(fallback_err) => Err(EngineError::provider_unavailable(
                                secondary_kind.as_str(),
                                format!(
                                    "both providers failed: {primary_kind}: {primary_err}; \
                                     {secondary_kind} (fallback): {fallback_err}"
                                ),
                            )),
                        }
                    }
                    Err(err) => Err(err),
                }
            }
            .instrument(span),
        );

        task.await
            .map_err(|e| EngineError::internal(format!("operation task failed: {e}")))?
    }
}

fn availability(status: HealthStatus) -> ProviderAvailability {
    ProviderAvailability {
        available: status.is_available(),
        error: match status {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded => Some("backend reachable but not ready".to_string()),
            HealthStatus::Unhealthy => Some("health check failed".to_string()),
        },
    }
}

/// Detached usage recording: the response never waits on accounting, and
/// nothing here can unwind the request path.
fn record_usage_detached(ledger: Arc<UsageLedger>, operation: Operation) {
    tokio::spawn(async move {
        ledger.record_usage(operation);
    });
}
