//! Scripted mock providers
//!
//! Stand-ins for the two backends with per-image scripted similarities,
//! switchable failure modes, and call counters, so routing behavior can
//! be asserted without any network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use facegate::{
    EngineError, EngineResult, FaceAnalysisProvider, FaceComparisonResult, FaceDetails,
    HealthStatus, ProviderKind,
};

/// Failure mode for a scripted provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unavailable,
    RejectInput,
}

/// A provider whose `compare_faces` similarity is scripted per target
/// image; `detect_faces` returns no faces. Every call is counted.
pub struct MockProvider {
    kind: ProviderKind,
    similarities: HashMap<String, f64>,
    failure: Option<Failure>,
    pub compare_calls: AtomicUsize,
    pub detect_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            similarities: HashMap::new(),
            failure: None,
            compare_calls: AtomicUsize::new(0),
            detect_calls: AtomicUsize::new(0),
        }
    }

    /// Script the similarity returned when comparing against `target`.
    pub fn with_similarity(mut self, target: &str, similarity: f64) -> Self {
        self.similarities.insert(target.to_string(), similarity);
        self
    }

    pub fn failing_with(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn compare_calls(&self) -> usize {
        self.compare_calls.load(Ordering::SeqCst)
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> Option<EngineError> {
        match self.failure {
            Some(Failure::Unavailable) => Some(EngineError::provider_unavailable(
                self.kind.as_str(),
                "scripted outage",
            )),
            Some(Failure::RejectInput) => {
                Some(EngineError::invalid_input("image", "scripted rejection"))
            }
            None => None,
        }
    }
}

#[async_trait]
impl FaceAnalysisProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn detect_faces(&self, _image: &str) -> EngineResult<Vec<FaceDetails>> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail() {
            Some(err) => Err(err),
            None => Ok(Vec::new()),
        }
    }

    async fn compare_faces(
        &self,
        _source_image: &str,
        target_image: &str,
        _similarity_threshold: f64,
    ) -> EngineResult<FaceComparisonResult> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail() {
            return Err(err);
        }
        let mut result = FaceComparisonResult::empty();
        result.similarity = self.similarities.get(target_image).copied().unwrap_or(0.0);
        Ok(result)
    }

    async fn health_check(&self) -> HealthStatus {
        if self.failure.is_some() {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        }
    }
}
