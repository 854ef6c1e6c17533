//! Provider capability interface
//!
//! One trait, three operations, two implementations. The router holds a
//! pair of `Arc<dyn FaceAnalysisProvider>` and never needs open-ended
//! plugin dispatch.

use async_trait::async_trait;

use crate::core::normalize::{best_match, sort_matches};
use crate::core::types::{
    EngineError, EngineResult, FaceComparisonResult, FaceDetails, FindSimilarResponse,
    HealthStatus, ProviderKind, SimilarityResult,
};

/// Permissive default similarity threshold on the canonical `[0, 100]`
/// scale, so a comparison with no matching face returns an empty result
/// instead of an error.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 1.0;

/// Upper bound on the find-similar candidate list.
pub const MAX_FIND_SIMILAR_CANDIDATES: usize = 10;

/// Reject an out-of-bounds candidate list before any billable call.
pub fn validate_candidates(candidates: &[String]) -> EngineResult<()> {
    if candidates.is_empty() || candidates.len() > MAX_FIND_SIMILAR_CANDIDATES {
        return Err(EngineError::invalid_input(
            "targetImages",
            format!(
                "candidate count must be between 1 and {MAX_FIND_SIMILAR_CANDIDATES}, got {}",
                candidates.len()
            ),
        ));
    }
    Ok(())
}

/// A face-analysis backend.
///
/// Images are opaque base64 text payloads, already size-reduced by the
/// caller; adapters never re-encode or re-compress them. Every call is
/// billable on the backend side.
#[async_trait]
pub trait FaceAnalysisProvider: Send + Sync {
    /// Stable identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    fn kind(&self) -> ProviderKind;

    /// Detect all faces in an image with full attribute detail.
    async fn detect_faces(&self, image: &str) -> EngineResult<Vec<FaceDetails>>;

    /// Compare the largest face in the source image against faces in the
    /// target image. `similarity_threshold` is on the canonical `[0, 100]`
    /// scale; adapters convert to their backend's native scale.
    async fn compare_faces(
        &self,
        source_image: &str,
        target_image: &str,
        similarity_threshold: f64,
    ) -> EngineResult<FaceComparisonResult>;

    /// Rank 1..=10 candidate images by similarity to the source face.
    ///
    /// Composed from `compare_faces` + `detect_faces` per candidate on
    /// both backends. A candidate the backend rejects as unusable (no
    /// face, bad image) is skipped rather than failing the whole request;
    /// outages and schema errors propagate.
    async fn find_similar_faces(
        &self,
        source_image: &str,
        candidate_images: &[String],
    ) -> EngineResult<FindSimilarResponse> {
        validate_candidates(candidate_images)?;

        let mut matches = Vec::with_capacity(candidate_images.len());
        for (image_index, candidate) in candidate_images.iter().enumerate() {
            let comparison = match self
                .compare_faces(source_image, candidate, DEFAULT_SIMILARITY_THRESHOLD)
                .await
            {
                Ok(comparison) => comparison,
                Err(EngineError::InvalidInput { .. }) => continue,
                Err(err) => return Err(err),
            };

            let face_details = match self.detect_faces(candidate).await {
                Ok(faces) => faces.into_iter().next(),
                Err(EngineError::InvalidInput { .. }) => None,
                Err(err) => return Err(err),
            };

            matches.push(SimilarityResult {
                image_index,
                similarity: comparison.similarity,
                face_details,
            });
        }

        sort_matches(&mut matches);
        let best_match = best_match(&matches);
        Ok(FindSimilarResponse { matches, best_match })
    }

    /// Cheap availability probe; must not spend backend quota.
    async fn health_check(&self) -> HealthStatus;
}
