//! Cross-provider response normalization
//!
//! The two backends disagree on almost everything: the cloud service
//! reports similarities and confidences in `[0, 100]` with `Left`/`Top`
//! bounding boxes, the self-hosted service reports `[0, 1]` with `x`/`y`.
//! The helpers here unify scales and names into the canonical model.
//!
//! Scale rules are applied per field, never per response: a response may
//! mix sub-objects sourced from different scales.

use std::cmp::Ordering;

use crate::core::types::{BestMatch, EngineError, EngineResult, SimilarityResult};

/// Convert a `[0, 1]` ratio into a `[0, 100]` percentage, clamped.
pub fn ratio_to_percent(value: f64) -> f64 {
    (value * 100.0).clamp(0.0, 100.0)
}

/// Clamp a value already expressed as a percentage into `[0, 100]`.
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Convert a canonical `[0, 100]` threshold into a `[0, 1]` ratio for
/// backends with native ratio scales.
pub fn percent_to_ratio(value: f64) -> f64 {
    (value / 100.0).clamp(0.0, 1.0)
}

/// Extract a required wire field, failing with the offending field path
/// when the backend omitted it. Adapters must never default a required
/// field: a hole here means schema drift, which has to surface.
pub fn require<T>(value: Option<T>, provider: &str, path: &str) -> EngineResult<T> {
    value.ok_or_else(|| EngineError::normalization(provider, path, "required field missing"))
}

/// Sort find-similar matches descending by similarity; equal similarities
/// keep ascending candidate order so the result is deterministic.
pub fn sort_matches(matches: &mut [SimilarityResult]) {
    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then(a.image_index.cmp(&b.image_index))
    });
}

/// The first element of a sorted match list, if any.
pub fn best_match(matches: &[SimilarityResult]) -> Option<BestMatch> {
    matches.first().map(|m| BestMatch {
        image_index: m.image_index,
        similarity: m.similarity,
    })
}

/// Strip a `data:image/...;base64,` prefix, leaving the bare payload.
pub fn strip_data_uri(image: &str) -> &str {
    if image.starts_with("data:") {
        match image.find(";base64,") {
            Some(idx) => &image[idx + ";base64,".len()..],
            None => image,
        }
    } else {
        image
    }
}

/// Ensure an image payload carries a data-URI prefix, adding the JPEG
/// default when bare (the self-hosted service expects data URIs).
pub fn ensure_data_uri(image: &str) -> String {
    if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{image}")
    }
}
