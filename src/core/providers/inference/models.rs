//! Inference service wire types
//!
//! The self-hosted service speaks snake_case with `x`/`y` bounding boxes
//! and every similarity/confidence on the 0.0-1.0 scale. Conversion
//! rescales each numeric field independently and backfills the attribute
//! detail the sparse backend does not report.

use serde::{Deserialize, Serialize};

use crate::core::normalize::{ratio_to_percent, require};
use crate::core::types::{
    AgeRange, AttributeFlag, BoundingBox, EngineResult, Face, FaceComparisonResult, FaceDetails,
    FaceMatch, GenderGuess, Landmark, Pose, Quality,
};

const PROVIDER: &str = "inference";

/// Two faces closer than this (fractional coordinates) are considered the
/// same face when splitting matched from unmatched target faces.
const SAME_FACE_EPSILON: f64 = 0.01;

#[derive(Debug, Serialize)]
pub(crate) struct CompareRequest<'a> {
    pub source_image: &'a str,
    pub target_image: &'a str,
    pub similarity_threshold: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetectRequest<'a> {
    pub image: &'a str,
    pub include_landmarks: bool,
    pub include_attributes: bool,
    pub max_faces: u32,
}

/// Standard response envelope of the inference service.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ApiError {
    pub(crate) fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unspecified backend error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireBox {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl WireBox {
    /// `x`/`y` map to canonical `left`/`top`; sizes pass through.
    fn into_canonical(self, path: &str) -> EngineResult<BoundingBox> {
        Ok(BoundingBox {
            left: require(self.x, PROVIDER, &format!("{path}.x"))?,
            top: require(self.y, PROVIDER, &format!("{path}.y"))?,
            width: require(self.width, PROVIDER, &format!("{path}.width"))?,
            height: require(self.height, PROVIDER, &format!("{path}.height"))?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLandmark {
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGender {
    pub value: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFace {
    pub bounding_box: Option<WireBox>,
    pub confidence: Option<f64>,
    pub age: Option<f64>,
    pub gender: Option<WireGender>,
    pub landmarks: Option<Vec<WireLandmark>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMatch {
    pub similarity: Option<f64>,
    pub bounding_box: Option<WireBox>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComparisonData {
    pub similarity: Option<f64>,
    pub face_matches: Option<Vec<WireMatch>>,
    pub source_face: Option<WireFace>,
    pub target_faces: Option<Vec<WireFace>>,
}

impl ComparisonData {
    pub(crate) fn into_canonical(self) -> EngineResult<FaceComparisonResult> {
        let similarity =
            ratio_to_percent(require(self.similarity, PROVIDER, "data.similarity")?);

        let wire_matches = self.face_matches.unwrap_or_default();
        let mut matched_boxes = Vec::with_capacity(wire_matches.len());
        let mut face_matches = Vec::with_capacity(wire_matches.len());
        for (i, wire) in wire_matches.into_iter().enumerate() {
            let path = format!("data.face_matches[{i}]");
            let bounding_box = require(wire.bounding_box, PROVIDER, &format!("{path}.bounding_box"))?
                .into_canonical(&format!("{path}.bounding_box"))?;
            let match_similarity =
                require(wire.similarity, PROVIDER, &format!("{path}.similarity"))?;
            let confidence = require(wire.confidence, PROVIDER, &format!("{path}.confidence"))?;
            matched_boxes.push(bounding_box);
            face_matches.push(FaceMatch {
                similarity: ratio_to_percent(match_similarity),
                face: Face {
                    bounding_box,
                    confidence: ratio_to_percent(confidence),
                    landmarks: None,
                    pose: None,
                    quality: None,
                },
            });
        }

        let source_image_face = match self.source_face {
            Some(wire) => {
                let bounding_box =
                    require(wire.bounding_box, PROVIDER, "data.source_face.bounding_box")?
                        .into_canonical("data.source_face.bounding_box")?;
                let confidence =
                    require(wire.confidence, PROVIDER, "data.source_face.confidence")?;
                Some(Face {
                    bounding_box,
                    confidence: ratio_to_percent(confidence),
                    landmarks: None,
                    pose: None,
                    quality: None,
                })
            }
            None => None,
        };

        // Target faces that line up with a match are already represented in
        // face_matches; the rest are unmatched.
        let mut unmatched_faces = Vec::new();
        for (i, wire) in self.target_faces.unwrap_or_default().into_iter().enumerate() {
            let path = format!("data.target_faces[{i}]");
            let bounding_box = require(wire.bounding_box, PROVIDER, &format!("{path}.bounding_box"))?
                .into_canonical(&format!("{path}.bounding_box"))?;
            let confidence = require(wire.confidence, PROVIDER, &format!("{path}.confidence"))?;

            let matched = matched_boxes.iter().any(|m| {
                (m.left - bounding_box.left).abs() < SAME_FACE_EPSILON
                    && (m.top - bounding_box.top).abs() < SAME_FACE_EPSILON
            });
            if !matched {
                unmatched_faces.push(Face {
                    bounding_box,
                    confidence: ratio_to_percent(confidence),
                    landmarks: None,
                    pose: None,
                    quality: None,
                });
            }
        }

        Ok(FaceComparisonResult {
            similarity,
            face_matches,
            source_image_face,
            unmatched_faces,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectionData {
    pub faces: Option<Vec<WireFace>>,
}

impl DetectionData {
    pub(crate) fn into_canonical(self) -> EngineResult<Vec<FaceDetails>> {
        self.faces
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, wire)| wire_face_to_details(wire, &format!("data.faces[{i}]")))
            .collect()
    }
}

/// Backfill the attribute set the backend does not report, matching the
/// values the product always used for this provider: a ±5 year age
/// bracket, no emotions, neutral attribute flags, open eyes at 90,
/// zeroed pose, 75/75 quality.
fn wire_face_to_details(wire: WireFace, path: &str) -> EngineResult<FaceDetails> {
    let bounding_box = require(wire.bounding_box, PROVIDER, &format!("{path}.bounding_box"))?
        .into_canonical(&format!("{path}.bounding_box"))?;
    let confidence = require(wire.confidence, PROVIDER, &format!("{path}.confidence"))?;

    let age_range = wire
        .age
        .map(|age| AgeRange {
            low: (age - 5.0).max(0.0) as u32,
            high: (age + 5.0).min(120.0) as u32,
        })
        .unwrap_or_default();

    let gender = wire
        .gender
        .map(|g| GenderGuess {
            value: g.value.unwrap_or_else(|| "Unknown".to_string()),
            confidence: ratio_to_percent(g.confidence.unwrap_or(0.0)),
        })
        .unwrap_or_default();

    let landmarks = wire
        .landmarks
        .unwrap_or_default()
        .into_iter()
        .filter_map(|l| match (l.kind, l.x, l.y) {
            (Some(kind), Some(x), Some(y)) => Some(Landmark { kind, x, y }),
            _ => None,
        })
        .collect();

    Ok(FaceDetails {
        age_range,
        gender,
        emotions: Vec::new(),
        smile: AttributeFlag::default(),
        eyeglasses: AttributeFlag::default(),
        sunglasses: AttributeFlag::default(),
        beard: AttributeFlag::default(),
        mustache: AttributeFlag::default(),
        eyes_open: AttributeFlag::new(true, 90.0),
        mouth_open: AttributeFlag::default(),
        bounding_box,
        landmarks,
        pose: Pose::default(),
        quality: Quality {
            brightness: 75.0,
            sharpness: 75.0,
        },
        confidence: ratio_to_percent(confidence),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: Option<String>,
    pub model_loaded: Option<bool>,
}

impl HealthResponse {
    pub(crate) fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy") && self.model_loaded == Some(true)
    }
}
