//! Canonical face-analysis result model
//!
//! Both backends speak different wire schemas (field names, coordinate
//! conventions, similarity scales). Everything the engine returns is
//! expressed in the types below: coordinates are fractions of the image
//! dimensions in `[0, 1]`, similarities and confidences are percentages
//! in `[0, 100]`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Face bounding box, all values fractions of the image dimensions.
///
/// Invariant: `left + width <= 1` and `top + height <= 1`, tolerant of
/// adapter rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Named facial landmark in fractional image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Point name as reported by the backend (e.g. `eyeLeft`, `nose`).
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
}

/// Head pose in degrees, each axis in `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub roll: f64,
    pub yaw: f64,
    pub pitch: f64,
}

/// Image quality signals, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    pub brightness: f64,
    pub sharpness: f64,
}

/// A detected face with optional geometry detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    pub bounding_box: BoundingBox,
    /// Detection confidence, normalized to `[0, 100]`.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Landmark>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<Pose>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
}

/// A face in the target image that matched the source face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMatch {
    /// Match similarity, normalized to `[0, 100]`.
    pub similarity: f64,
    pub face: Face,
}

/// Result of comparing one source image against one target image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceComparisonResult {
    /// Best match similarity, `0` when nothing matched.
    pub similarity: f64,
    /// Matches in descending similarity order.
    pub face_matches: Vec<FaceMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image_face: Option<Face>,
    /// Target-image faces that did not match the source face.
    pub unmatched_faces: Vec<Face>,
}

impl FaceComparisonResult {
    /// An empty comparison: no faces found on either side, no error.
    pub fn empty() -> Self {
        Self {
            similarity: 0.0,
            face_matches: Vec::new(),
            source_image_face: None,
            unmatched_faces: Vec::new(),
        }
    }
}

/// Estimated age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRange {
    pub low: u32,
    pub high: u32,
}

/// A boolean facial attribute with detection confidence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFlag {
    pub value: bool,
    pub confidence: f64,
}

impl AttributeFlag {
    pub fn new(value: bool, confidence: f64) -> Self {
        Self { value, confidence }
    }
}

/// Gender guess with confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderGuess {
    pub value: String,
    pub confidence: f64,
}

impl Default for GenderGuess {
    fn default() -> Self {
        Self {
            value: "Unknown".to_string(),
            confidence: 0.0,
        }
    }
}

/// A detected emotion with confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: f64,
}

/// Extended per-face attributes, all confidences in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetails {
    pub age_range: AgeRange,
    pub gender: GenderGuess,
    pub emotions: Vec<Emotion>,
    pub smile: AttributeFlag,
    pub eyeglasses: AttributeFlag,
    pub sunglasses: AttributeFlag,
    pub beard: AttributeFlag,
    pub mustache: AttributeFlag,
    pub eyes_open: AttributeFlag,
    pub mouth_open: AttributeFlag,
    pub bounding_box: BoundingBox,
    pub landmarks: Vec<Landmark>,
    pub pose: Pose,
    pub quality: Quality,
    /// Overall detection confidence, normalized to `[0, 100]`.
    pub confidence: f64,
}

/// One candidate's similarity against the source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResult {
    /// Zero-based index into the candidate list as submitted.
    pub image_index: usize,
    /// Similarity in `[0, 100]`.
    pub similarity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_details: Option<FaceDetails>,
}

/// The winning candidate of a find-similar request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMatch {
    pub image_index: usize,
    pub similarity: f64,
}

/// Find-similar response: matches sorted descending by similarity,
/// ties broken by ascending candidate index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindSimilarResponse {
    pub matches: Vec<SimilarityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match: Option<BestMatch>,
}

/// The two face-analysis backends. A closed set: the router holds one
/// instance of each and never dispatches beyond these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Metered cloud vision service (AWS Rekognition).
    Rekognition,
    /// Self-hosted inference service.
    Inference,
}

impl ProviderKind {
    /// The other member of the pair, used for fallback.
    pub fn other(self) -> Self {
        match self {
            Self::Rekognition => Self::Inference,
            Self::Inference => Self::Rekognition,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rekognition => "rekognition",
            Self::Inference => "inference",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rekognition" | "aws" | "cloud" => Ok(Self::Rekognition),
            "inference" | "self-hosted" | "selfhosted" => Ok(Self::Inference),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// The three billable engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "detectFaces")]
    DetectFaces,
    #[serde(rename = "compareFaces")]
    CompareFaces,
    #[serde(rename = "findSimilarFaces")]
    FindSimilarFaces,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::DetectFaces,
        Operation::CompareFaces,
        Operation::FindSimilarFaces,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DetectFaces => "detectFaces",
            Self::CompareFaces => "compareFaces",
            Self::FindSimilarFaces => "findSimilarFaces",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A result annotated with which provider actually served it.
///
/// Callers that only care about the payload use `.result`; the provider
/// and fallback flag are observability extras, never required branching.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Routed<T> {
    pub result: T,
    /// The provider that produced the result.
    pub provider: ProviderKind,
    /// Whether the secondary provider served this after a primary outage.
    pub used_fallback: bool,
}

/// Provider health as seen by a lightweight probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Unhealthy)
    }
}

/// Availability of a single provider for the status surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot of both providers plus the configured default, for the
/// operational status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub rekognition: ProviderAvailability,
    pub inference: ProviderAvailability,
    pub default_provider: ProviderKind,
    pub operation_overrides: HashMap<Operation, ProviderKind>,
}
