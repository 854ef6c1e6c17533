//! Rekognition wire types
//!
//! The cloud service speaks PascalCase with every field optional, and all
//! similarity/confidence values already on the 0-100 scale. Conversion to
//! the canonical model clamps each numeric field independently and fails
//! on missing required fields with the offending path.

use serde::Deserialize;

use crate::core::normalize::{clamp_percent, require};
use crate::core::types::{
    AgeRange, AttributeFlag, BoundingBox, Emotion, EngineResult, Face, FaceComparisonResult,
    FaceDetails, FaceMatch, GenderGuess, Landmark, Pose, Quality,
};

const PROVIDER: &str = "rekognition";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireBoundingBox {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

impl WireBoundingBox {
    fn into_canonical(self, path: &str) -> EngineResult<BoundingBox> {
        Ok(BoundingBox {
            left: require(self.left, PROVIDER, &format!("{path}.Left"))?,
            top: require(self.top, PROVIDER, &format!("{path}.Top"))?,
            width: require(self.width, PROVIDER, &format!("{path}.Width"))?,
            height: require(self.height, PROVIDER, &format!("{path}.Height"))?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireComparedFace {
    pub bounding_box: Option<WireBoundingBox>,
    pub confidence: Option<f64>,
}

impl WireComparedFace {
    fn into_canonical(self, path: &str) -> EngineResult<Face> {
        let bounding_box = require(self.bounding_box, PROVIDER, &format!("{path}.BoundingBox"))?
            .into_canonical(&format!("{path}.BoundingBox"))?;
        let confidence = require(self.confidence, PROVIDER, &format!("{path}.Confidence"))?;
        Ok(Face {
            bounding_box,
            confidence: clamp_percent(confidence),
            landmarks: None,
            pose: None,
            quality: None,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireFaceMatch {
    pub similarity: Option<f64>,
    pub face: Option<WireComparedFace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CompareFacesResponse {
    pub face_matches: Option<Vec<WireFaceMatch>>,
    pub source_image_face: Option<WireComparedFace>,
    pub unmatched_faces: Option<Vec<WireComparedFace>>,
}

impl CompareFacesResponse {
    pub(crate) fn into_canonical(self) -> EngineResult<FaceComparisonResult> {
        let mut face_matches = Vec::new();
        for (i, wire) in self.face_matches.unwrap_or_default().into_iter().enumerate() {
            let path = format!("FaceMatches[{i}]");
            let similarity = require(wire.similarity, PROVIDER, &format!("{path}.Similarity"))?;
            let face = require(wire.face, PROVIDER, &format!("{path}.Face"))?
                .into_canonical(&format!("{path}.Face"))?;
            face_matches.push(FaceMatch {
                similarity: clamp_percent(similarity),
                face,
            });
        }

        let source_image_face = match self.source_image_face {
            Some(wire) => Some(wire.into_canonical("SourceImageFace")?),
            None => None,
        };

        let mut unmatched_faces = Vec::new();
        for (i, wire) in self.unmatched_faces.unwrap_or_default().into_iter().enumerate() {
            unmatched_faces.push(wire.into_canonical(&format!("UnmatchedFaces[{i}]"))?);
        }

        Ok(FaceComparisonResult {
            similarity: face_matches.first().map(|m| m.similarity).unwrap_or(0.0),
            face_matches,
            source_image_face,
            unmatched_faces,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireAgeRange {
    pub low: Option<u32>,
    pub high: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireGender {
    pub value: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireEmotion {
    #[serde(rename = "Type")]
    pub kind: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireFlag {
    pub value: Option<bool>,
    pub confidence: Option<f64>,
}

impl WireFlag {
    fn into_canonical(self) -> AttributeFlag {
        AttributeFlag {
            value: self.value.unwrap_or(false),
            confidence: clamp_percent(self.confidence.unwrap_or(0.0)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireLandmark {
    #[serde(rename = "Type")]
    pub kind: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WirePose {
    pub roll: Option<f64>,
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireQuality {
    pub brightness: Option<f64>,
    pub sharpness: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct WireFaceDetail {
    pub age_range: Option<WireAgeRange>,
    pub gender: Option<WireGender>,
    pub emotions: Option<Vec<WireEmotion>>,
    pub smile: Option<WireFlag>,
    pub eyeglasses: Option<WireFlag>,
    pub sunglasses: Option<WireFlag>,
    pub beard: Option<WireFlag>,
    pub mustache: Option<WireFlag>,
    pub eyes_open: Option<WireFlag>,
    pub mouth_open: Option<WireFlag>,
    pub bounding_box: Option<WireBoundingBox>,
    pub landmarks: Option<Vec<WireLandmark>>,
    pub pose: Option<WirePose>,
    pub quality: Option<WireQuality>,
    pub confidence: Option<f64>,
}

impl WireFaceDetail {
    fn into_canonical(self, path: &str) -> EngineResult<FaceDetails> {
        let bounding_box = require(self.bounding_box, PROVIDER, &format!("{path}.BoundingBox"))?
            .into_canonical(&format!("{path}.BoundingBox"))?;
        let confidence = require(self.confidence, PROVIDER, &format!("{path}.Confidence"))?;

        let landmarks = self
            .landmarks
            .unwrap_or_default()
            .into_iter()
            .filter_map(|l| match (l.kind, l.x, l.y) {
                (Some(kind), Some(x), Some(y)) => Some(Landmark { kind, x, y }),
                _ => None,
            })
            .collect();

        Ok(FaceDetails {
            age_range: self
                .age_range
                .map(|r| AgeRange {
                    low: r.low.unwrap_or(0),
                    high: r.high.unwrap_or(0),
                })
                .unwrap_or_default(),
            gender: self
                .gender
                .map(|g| GenderGuess {
                    value: g.value.unwrap_or_else(|| "Unknown".to_string()),
                    confidence: clamp_percent(g.confidence.unwrap_or(0.0)),
                })
                .unwrap_or_default(),
            emotions: self
                .emotions
                .unwrap_or_default()
                .into_iter()
                .filter_map(|e| {
                    e.kind.map(|kind| Emotion {
                        kind,
                        confidence: clamp_percent(e.confidence.unwrap_or(0.0)),
                    })
                })
                .collect(),
            smile: self.smile.map(WireFlag::into_canonical).unwrap_or_default(),
            eyeglasses: self.eyeglasses.map(WireFlag::into_canonical).unwrap_or_default(),
            sunglasses: self.sunglasses.map(WireFlag::into_canonical).unwrap_or_default(),
            beard: self.beard.map(WireFlag::into_canonical).unwrap_or_default(),
            mustache: self.mustache.map(WireFlag::into_canonical).unwrap_or_default(),
            eyes_open: self.eyes_open.map(WireFlag::into_canonical).unwrap_or_default(),
            mouth_open: self.mouth_open.map(WireFlag::into_canonical).unwrap_or_default(),
            bounding_box,
            landmarks,
            pose: self
                .pose
                .map(|p| Pose {
                    roll: p.roll.unwrap_or(0.0),
                    yaw: p.yaw.unwrap_or(0.0),
                    pitch: p.pitch.unwrap_or(0.0),
                })
                .unwrap_or_default(),
            quality: self
                .quality
                .map(|q| Quality {
                    brightness: q.brightness.unwrap_or(0.0),
                    sharpness: q.sharpness.unwrap_or(0.0),
                })
                .unwrap_or(Quality {
                    brightness: 0.0,
                    sharpness: 0.0,
                }),
            confidence: clamp_percent(confidence),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DetectFacesResponse {
    pub face_details: Option<Vec<WireFaceDetail>>,
}

impl DetectFacesResponse {
    pub(crate) fn into_canonical(self) -> EngineResult<Vec<FaceDetails>> {
        self.face_details
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, wire)| wire.into_canonical(&format!("FaceDetails[{i}]")))
            .collect()
    }
}

/// Error body shape for amz-json-1.1 failures.
#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    #[serde(rename = "__type")]
    pub kind: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
}
