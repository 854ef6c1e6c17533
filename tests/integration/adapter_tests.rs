//! Provider adapter tests against a local mock HTTP server
//!
//! Exercise the real adapters end to end: wire-format translation,
//! per-field scale conversion, error mapping, and the find-similar
//! composition.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use facegate::{
    EngineError, FaceAnalysisProvider, HealthStatus, InferenceConfig, InferenceProvider,
    ProviderKind, RekognitionConfig, RekognitionProvider,
};

fn inference_provider(base_url: String) -> InferenceProvider {
    InferenceProvider::new(&InferenceConfig {
        base_url,
        timeout_secs: 5,
        connect_timeout_secs: 5,
        health_timeout_secs: 2,
    })
    .unwrap()
}

fn rekognition_provider(endpoint: String) -> RekognitionProvider {
    let config = RekognitionConfig {
        access_key_id: "AKIATEST".to_string(),
        secret_access_key: "secret".to_string(),
        ..RekognitionConfig::default()
    };
    RekognitionProvider::with_endpoint(&config, endpoint).unwrap()
}

#[tokio::test]
async fn inference_compare_rescales_and_converts_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compare-faces"))
        // Canonical threshold 1.0 must arrive as the 0.01 ratio.
        .and(body_partial_json(json!({"similarity_threshold": 0.01})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "similarity": 0.87,
                "confidence": 0.99,
                "face_matches": [{
                    "similarity": 0.87,
                    "bounding_box": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4},
                    "confidence": 0.95
                }],
                "source_face": {
                    "bounding_box": {"x": 0.0, "y": 0.0, "width": 0.5, "height": 0.6},
                    "confidence": 0.98
                },
                "target_faces": []
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = inference_provider(server.uri());
    let result = provider.compare_faces("src", "dst", 1.0).await.unwrap();

    assert_eq!(result.similarity, 87.0);
    assert_eq!(result.face_matches[0].face.confidence, 95.0);
    assert_eq!(result.face_matches[0].face.bounding_box.left, 0.1);
    assert_eq!(result.face_matches[0].face.bounding_box.top, 0.2);
    assert_eq!(result.source_image_face.unwrap().confidence, 98.0);
}

#[tokio::test]
async fn inference_compare_with_no_faces_succeeds_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compare-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "similarity": 0.0,
                "confidence": 0.0,
                "face_matches": [],
                "target_faces": []
            }
        })))
        .mount(&server)
        .await;

    let provider = inference_provider(server.uri());
    let result = provider.compare_faces("src", "dst", 1.0).await.unwrap();

    assert_eq!(result.similarity, 0.0);
    assert!(result.face_matches.is_empty());
    assert!(result.unmatched_faces.is_empty());
}

#[tokio::test]
async fn inference_server_error_is_fallback_eligible() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compare-faces"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let provider = inference_provider(server.uri());
    let err = provider.compare_faces("src", "dst", 1.0).await.unwrap_err();
    assert!(err.is_fallback_eligible());
}

#[tokio::test]
async fn inference_validation_error_is_invalid_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compare-faces"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"msg": "source_image is not a valid image"}]
        })))
        .mount(&server)
        .await;

    let provider = inference_provider(server.uri());
    let err = provider.compare_faces("src", "dst", 1.0).await.unwrap_err();
    match err {
        EngineError::InvalidInput { message, .. } => {
            assert!(message.contains("not a valid image"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn inference_failure_envelope_is_invalid_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compare-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"code": "NO_FACE_DETECTED", "message": "no face found in source image"}
        })))
        .mount(&server)
        .await;

    let provider = inference_provider(server.uri());
    let err = provider.compare_faces("src", "dst", 1.0).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput { .. }));
}

#[tokio::test]
async fn inference_missing_required_field_is_schema_drift() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compare-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"face_matches": [], "target_faces": []}
        })))
        .mount(&server)
        .await;

    let provider = inference_provider(server.uri());
    let err = provider.compare_faces("src", "dst", 1.0).await.unwrap_err();
    match err {
        EngineError::Normalization { path, .. } => assert_eq!(path, "data.similarity"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn inference_timeout_is_provider_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compare-faces"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": {}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = InferenceProvider::new(&InferenceConfig {
        base_url: server.uri(),
        timeout_secs: 1,
        connect_timeout_secs: 1,
        health_timeout_secs: 1,
    })
    .unwrap();

    let err = provider.compare_faces("src", "dst", 1.0).await.unwrap_err();
    assert!(err.is_fallback_eligible());
}

#[tokio::test]
async fn inference_find_similar_composes_and_ranks() {
    let server = MockServer::start().await;

    for (image, similarity) in [("a", 0.9), ("b", 0.9), ("c", 0.4)] {
        Mock::given(method("POST"))
            .and(path("/compare-faces"))
            .and(body_partial_json(json!({
                "target_image": format!("data:image/jpeg;base64,{image}")
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "similarity": similarity,
                    "confidence": 0.99,
                    "face_matches": [],
                    "target_faces": []
                }
            })))
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/detect-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "faces": [{
                    "bounding_box": {"x": 0.1, "y": 0.1, "width": 0.2, "height": 0.3},
                    "confidence": 0.97,
                    "age": 30.0
                }],
                "face_count": 1
            }
        })))
        .mount(&server)
        .await;

    let provider = inference_provider(server.uri());
    let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let response = provider.find_similar_faces("source", &candidates).await.unwrap();

    let ranking: Vec<(usize, f64)> = response
        .matches
        .iter()
        .map(|m| (m.image_index, m.similarity))
        .collect();
    assert_eq!(ranking, vec![(0, 90.0), (1, 90.0), (2, 40.0)]);
    assert_eq!(response.best_match.unwrap().image_index, 0);
    assert!(response.matches.iter().all(|m| m.face_details.is_some()));
}

#[tokio::test]
async fn inference_health_probe_states() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy", "model_loaded": true
        })))
        .mount(&server)
        .await;
    assert_eq!(
        inference_provider(server.uri()).health_check().await,
        HealthStatus::Healthy
    );

    let loading = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy", "model_loaded": false
        })))
        .mount(&loading)
        .await;
    assert_eq!(
        inference_provider(loading.uri()).health_check().await,
        HealthStatus::Degraded
    );

    // Nothing listening at all.
    assert_eq!(
        inference_provider("http://127.0.0.1:9".to_string())
            .health_check()
            .await,
        HealthStatus::Unhealthy
    );
}

#[tokio::test]
async fn rekognition_compare_sends_signed_target_and_normalizes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "RekognitionService.CompareFaces"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(body_partial_json(json!({"SimilarityThreshold": 1.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "FaceMatches": [{
                "Similarity": 96.5,
                "Face": {
                    "BoundingBox": {"Width": 0.3, "Height": 0.4, "Left": 0.1, "Top": 0.2},
                    "Confidence": 99.8
                }
            }],
            "SourceImageFace": {
                "BoundingBox": {"Width": 0.5, "Height": 0.5, "Left": 0.0, "Top": 0.0},
                "Confidence": 99.0
            },
            "UnmatchedFaces": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = rekognition_provider(server.uri());
    let result = provider.compare_faces("src", "dst", 1.0).await.unwrap();

    assert_eq!(result.similarity, 96.5);
    assert_eq!(result.face_matches[0].face.bounding_box.left, 0.1);
    assert!(result.source_image_face.is_some());
}

#[tokio::test]
async fn rekognition_detect_strips_data_uri_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "RekognitionService.DetectFaces"))
        .and(body_partial_json(json!({"Image": {"Bytes": "QUJD"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "FaceDetails": [{
                "BoundingBox": {"Width": 0.2, "Height": 0.3, "Left": 0.1, "Top": 0.1},
                "Confidence": 99.9
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = rekognition_provider(server.uri());
    let faces = provider
        .detect_faces("data:image/png;base64,QUJD")
        .await
        .unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].confidence, 99.9);
}

#[tokio::test]
async fn rekognition_invalid_parameter_is_invalid_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "InvalidParameterException",
            "Message": "Request has invalid parameters"
        })))
        .mount(&server)
        .await;

    let provider = rekognition_provider(server.uri());
    let err = provider.compare_faces("src", "dst", 1.0).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput { .. }));
    assert!(!err.is_fallback_eligible());
}

#[tokio::test]
async fn rekognition_server_error_is_fallback_eligible() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "__type": "InternalServerError"
        })))
        .mount(&server)
        .await;

    let provider = rekognition_provider(server.uri());
    let err = provider.detect_faces("img").await.unwrap_err();
    assert!(err.is_fallback_eligible());
}

#[tokio::test]
async fn rekognition_health_reflects_credentials() {
    let with_creds = rekognition_provider("http://127.0.0.1:9".to_string());
    assert_eq!(with_creds.health_check().await, HealthStatus::Healthy);
    assert_eq!(with_creds.kind(), ProviderKind::Rekognition);

    let without = RekognitionProvider::new(&RekognitionConfig::default()).unwrap();
    assert_eq!(without.health_check().await, HealthStatus::Unhealthy);
}
