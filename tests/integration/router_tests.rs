//! Router integration tests
//!
//! Routing, fallback, and usage-recording behavior over scripted mock
//! providers.

use std::sync::Arc;

use facegate::{
    FaceAnalysisProvider, HybridRouter, Operation, PriceTable, ProviderKind, RoutingConfig,
};

use crate::common::providers::{Failure, MockProvider};
use crate::common::{fixed_ledger, wait_for_count};

fn build_router(
    rekognition: &Arc<MockProvider>,
    inference: &Arc<MockProvider>,
    ledger: Arc<facegate::UsageLedger>,
    routing: RoutingConfig,
) -> HybridRouter {
    HybridRouter::with_providers(
        routing,
        PriceTable::default(),
        Arc::clone(rekognition) as Arc<dyn FaceAnalysisProvider>,
        Arc::clone(inference) as Arc<dyn FaceAnalysisProvider>,
        ledger,
    )
}

/// Backend raw ranking [c:40, a:90, b:90] must come back ordered
/// [a, b, c]: descending similarity, ties broken by candidate index.
#[tokio::test]
async fn find_similar_ranks_with_deterministic_tie_break() {
    let rekognition = Arc::new(
        MockProvider::new(ProviderKind::Rekognition)
            .with_similarity("a", 90.0)
            .with_similarity("b", 90.0)
            .with_similarity("c", 40.0),
    );
    let inference = Arc::new(MockProvider::new(ProviderKind::Inference));
    let (ledger, _clock) = fixed_ledger();
    let router = build_router(
        &rekognition,
        &inference,
        Arc::clone(&ledger),
        RoutingConfig::default(),
    );

    let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let routed = router.find_similar_faces("source", &candidates).await.unwrap();
    let response = routed.result;

    let ranking: Vec<(usize, f64)> = response
        .matches
        .iter()
        .map(|m| (m.image_index, m.similarity))
        .collect();
    assert_eq!(ranking, vec![(0, 90.0), (1, 90.0), (2, 40.0)]);

    let best = response.best_match.unwrap();
    assert_eq!(best.image_index, 0);
    assert_eq!(best.similarity, 90.0);

    // One comparison and one detail lookup per candidate.
    assert_eq!(rekognition.compare_calls(), 3);
    assert_eq!(rekognition.detect_calls(), 3);
    assert_eq!(inference.compare_calls(), 0);

    // One logical operation, one usage unit.
    wait_for_count(&ledger, Some(Operation::FindSimilarFaces), 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_requests_each_record_usage() {
    let rekognition = Arc::new(MockProvider::new(ProviderKind::Rekognition));
    let inference = Arc::new(MockProvider::new(ProviderKind::Inference));
    let (ledger, _clock) = fixed_ledger();
    let router = Arc::new(build_router(
        &rekognition,
        &inference,
        Arc::clone(&ledger),
        RoutingConfig::default(),
    ));

    let tasks: Vec<_> = (0..25)
        .map(|_| {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.compare_faces("src", "dst", None).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(rekognition.compare_calls(), 25);
    wait_for_count(&ledger, Some(Operation::CompareFaces), 25).await;
}

#[tokio::test]
async fn operation_override_pins_detect_to_inference() {
    let rekognition = Arc::new(MockProvider::new(ProviderKind::Rekognition));
    let inference = Arc::new(MockProvider::new(ProviderKind::Inference));
    let (ledger, _clock) = fixed_ledger();

    let mut routing = RoutingConfig::default();
    routing
        .operation_overrides
        .insert(Operation::DetectFaces, ProviderKind::Inference);
    let router = build_router(&rekognition, &inference, Arc::clone(&ledger), routing);

    let routed = router.detect_faces("img").await.unwrap();
    assert_eq!(routed.provider, ProviderKind::Inference);
    assert_eq!(inference.detect_calls(), 1);
    assert_eq!(rekognition.detect_calls(), 0);

    // The compare path still follows the default.
    let routed = router.compare_faces("src", "dst", None).await.unwrap();
    assert_eq!(routed.provider, ProviderKind::Rekognition);
}

#[tokio::test]
async fn find_similar_falls_back_and_records_once() {
    let rekognition = Arc::new(
        MockProvider::new(ProviderKind::Rekognition).failing_with(Failure::Unavailable),
    );
    let inference = Arc::new(
        MockProvider::new(ProviderKind::Inference)
            .with_similarity("a", 75.0)
            .with_similarity("b", 25.0),
    );
    let (ledger, _clock) = fixed_ledger();
    let router = build_router(
        &rekognition,
        &inference,
        Arc::clone(&ledger),
        RoutingConfig::default(),
    );

    let candidates = vec!["a".to_string(), "b".to_string()];
    let routed = router.find_similar_faces("source", &candidates).await.unwrap();

    assert!(routed.used_fallback);
    assert_eq!(routed.provider, ProviderKind::Inference);
    assert_eq!(routed.result.matches.len(), 2);
    // Primary died on its first comparison; it was not retried further.
    assert_eq!(rekognition.compare_calls(), 1);
    assert_eq!(inference.compare_calls(), 2);

    // Exactly one usage unit despite the two invocation attempts.
    wait_for_count(&ledger, Some(Operation::FindSimilarFaces), 1).await;
    assert_eq!(ledger.count_today(None), 1);
}

#[tokio::test]
async fn provider_status_reflects_backend_health() {
    let rekognition = Arc::new(MockProvider::new(ProviderKind::Rekognition));
    let inference = Arc::new(
        MockProvider::new(ProviderKind::Inference).failing_with(Failure::Unavailable),
    );
    let (ledger, _clock) = fixed_ledger();
    let router = build_router(
        &rekognition,
        &inference,
        ledger,
        RoutingConfig::default(),
    );

    let status = router.provider_status().await;
    assert!(status.rekognition.available);
    assert!(status.rekognition.error.is_none());
    assert!(!status.inference.available);
    assert!(status.inference.error.is_some());
    assert_eq!(status.default_provider, ProviderKind::Rekognition);
}
