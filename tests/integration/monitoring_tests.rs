//! Monitoring facade tests
//!
//! Cloud billing/metrics pass-through against a local mock server, and
//! the guarantee that remote failures never hide local accounting.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use facegate::{
    CloudCostClient, CostMonitor, Operation, PriceTable, RekognitionConfig,
};

use crate::common::fixed_ledger;

fn cloud_client(cost_explorer: String, cloudwatch: String) -> CloudCostClient {
    let config = RekognitionConfig {
        access_key_id: "AKIATEST".to_string(),
        secret_access_key: "secret".to_string(),
        ..RekognitionConfig::default()
    };
    CloudCostClient::with_endpoints(&config, cost_explorer, cloudwatch).unwrap()
}

#[tokio::test]
async fn billed_costs_parse_daily_series() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(
            "x-amz-target",
            "AWSInsightsIndexService.GetCostAndUsage",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResultsByTime": [
                {
                    "TimePeriod": {"Start": "2026-08-05", "End": "2026-08-06"},
                    "Total": {"UnblendedCost": {"Amount": "0.125", "Unit": "USD"}}
                },
                {
                    "TimePeriod": {"Start": "2026-08-06", "End": "2026-08-07"},
                    "Total": {"UnblendedCost": {"Amount": "0.250", "Unit": "USD"}}
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = cloud_client(server.uri(), server.uri());
    let (ledger, _clock) = fixed_ledger();
    let monitor = CostMonitor::new(ledger, PriceTable::default(), Some(client));

    let costs = monitor.rekognition_costs(7).await.unwrap();
    assert_eq!(costs.len(), 2);
    assert_eq!(costs[0].date, "2026-08-05");
    assert_eq!(costs[0].amount, 0.125);
    assert_eq!(costs[1].amount, 0.250);
    assert_eq!(costs[0].service, "Amazon Rekognition");
}

#[tokio::test]
async fn metric_series_comes_back_sorted_ascending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(
            "x-amz-target",
            "GraniteServiceVersion20100801.GetMetricStatistics",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Datapoints": [
                {"Timestamp": "2026-08-07T10:00:00Z", "Sum": 42.0, "Unit": "Count"},
                {"Timestamp": "2026-08-07T08:00:00Z", "Sum": 10.0, "Unit": "Count"},
                {"Timestamp": "2026-08-07T09:00:00Z", "Average": 3.5, "Unit": "Count"}
            ]
        })))
        .mount(&server)
        .await;

    let client = cloud_client(server.uri(), server.uri());
    let (ledger, _clock) = fixed_ledger();
    let monitor = CostMonitor::new(ledger, PriceTable::default(), Some(client));

    let points = monitor
        .rekognition_metrics("SuccessfulRequestCount", 24)
        .await
        .unwrap();
    assert_eq!(points.len(), 3);
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![10.0, 3.5, 42.0]);
    assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn metric_names_are_listed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(
            "x-amz-target",
            "GraniteServiceVersion20100801.ListMetrics",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Metrics": [
                {"Namespace": "AWS/Rekognition", "MetricName": "SuccessfulRequestCount"},
                {"Namespace": "AWS/Rekognition", "MetricName": "ServerErrorCount"}
            ]
        })))
        .mount(&server)
        .await;

    let client = cloud_client(server.uri(), server.uri());
    let (ledger, _clock) = fixed_ledger();
    let monitor = CostMonitor::new(ledger, PriceTable::default(), Some(client));

    let metrics = monitor.list_rekognition_metrics().await.unwrap();
    let names: Vec<&str> = metrics.iter().map(|m| m.metric_name.as_str()).collect();
    assert_eq!(names, vec!["SuccessfulRequestCount", "ServerErrorCount"]);
}

#[tokio::test]
async fn remote_outage_never_blocks_local_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("billing API down"))
        .mount(&server)
        .await;

    let client = cloud_client(server.uri(), server.uri());
    let (ledger, _clock) = fixed_ledger();
    ledger.record_usage(Operation::CompareFaces);
    ledger.record_usage(Operation::DetectFaces);

    let monitor = CostMonitor::new(Arc::clone(&ledger), PriceTable::default(), Some(client));
    let reconciliation = monitor.reconcile(7).await;

    assert_eq!(reconciliation.local.len(), 7);
    let today = &reconciliation.local[6];
    assert_eq!(today.usage.compare_faces, 1);
    assert_eq!(today.usage.detect_faces, 1);
    assert!((today.estimated_cost_usd - 0.002).abs() < 1e-12);
    assert!(reconciliation.remote.is_none());
    assert!(reconciliation.remote_error.as_deref().unwrap().contains("503"));

    // Direct remote queries surface the failure to the caller.
    assert!(monitor.rekognition_costs(7).await.is_err());
    // Local summary is still served.
    let summary = monitor.cost_summary();
    assert!((summary.today - 0.002).abs() < 1e-12);
}
