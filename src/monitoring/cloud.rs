//! Cloud billing and metrics clients
//!
//! Signed pass-through queries against the cloud provider's own Cost
//! Explorer and CloudWatch APIs, used to reconcile the local usage
//! ledger against ground truth. Failures here are reported to the
//! caller and never block local accounting.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::config::RekognitionConfig;
use crate::core::types::{EngineError, EngineResult};
use crate::utils::sigv4::SigV4Signer;

/// Cost Explorer is only served from us-east-1.
const COST_EXPLORER_REGION: &str = "us-east-1";

/// Billing line item filter for the face-analysis service.
const BILLED_SERVICE: &str = "Amazon Rekognition";

/// Metric namespace of the cloud vision service.
const METRIC_NAMESPACE: &str = "AWS/Rekognition";

/// One day of billed spend as reported by the billing API.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostData {
    pub date: String,
    pub amount: f64,
    pub unit: String,
    pub service: String,
}

/// One datapoint of a CloudWatch metric series.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub metric_name: String,
    pub value: f64,
    pub unit: String,
}

/// A metric advertised by the cloud service.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDescriptor {
    pub namespace: String,
    pub metric_name: String,
}

/// Signed client for the cloud provider's billing and metrics APIs.
#[derive(Debug, Clone)]
pub struct CloudCostClient {
    http: Client,
    cost_explorer_endpoint: String,
    cloudwatch_endpoint: String,
    cost_explorer_signer: SigV4Signer,
    cloudwatch_signer: SigV4Signer,
}

impl CloudCostClient {
    pub fn new(config: &RekognitionConfig) -> EngineResult<Self> {
        let cost_explorer_endpoint =
            format!("https://ce.{COST_EXPLORER_REGION}.amazonaws.com/");
        let cloudwatch_endpoint =
            format!("https://monitoring.{}.amazonaws.com/", config.region);
        Self::with_endpoints(config, cost_explorer_endpoint, cloudwatch_endpoint)
    }

    /// Build against explicit endpoints; used by tests.
    pub fn with_endpoints(
        config: &RekognitionConfig,
        cost_explorer_endpoint: String,
        cloudwatch_endpoint: String,
    ) -> EngineResult<Self> {
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                EngineError::internal(format!("failed to create cloud metrics client: {e}"))
            })?;

        let cost_explorer_signer = SigV4Signer::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.session_token.clone(),
            COST_EXPLORER_REGION,
            "ce",
        );
        let cloudwatch_signer = SigV4Signer::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.session_token.clone(),
            config.region.clone(),
            "monitoring",
        );

        Ok(Self {
            http,
            cost_explorer_endpoint,
            cloudwatch_endpoint,
            cost_explorer_signer,
            cloudwatch_signer,
        })
    }

    /// Daily billed spend for the face-analysis service over `[start, end)`.
    pub async fn cost_and_usage(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<CostData>> {
        let body = json!({
            "TimePeriod": {
                "Start": start.format("%Y-%m-%d").to_string(),
                "End": end.format("%Y-%m-%d").to_string(),
            },
            "Granularity": "DAILY",
            "Metrics": ["UnblendedCost"],
            "Filter": {
                "Dimensions": {
                    "Key": "SERVICE",
                    "Values": [BILLED_SERVICE],
                }
            }
        });

        let response: GetCostAndUsageResponse = self
            .post_target(
                "cost-explorer",
                &self.cost_explorer_endpoint,
                &self.cost_explorer_signer,
                "AWSInsightsIndexService.GetCostAndUsage",
                "application/x-amz-json-1.1",
                body,
            )
            .await?;

        Ok(response
            .results_by_time
            .unwrap_or_default()
            .into_iter()
            .map(|result| {
                let total = result
                    .total
                    .unwrap_or_default()
                    .remove("UnblendedCost")
                    .unwrap_or_default();
                CostData {
                    date: result
                        .time_period
                        .and_then(|p| p.start)
                        .unwrap_or_default(),
                    amount: total
                        .amount
                        .and_then(|a| a.parse::<f64>().ok())
                        .unwrap_or(0.0),
                    unit: total.unit.unwrap_or_else(|| "USD".to_string()),
                    service: BILLED_SERVICE.to_string(),
                }
            })
            .collect())
    }

    /// Hourly statistics of one metric over `[start, end]`, ascending by
    /// timestamp.
    pub async fn metric_statistics(
        &self,
        metric_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EngineResult<Vec<MetricPoint>> {
        let body = json!({
            "Namespace": METRIC_NAMESPACE,
            "MetricName": metric_name,
            "Dimensions": [],
            "StartTime": start.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "EndTime": end.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "Period": 3600,
            "Statistics": ["Sum", "Average"],
        });

        let response: GetMetricStatisticsResponse = self
            .post_target(
                "cloudwatch",
                &self.cloudwatch_endpoint,
                &self.cloudwatch_signer,
                "GraniteServiceVersion20100801.GetMetricStatistics",
                "application/x-amz-json-1.0",
                body,
            )
            .await?;

        let mut points: Vec<MetricPoint> = response
            .datapoints
            .unwrap_or_default()
            .into_iter()
            .filter_map(|datapoint| {
                let timestamp = datapoint
                    .timestamp
                    .as_deref()
                    .and_then(parse_timestamp)?;
                Some(MetricPoint {
                    timestamp,
                    metric_name: metric_name.to_string(),
                    value: datapoint.sum.or(datapoint.average).unwrap_or(0.0),
                    unit: datapoint.unit.unwrap_or_else(|| "Count".to_string()),
                })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    /// All metrics the cloud service advertises in its namespace.
    pub async fn list_metrics(&self) -> EngineResult<Vec<MetricDescriptor>> {
        let body = json!({ "Namespace": METRIC_NAMESPACE });

        let response: ListMetricsResponse = self
            .post_target(
                "cloudwatch",
                &self.cloudwatch_endpoint,
                &self.cloudwatch_signer,
                "GraniteServiceVersion20100801.ListMetrics",
                "application/x-amz-json-1.0",
                body,
            )
            .await?;

        Ok(response
            .metrics
            .unwrap_or_default()
            .into_iter()
            .filter_map(|metric| {
                Some(MetricDescriptor {
                    namespace: metric.namespace.unwrap_or_else(|| METRIC_NAMESPACE.to_string()),
                    metric_name: metric.metric_name?,
                })
            })
            .collect())
    }

    async fn post_target<T: DeserializeOwned>(
        &self,
        provider: &str,
        endpoint: &str,
        signer: &SigV4Signer,
        target: &str,
        content_type: &str,
        body: Value,
    ) -> EngineResult<T> {
        let body_str = serde_json::to_string(&body)
            .map_err(|e| EngineError::internal(format!("request serialization failed: {e}")))?;

        let mut headers = HashMap::new();
        headers.insert("x-amz-target".to_string(), target.to_string());
        headers.insert("content-type".to_string(), content_type.to_string());

        let signed = signer
            .sign_request("POST", endpoint, &headers, &body_str, Utc::now())
            .map_err(|e| EngineError::internal(format!("request signing failed: {e}")))?;

        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in signed {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(&value),
            ) {
                header_map.insert(name, value);
            }
        }

        debug!(target, "cloud metrics request");
        let response = self
            .http
            .post(endpoint)
            .headers(header_map)
            .body(body_str)
            .send()
            .await
            .map_err(|e| {
                EngineError::provider_unavailable(provider, format!("network error: {e}"))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            EngineError::provider_unavailable(provider, format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(EngineError::provider_unavailable(
                provider,
                format!("HTTP {status}: {text}"),
            ));
        }

        serde_json::from_str(&text).map_err(|e| {
            EngineError::normalization(provider, "$", format!("unparseable response body: {e}"))
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetricValue {
    amount: Option<String>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TimePeriod {
    start: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultByTime {
    time_period: Option<TimePeriod>,
    total: Option<HashMap<String, MetricValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCostAndUsageResponse {
    results_by_time: Option<Vec<ResultByTime>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Datapoint {
    timestamp: Option<String>,
    sum: Option<f64>,
    average: Option<f64>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetMetricStatisticsResponse {
    datapoints: Option<Vec<Datapoint>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireMetric {
    namespace: Option<String>,
    metric_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListMetricsResponse {
    metrics: Option<Vec<WireMetric>>,
}
