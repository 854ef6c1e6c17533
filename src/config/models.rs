//! Configuration data model

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::cost::PriceTable;
use crate::core::types::{Operation, ProviderKind};

/// Routing policy: which provider serves which operation, and the daily
/// spend ceiling that steers traffic toward the self-hosted backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Provider used when no override or budget signal applies.
    pub default_provider: ProviderKind,
    /// Whether a primary outage may be retried once on the other provider.
    pub fallback_enabled: bool,
    /// Soft daily spend ceiling in USD. Estimated spend above this prefers
    /// the self-hosted provider; it is never a hard admission gate.
    pub daily_budget_usd: f64,
    /// Per-operation provider pins, evaluated before any other rule.
    pub operation_overrides: HashMap<Operation, ProviderKind>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::Rekognition,
            fallback_enabled: true,
            daily_budget_usd: 10.0,
            operation_overrides: HashMap::new(),
        }
    }
}

/// Cloud provider (AWS Rekognition) connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RekognitionConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl RekognitionConfig {
    pub fn has_credentials(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

impl Default for RekognitionConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Self-hosted inference service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InferenceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Health probes get a short deadline so routing decisions stay fast.
    pub health_timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            health_timeout_secs: 2,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub routing: RoutingConfig,
    pub rekognition: RekognitionConfig,
    pub inference: InferenceConfig,
    pub pricing: PriceTable,
}
