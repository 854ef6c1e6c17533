//! Configuration management
//!
//! Loading, validation, and defaults for the engine configuration. The
//! routing policy, provider endpoints, credentials, and pricing are all
//! injected here; nothing in the engine reads the environment directly.

mod models;

pub use models::{EngineConfig, InferenceConfig, RekognitionConfig, RoutingConfig};

use std::env;
use std::path::Path;

use tracing::{debug, info};

use crate::core::types::{EngineError, EngineResult, Operation, ProviderKind};

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        info!("loading configuration from {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::internal(format!("failed to read config file: {e}")))?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| EngineError::internal(format!("failed to parse config: {e}")))?;

        config.validate()?;
        debug!("configuration loaded");
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables: `FACEGATE_DEFAULT_PROVIDER`,
    /// `FACEGATE_FALLBACK_ENABLED`, `FACEGATE_DAILY_BUDGET_USD`,
    /// `FACEGATE_OVERRIDE_{DETECT_FACES,COMPARE_FACES,FIND_SIMILAR_FACES}`,
    /// `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    /// `AWS_SESSION_TOKEN`, `FACEGATE_INFERENCE_URL`,
    /// `FACEGATE_INFERENCE_TIMEOUT_SECS`.
    pub fn from_env() -> EngineResult<Self> {
        let mut config = Self::default();

        if let Ok(value) = env::var("FACEGATE_DEFAULT_PROVIDER") {
            config.routing.default_provider = value
                .parse::<ProviderKind>()
                .map_err(EngineError::internal)?;
        }
        if let Ok(value) = env::var("FACEGATE_FALLBACK_ENABLED") {
            config.routing.fallback_enabled = value == "true" || value == "1";
        }
        if let Ok(value) = env::var("FACEGATE_DAILY_BUDGET_USD") {
            config.routing.daily_budget_usd = value
                .parse::<f64>()
                .map_err(|e| EngineError::internal(format!("invalid daily budget: {e}")))?;
        }
        for (operation, var) in [
            (Operation::DetectFaces, "FACEGATE_OVERRIDE_DETECT_FACES"),
            (Operation::CompareFaces, "FACEGATE_OVERRIDE_COMPARE_FACES"),
            (Operation::FindSimilarFaces, "FACEGATE_OVERRIDE_FIND_SIMILAR_FACES"),
        ] {
            if let Ok(value) = env::var(var) {
                let provider = value
                    .parse::<ProviderKind>()
                    .map_err(EngineError::internal)?;
                config.routing.operation_overrides.insert(operation, provider);
            }
        }

        if let Ok(value) = env::var("AWS_REGION") {
            config.rekognition.region = value;
        }
        if let Ok(value) = env::var("AWS_ACCESS_KEY_ID") {
            config.rekognition.access_key_id = value;
        }
        if let Ok(value) = env::var("AWS_SECRET_ACCESS_KEY") {
            config.rekognition.secret_access_key = value;
        }
        if let Ok(value) = env::var("AWS_SESSION_TOKEN") {
            config.rekognition.session_token = Some(value);
        }

        if let Ok(value) = env::var("FACEGATE_INFERENCE_URL") {
            config.inference.base_url = value;
        }
        if let Ok(value) = env::var("FACEGATE_INFERENCE_TIMEOUT_SECS") {
            config.inference.timeout_secs = value
                .parse::<u64>()
                .map_err(|e| EngineError::internal(format!("invalid inference timeout: {e}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> EngineResult<()> {
        debug!("validating configuration");

        if !self.routing.daily_budget_usd.is_finite() || self.routing.daily_budget_usd < 0.0 {
            return Err(EngineError::internal(
                "routing.dailyBudgetUsd must be a non-negative number",
            ));
        }

        if self.rekognition.region.trim().is_empty() {
            return Err(EngineError::internal("rekognition.region must not be empty"));
        }
        if self.rekognition.access_key_id.is_empty() != self.rekognition.secret_access_key.is_empty()
        {
            return Err(EngineError::internal(
                "rekognition credentials must be set together or not at all",
            ));
        }
        if self.rekognition.timeout_secs == 0 || self.rekognition.connect_timeout_secs == 0 {
            return Err(EngineError::internal("rekognition timeouts must be nonzero"));
        }

        url::Url::parse(&self.inference.base_url)
            .map_err(|e| EngineError::internal(format!("inference.baseUrl invalid: {e}")))?;
        if self.inference.timeout_secs == 0 || self.inference.health_timeout_secs == 0 {
            return Err(EngineError::internal("inference timeouts must be nonzero"));
        }

        for (label, price) in [
            ("detectFaces", self.pricing.detect_faces),
            ("compareFaces", self.pricing.compare_faces),
            ("findSimilarFaces", self.pricing.find_similar_faces),
        ] {
            if !price.is_finite() || price < 0.0 {
                return Err(EngineError::internal(format!(
                    "pricing.{label} must be a non-negative number"
                )));
            }
        }

        debug!("configuration valid");
        Ok(())
    }
}
