//! Engine error taxonomy
//!
//! Four terminal failure classes, each with different routing behavior:
//! `InvalidInput` and `Normalization` indicate a request-shape or
//! schema-drift problem and are never retried on the alternate provider;
//! `ProviderUnavailable` is the only class eligible for fallback.
//! Budget exhaustion is a routing signal, not an error, and never
//! appears here.

/// Top-level error type for the face-analysis engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed or out-of-bounds request. Not retried, not fallback-eligible.
    #[error("invalid input ({field}): {message}")]
    InvalidInput { field: String, message: String },

    /// Transient backend failure: network error, timeout, or 5xx.
    /// Triggers exactly one fallback attempt on the alternate provider.
    #[error("provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        provider: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Contract mismatch between the expected and actual provider schema.
    /// Carries the path of the offending field; surfaced as an internal
    /// error since it indicates schema drift, never silently defaulted.
    #[error("normalization error ({provider}) at {path}: {message}")]
    Normalization {
        provider: String,
        path: String,
        message: String,
    },

    /// Infrastructure fault inside the engine itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn provider_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn provider_unavailable_with_source(
        provider: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn normalization(
        provider: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Normalization {
            provider: provider.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the router may retry this failure once on the alternate
    /// provider. Only outages qualify; input and schema errors would fail
    /// identically everywhere.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }

    /// HTTP status the out-of-scope handler layer should map this to.
    pub fn to_http_status(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } => 400,
            Self::ProviderUnavailable { .. } => 503,
            Self::Normalization { .. } | Self::Internal(_) => 500,
        }
    }
}

/// Result type alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
