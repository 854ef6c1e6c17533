//! # facegate
//!
//! A hybrid face-analysis engine. Routes detect / compare / find-similar
//! operations between two heterogeneous backends — the metered AWS
//! Rekognition service and a self-hosted inference service — under a
//! cost/usage policy, and normalizes their structurally different
//! responses into one canonical model.
//!
//! ## Features
//!
//! - **Hybrid routing**: per-operation overrides, a soft daily budget
//!   that steers traffic to the self-hosted backend, and a configured
//!   default provider
//! - **Single-retry fallback**: a primary outage is retried exactly once
//!   on the other provider; input and schema errors never are
//! - **Canonical model**: coordinates as image fractions, similarities
//!   and confidences as percentages, regardless of provider
//! - **Usage ledger**: atomic per-day, per-operation counters behind an
//!   injectable clock, recorded off the request path
//! - **Cost monitoring**: pure local spend estimates plus signed
//!   pass-through queries to the cloud billing and metrics APIs
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use facegate::{CostMonitor, EngineConfig, HybridRouter, UsageLedger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::from_env()?;
//!     let ledger = Arc::new(UsageLedger::with_system_clock());
//!     let router = HybridRouter::new(&config, Arc::clone(&ledger))?;
//!
//!     let routed = router
//!         .compare_faces("<source base64>", "<target base64>", None)
//!         .await?;
//!     println!(
//!         "similarity {:.1} via {}",
//!         routed.result.similarity, routed.provider
//!     );
//!
//!     let monitor = CostMonitor::new(ledger, config.pricing, None);
//!     println!("today: {:?}", monitor.cost_summary());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod monitoring;
pub mod utils;

// Re-export the engine surface.
pub use crate::config::{EngineConfig, InferenceConfig, RekognitionConfig, RoutingConfig};
pub use crate::core::cost::{
    CostEstimate, PriceTable, RealTimeCostEstimate, estimate_real_time_cost,
};
pub use crate::core::providers::{InferenceProvider, RekognitionProvider};
pub use crate::core::router::{
    HybridRouter, Selection, SelectionReason, UsageSnapshot, select_provider,
};
pub use crate::core::traits::{
    DEFAULT_SIMILARITY_THRESHOLD, FaceAnalysisProvider, MAX_FIND_SIMILAR_CANDIDATES,
};
pub use crate::core::types::{
    AgeRange, AttributeFlag, BestMatch, BoundingBox, Emotion, EngineError, EngineResult,
    EngineStatus, Face, FaceComparisonResult, FaceDetails, FaceMatch, FindSimilarResponse,
    GenderGuess, HealthStatus, Landmark, Operation, Pose, ProviderAvailability, ProviderKind,
    Quality, Routed, SimilarityResult,
};
pub use crate::core::usage::{Clock, DailyUsage, ManualClock, SystemClock, UsageLedger};
pub use crate::monitoring::{CloudCostClient, CostMonitor, CostSummary};

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
