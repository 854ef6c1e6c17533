//! Cost model
//!
//! A static per-operation price table and the pure functions that turn
//! invocation counts into estimated spend. Estimates are derived on every
//! read and never persisted; nothing here performs I/O, so dashboards can
//! poll cheaply and often.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::types::Operation;
use crate::core::usage::DailyUsage;

/// 2024 Rekognition list price, USD per processed image.
const DEFAULT_PRICE_PER_CALL: f64 = 0.001;

/// Assumed operation mix when only an aggregate call count is known.
const COMPARE_FACES_RATIO: f64 = 0.6;
const DETECT_FACES_RATIO: f64 = 0.4;

/// USD per call for each billable operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PriceTable {
    pub detect_faces: f64,
    pub compare_faces: f64,
    pub find_similar_faces: f64,
}

impl PriceTable {
    pub fn price_for(&self, operation: Operation) -> f64 {
        match operation {
            Operation::DetectFaces => self.detect_faces,
            Operation::CompareFaces => self.compare_faces,
            Operation::FindSimilarFaces => self.find_similar_faces,
        }
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            detect_faces: DEFAULT_PRICE_PER_CALL,
            compare_faces: DEFAULT_PRICE_PER_CALL,
            find_similar_faces: DEFAULT_PRICE_PER_CALL,
        }
    }
}

/// The static default table used when no pricing is configured.
pub static DEFAULT_PRICE_TABLE: Lazy<PriceTable> = Lazy::new(PriceTable::default);

/// Estimated spend for a set of per-operation counts. Derived, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub detect_faces: f64,
    pub compare_faces: f64,
    pub find_similar_faces: f64,
    pub total: f64,
    pub currency: &'static str,
}

impl CostEstimate {
    pub fn for_counts(
        detect_faces: u64,
        compare_faces: u64,
        find_similar_faces: u64,
        prices: &PriceTable,
    ) -> Self {
        let detect = detect_faces as f64 * prices.detect_faces;
        let compare = compare_faces as f64 * prices.compare_faces;
        let find_similar = find_similar_faces as f64 * prices.find_similar_faces;
        Self {
            detect_faces: detect,
            compare_faces: compare,
            find_similar_faces: find_similar,
            total: detect + compare + find_similar,
            currency: "USD",
        }
    }

    pub fn for_usage(usage: &DailyUsage, prices: &PriceTable) -> Self {
        Self::for_counts(
            usage.detect_faces,
            usage.compare_faces,
            usage.find_similar_faces,
            prices,
        )
    }
}

/// Total estimated spend for a day series.
pub fn spend_for_days(days: &[DailyUsage], prices: &PriceTable) -> f64 {
    days.iter()
        .map(|day| CostEstimate::for_usage(day, prices).total)
        .sum()
}

/// Real-time cost estimate from an aggregate API call count, split
/// 60/40 compare/detect as observed traffic does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeCostEstimate {
    pub compare_faces_cost: f64,
    pub detect_faces_cost: f64,
    pub total_estimated_cost: f64,
}

/// Pure and linear in `call_count`; zero calls cost zero. Uses the static
/// default table.
pub fn estimate_real_time_cost(call_count: u64) -> RealTimeCostEstimate {
    estimate_real_time_cost_with(&DEFAULT_PRICE_TABLE, call_count)
}

/// As [`estimate_real_time_cost`] but against a configured price table.
pub fn estimate_real_time_cost_with(prices: &PriceTable, call_count: u64) -> RealTimeCostEstimate {
    let compare_faces_cost = call_count as f64 * COMPARE_FACES_RATIO * prices.compare_faces;
    let detect_faces_cost = call_count as f64 * DETECT_FACES_RATIO * prices.detect_faces;
    RealTimeCostEstimate {
        compare_faces_cost,
        detect_faces_cost,
        total_estimated_cost: compare_faces_cost + detect_faces_cost,
    }
}
