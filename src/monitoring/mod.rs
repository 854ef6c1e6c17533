//! Monitoring facade
//!
//! Read-only queries for the operational dashboard: local usage and cost
//! estimates straight from the usage ledger (no I/O, safe to poll often),
//! plus signed pass-through queries to the cloud provider's billing and
//! metrics APIs for ground-truth reconciliation. A remote failure is
//! reported alongside the local numbers; it never hides them.

pub mod cloud;

pub use cloud::{CloudCostClient, CostData, MetricDescriptor, MetricPoint};

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::core::cost::{
    CostEstimate, PriceTable, RealTimeCostEstimate, estimate_real_time_cost_with, spend_for_days,
};
use crate::core::types::{EngineError, EngineResult};
use crate::core::usage::{Clock, DailyUsage, UsageLedger};

/// Rolled-up spend estimates for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub today: f64,
    pub last_7_days: f64,
    pub last_30_days: f64,
    /// Seven-day run rate extrapolated over the rest of the month, plus
    /// month-to-date actuals.
    pub projected_monthly: f64,
    pub currency: &'static str,
}

/// Today's counts with their estimated cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayUsage {
    #[serde(flatten)]
    pub usage: DailyUsage,
    pub total_calls: u64,
    pub estimated_cost: CostEstimate,
}

/// One day of local accounting with its estimated cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCost {
    #[serde(flatten)]
    pub usage: DailyUsage,
    pub estimated_cost_usd: f64,
}

/// Local ledger series next to the provider's own billing numbers.
/// `remote` is absent (and `remote_error` set) when the reconciliation
/// query failed; the local series is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReconciliation {
    pub local: Vec<DailyCost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<Vec<CostData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<String>,
}

/// Read-only monitoring surface over the usage ledger and the cloud
/// billing/metrics APIs.
pub struct CostMonitor {
    ledger: Arc<UsageLedger>,
    prices: PriceTable,
    clock: Arc<dyn Clock>,
    cloud: Option<CloudCostClient>,
}

impl CostMonitor {
    /// `cloud` is optional: without it the remote reconciliation queries
    /// return an error while every local query keeps working.
    pub fn new(ledger: Arc<UsageLedger>, prices: PriceTable, cloud: Option<CloudCostClient>) -> Self {
        let clock = ledger.clock();
        Self {
            ledger,
            prices,
            clock,
            cloud,
        }
    }

    /// Pure per-call cost estimate; performs no I/O so dashboards can
    /// poll it cheaply and often.
    pub fn estimate_real_time_cost(&self, call_count: u64) -> RealTimeCostEstimate {
        estimate_real_time_cost_with(&self.prices, call_count)
    }

    /// Today's counts and their estimated cost.
    pub fn today_usage(&self) -> TodayUsage {
        let usage = self.ledger.usage_today();
        TodayUsage {
            usage,
            total_calls: usage.total(),
            estimated_cost: CostEstimate::for_usage(&usage, &self.prices),
        }
    }

    /// Rolled-up local spend estimates.
    pub fn cost_summary(&self) -> CostSummary {
        let today = CostEstimate::for_usage(&self.ledger.usage_today(), &self.prices).total;
        let last_7 = self.ledger.counts_for_range(7);
        let last_7_days = spend_for_days(&last_7, &self.prices);
        let last_30_days = spend_for_days(&self.ledger.counts_for_range(30), &self.prices);

        let date = self.clock.today();
        let month_to_date = spend_for_days(&self.ledger.counts_month_to_date(), &self.prices);
        let days_remaining = (days_in_month(date) - date.day()) as f64;
        let daily_run_rate = last_7_days / 7.0;
        let projected_monthly = daily_run_rate * days_remaining + month_to_date;

        CostSummary {
            today,
            last_7_days,
            last_30_days,
            projected_monthly,
            currency: "USD",
        }
    }

    /// Local per-day series over the last `days` days.
    pub fn daily_costs(&self, days: u32) -> Vec<DailyCost> {
        self.ledger
            .counts_for_range(days)
            .into_iter()
            .map(|usage| DailyCost {
                estimated_cost_usd: CostEstimate::for_usage(&usage, &self.prices).total,
                usage,
            })
            .collect()
    }

    /// Billed daily spend from the provider's billing API.
    pub async fn rekognition_costs(&self, days: u32) -> EngineResult<Vec<CostData>> {
        let cloud = self.cloud()?;
        let end = self.clock.today();
        let start = end - Duration::days(days.max(1) as i64);
        cloud.cost_and_usage(start, end).await
    }

    /// One metric's hourly series from the provider's metrics API.
    pub async fn rekognition_metrics(
        &self,
        metric_name: &str,
        hours: u32,
    ) -> EngineResult<Vec<MetricPoint>> {
        let cloud = self.cloud()?;
        let end = self.clock.now();
        let start = end - Duration::hours(hours.max(1) as i64);
        cloud.metric_statistics(metric_name, start, end).await
    }

    /// All metrics the provider advertises.
    pub async fn list_rekognition_metrics(&self) -> EngineResult<Vec<MetricDescriptor>> {
        self.cloud()?.list_metrics().await
    }

    /// Local series with the provider's own billing numbers alongside.
    /// A remote failure lands in `remote_error`; the local series is
    /// returned regardless.
    pub async fn reconcile(&self, days: u32) -> UsageReconciliation {
        let local = self.daily_costs(days);
        let (remote, remote_error) = match self.rekognition_costs(days).await {
            Ok(remote) => (Some(remote), None),
            Err(err) => {
                warn!(error = %err, "remote cost reconciliation failed");
                (None, Some(err.to_string()))
            }
        };
        UsageReconciliation {
            local,
            remote,
            remote_error,
        }
    }

    fn cloud(&self) -> EngineResult<&CloudCostClient> {
        self.cloud.as_ref().ok_or_else(|| {
            EngineError::provider_unavailable("cloud-metrics", "remote metrics client not configured")
        })
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid first of month");
    first_of_next.pred_opt().expect("valid last of month").day()
}
