//! Provider selection policy
//!
//! Pure given `(config, usage snapshot)`: no hidden state, no I/O.
//! Evaluation order is fixed — an explicit per-operation override wins,
//! then the budget signal, then the configured default.

use std::sync::Arc;

use serde::Serialize;

use crate::config::RoutingConfig;
use crate::core::cost::{CostEstimate, PriceTable};
use crate::core::types::{Operation, ProviderKind};
use crate::core::usage::{DailyUsage, UsageLedger};

/// Why a provider was chosen, for logs and the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionReason {
    /// An explicit operation override in configuration.
    OperationOverride,
    /// Today's estimated spend exceeds the daily budget; the self-hosted
    /// provider is preferred regardless of other factors.
    BudgetExceeded,
    /// The configured default provider.
    Default,
}

/// The outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub provider: ProviderKind,
    pub reason: SelectionReason,
}

/// Today's usage priced against the table, captured once per request.
/// May be stale by the time the request records its own usage; the
/// budget check is advisory, so a small overshoot is tolerated.
#[derive(Debug, Clone)]
pub struct UsageSnapshot {
    pub usage: DailyUsage,
    pub estimated_spend_usd: f64,
}

impl UsageSnapshot {
    pub fn capture(ledger: &Arc<UsageLedger>, prices: &PriceTable) -> Self {
        let usage = ledger.usage_today();
        let estimated_spend_usd = CostEstimate::for_usage(&usage, prices).total;
        Self {
            usage,
            estimated_spend_usd,
        }
    }
}

/// Resolve the provider for one operation.
pub fn select_provider(
    config: &RoutingConfig,
    operation: Operation,
    snapshot: &UsageSnapshot,
) -> Selection {
    if let Some(&provider) = config.operation_overrides.get(&operation) {
        return Selection {
            provider,
            reason: SelectionReason::OperationOverride,
        };
    }

    if snapshot.estimated_spend_usd > config.daily_budget_usd {
        return Selection {
            provider: ProviderKind::Inference,
            reason: SelectionReason::BudgetExceeded,
        };
    }

    Selection {
        provider: config.default_provider,
        reason: SelectionReason::Default,
    }
}
