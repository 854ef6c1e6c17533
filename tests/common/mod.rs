//! Shared test infrastructure

pub mod providers;

use std::sync::Arc;

use chrono::NaiveDate;
use facegate::{ManualClock, Operation, UsageLedger};

/// A ledger pinned to 2026-08-07 with its manual clock.
pub fn fixed_ledger() -> (Arc<UsageLedger>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at(
        NaiveDate::from_ymd_opt(2026, 8, 7).expect("valid date"),
    ));
    let ledger = Arc::new(UsageLedger::new(
        Arc::clone(&clock) as Arc<dyn facegate::Clock>
    ));
    (ledger, clock)
}

/// Poll until the detached usage-recording task has landed.
pub async fn wait_for_count(ledger: &UsageLedger, operation: Option<Operation>, expected: u64) {
    for _ in 0..200 {
        if ledger.count_today(operation) == expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(ledger.count_today(operation), expected);
}
