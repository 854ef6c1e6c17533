//! Usage ledger
//!
//! Process-wide per-day, per-operation invocation counters. The ledger is
//! the only state in the engine that outlives a request: initialized empty
//! at process start, mutated by every successful router invocation, read
//! by the selection policy and the monitoring facade. Best-effort by
//! design; it is lost on restart and that is acceptable.
//!
//! Increments are atomic: two concurrent successful calls always produce
//! count+2. Reads taken for routing decisions may be stale by the time the
//! increment lands; the budget check is advisory, so that is fine.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::core::types::Operation;

/// Counters older than this are trimmed on write.
const RETENTION_DAYS: i64 = 30;

/// Source of "today" for day-boundary decisions.
///
/// The day boundary is the host's local calendar date; rollover is lazy —
/// the first write or read after midnight simply lands on a fresh date
/// key. Injected so tests can step time manually.
pub trait Clock: Send + Sync + fmt::Debug {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for tests; also usable by embedders' test suites.
#[derive(Debug)]
pub struct ManualClock {
    today: std::sync::Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn at(date: NaiveDate) -> Self {
        Self {
            today: std::sync::Mutex::new(date),
        }
    }

    pub fn set_today(&self, date: NaiveDate) {
        *self.today.lock().unwrap() = date;
    }

    pub fn advance_days(&self, days: i64) {
        let mut today = self.today.lock().unwrap();
        *today = *today + Duration::days(days);
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }

    fn now(&self) -> DateTime<Utc> {
        self.today()
            .and_hms_opt(12, 0, 0)
            .expect("valid time")
            .and_utc()
    }
}

/// One calendar day's counters.
#[derive(Debug, Default)]
struct DayCounters {
    detect_faces: AtomicU64,
    compare_faces: AtomicU64,
    find_similar_faces: AtomicU64,
}

impl DayCounters {
    fn counter(&self, operation: Operation) -> &AtomicU64 {
        match operation {
            Operation::DetectFaces => &self.detect_faces,
            Operation::CompareFaces => &self.compare_faces,
            Operation::FindSimilarFaces => &self.find_similar_faces,
        }
    }

    fn snapshot(&self, date: NaiveDate) -> DailyUsage {
        DailyUsage {
            date,
            detect_faces: self.detect_faces.load(Ordering::Relaxed),
            compare_faces: self.compare_faces.load(Ordering::Relaxed),
            find_similar_faces: self.find_similar_faces.load(Ordering::Relaxed),
        }
    }
}

/// Read-only view of one day's counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub detect_faces: u64,
    pub compare_faces: u64,
    pub find_similar_faces: u64,
}

impl DailyUsage {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            detect_faces: 0,
            compare_faces: 0,
            find_similar_faces: 0,
        }
    }

    pub fn count_for(&self, operation: Operation) -> u64 {
        match operation {
            Operation::DetectFaces => self.detect_faces,
            Operation::CompareFaces => self.compare_faces,
            Operation::FindSimilarFaces => self.find_similar_faces,
        }
    }

    pub fn total(&self) -> u64 {
        self.detect_faces + self.compare_faces + self.find_similar_faces
    }
}

/// Per-day, per-operation invocation counters shared by every in-flight
/// request.
#[derive(Debug)]
pub struct UsageLedger {
    clock: Arc<dyn Clock>,
    days: DashMap<NaiveDate, DayCounters>,
}

impl UsageLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            days: DashMap::new(),
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// The clock this ledger keys days by, shared with the monitoring
    /// facade so both agree on "today".
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Increment the current-day counter for `operation`.
    ///
    /// Infallible and safe under arbitrary concurrent callers; the caller
    /// records only successful operations, so failed-but-billed backend
    /// calls are undercounted (known approximation).
    pub fn record_usage(&self, operation: Operation) {
        let today = self.clock.today();
        self.days
            .entry(today)
            .or_default()
            .counter(operation)
            .fetch_add(1, Ordering::Relaxed);
        debug!(operation = %operation, date = %today, "usage recorded");
        self.prune(today);
    }

    /// Today's count for one operation, or all operations summed.
    pub fn count_today(&self, operation: Option<Operation>) -> u64 {
        let today = self.clock.today();
        let usage = self.usage_for(today);
        match operation {
            Some(op) => usage.count_for(op),
            None => usage.total(),
        }
    }

    /// Today's full per-operation snapshot.
    pub fn usage_today(&self) -> DailyUsage {
        self.usage_for(self.clock.today())
    }

    /// The last `days` calendar days (minimum 1), ascending by date,
    /// zero-filled for days with no traffic, ending today.
    pub fn counts_for_range(&self, days: u32) -> Vec<DailyUsage> {
        let days = days.max(1) as i64;
        let today = self.clock.today();
        (0..days)
            .rev()
            .map(|offset| self.usage_for(today - Duration::days(offset)))
            .collect()
    }

    /// Counts from the first of the current month through today.
    pub fn counts_month_to_date(&self) -> Vec<DailyUsage> {
        self.counts_for_range(self.clock.today().day())
    }

    fn usage_for(&self, date: NaiveDate) -> DailyUsage {
        self.days
            .get(&date)
            .map(|counters| counters.snapshot(date))
            .unwrap_or_else(|| DailyUsage::empty(date))
    }

    fn prune(&self, today: NaiveDate) {
        let cutoff = today - Duration::days(RETENTION_DAYS);
        self.days.retain(|date, _| *date >= cutoff);
    }
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::with_system_clock()
    }
}
