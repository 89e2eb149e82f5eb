// Aggregate counters over pipeline outcomes

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::models::{RelayResult, ResolutionResult, StatsSnapshot};

const NEVER: i64 = i64::MIN;

/// Lock-free counters shared by concurrent platform batches
pub struct StatsTracker {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    /// Unix nanoseconds of the last completed batch, `NEVER` if none
    last_run_nanos: AtomicI64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last_run_nanos: AtomicI64::new(NEVER),
        }
    }

    /// Count one processed request. Only a sent relay is a success.
    pub fn record(&self, _resolution: &ResolutionResult, relay: Option<&RelayResult>) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if relay.map_or(false, |r| r.sent) {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a request whose processing faulted
    pub fn record_fault(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Stamp the end of a batch
    pub fn mark_run(&self) {
        let now = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let clamped = now.clamp(i64::MIN as i128 + 1, i64::MAX as i128) as i64;
        self.last_run_nanos.fetch_max(clamped, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let successful = self.successful.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        StatsSnapshot {
            total,
            successful,
            failed,
            success_rate: success_rate(successful, total),
            last_run: self.last_run(),
        }
    }

    fn last_run(&self) -> Option<String> {
        let nanos = self.last_run_nanos.load(Ordering::Relaxed);
        if nanos == NEVER {
            return None;
        }
        OffsetDateTime::from_unix_timestamp_nanos(nanos as i128)
            .ok()
            .and_then(|t| t.format(&Rfc3339).ok())
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentage rounded to two decimals (ties to even); 0 when nothing was processed
pub fn success_rate(successful: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = successful as f64 / total as f64 * 100.0;
    (pct * 100.0).round_ties_even() / 100.0
}
