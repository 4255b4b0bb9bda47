//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counters use Relaxed ordering intentionally - these are
//! statistical counters only, never coordination state.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Lock-free metrics collector for the attendance core
///
/// Recording is lock-free; `report()` atomically swaps the per-interval
/// counters to produce a consistent snapshot.
#[derive(Default)]
pub struct Metrics {
    /// Pings ever processed (monotonic)
    pings_total: AtomicU64,
    /// Pings inside a fence (monotonic)
    pings_inside: AtomicU64,
    /// Pings outside all fences (monotonic)
    pings_outside: AtomicU64,
    /// Pings rejected because the employee was not tracking (monotonic)
    pings_not_tracking: AtomicU64,
    /// Pings since last report (reset on report)
    pings_since_report: AtomicU64,
    /// Ping handling latency sum in microseconds (reset on report)
    ping_latency_sum_us: AtomicU64,
    /// Ping handling latency max in microseconds (reset on report)
    ping_latency_max_us: AtomicU64,
    /// Sessions closed by the outside-fence threshold (monotonic)
    auto_checkouts_total: AtomicU64,
    /// Manual check-ins (monotonic)
    check_ins_total: AtomicU64,
    /// Manual check-outs (monotonic)
    check_outs_total: AtomicU64,
    /// Prior-day open sessions auto-closed during check-in (monotonic)
    stale_sessions_total: AtomicU64,
    /// Read-time staleness corrections of the tracking flag (monotonic)
    stale_corrections_total: AtomicU64,
    /// Open sessions resumed within the grace window (monotonic)
    resumes_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ping(&self, inside: bool) {
        self.pings_total.fetch_add(1, Ordering::Relaxed);
        self.pings_since_report.fetch_add(1, Ordering::Relaxed);
        if inside {
            self.pings_inside.fetch_add(1, Ordering::Relaxed);
        } else {
            self.pings_outside.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ping_not_tracking(&self) {
        self.pings_not_tracking.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ping_latency(&self, latency_us: u64) {
        self.ping_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.ping_latency_max_us, latency_us);
    }

    pub fn record_auto_checkout(&self) {
        self.auto_checkouts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_check_in(&self) {
        self.check_ins_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_check_out(&self) {
        self.check_outs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_session(&self) {
        self.stale_sessions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_correction(&self) {
        self.stale_corrections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resume(&self) {
        self.resumes_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters; per-interval values are swapped to zero
    pub fn report(&self) -> MetricsSummary {
        let pings_interval = self.pings_since_report.swap(0, Ordering::Relaxed);
        let latency_sum_us = self.ping_latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max_us = self.ping_latency_max_us.swap(0, Ordering::Relaxed);
        let latency_avg_us =
            if pings_interval > 0 { latency_sum_us / pings_interval } else { 0 };

        MetricsSummary {
            pings_total: self.pings_total.load(Ordering::Relaxed),
            pings_inside: self.pings_inside.load(Ordering::Relaxed),
            pings_outside: self.pings_outside.load(Ordering::Relaxed),
            pings_not_tracking: self.pings_not_tracking.load(Ordering::Relaxed),
            pings_interval,
            latency_avg_us,
            latency_max_us,
            auto_checkouts_total: self.auto_checkouts_total.load(Ordering::Relaxed),
            check_ins_total: self.check_ins_total.load(Ordering::Relaxed),
            check_outs_total: self.check_outs_total.load(Ordering::Relaxed),
            stale_sessions_total: self.stale_sessions_total.load(Ordering::Relaxed),
            stale_corrections_total: self.stale_corrections_total.load(Ordering::Relaxed),
            resumes_total: self.resumes_total.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub pings_total: u64,
    pub pings_inside: u64,
    pub pings_outside: u64,
    pub pings_not_tracking: u64,
    pub pings_interval: u64,
    pub latency_avg_us: u64,
    pub latency_max_us: u64,
    pub auto_checkouts_total: u64,
    pub check_ins_total: u64,
    pub check_outs_total: u64,
    pub stale_sessions_total: u64,
    pub stale_corrections_total: u64,
    pub resumes_total: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            pings_total = %self.pings_total,
            pings_inside = %self.pings_inside,
            pings_outside = %self.pings_outside,
            pings_not_tracking = %self.pings_not_tracking,
            pings_interval = %self.pings_interval,
            latency_avg_us = %self.latency_avg_us,
            latency_max_us = %self.latency_max_us,
            auto_checkouts = %self.auto_checkouts_total,
            check_ins = %self.check_ins_total,
            check_outs = %self.check_outs_total,
            stale_sessions = %self.stale_sessions_total,
            stale_corrections = %self.stale_corrections_total,
            resumes = %self.resumes_total,
            "metrics_report"
        );
    }
}
