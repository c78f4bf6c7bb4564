//! Metrics collection for worker pool monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "telemetry")]
use hdrhistogram::Histogram;
#[cfg(feature = "telemetry")]
use parking_lot::RwLock;

// one hour in nanoseconds
#[cfg(feature = "telemetry")]
const MAX_TRACKED_LATENCY_NS: u64 = 3_600_000_000_000;

/// Worker pool metrics collector
#[derive(Debug)]
pub struct Metrics {
    tasks_submitted: AtomicU64,
    tasks_executed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_panicked: AtomicU64,
    tasks_discarded: AtomicU64,

    busy_time_ns: AtomicU64,

    #[cfg(feature = "telemetry")]
    latency_histogram: Option<RwLock<Histogram<u64>>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_executed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            tasks_discarded: AtomicU64::new(0),
            busy_time_ns: AtomicU64::new(0),
            #[cfg(feature = "telemetry")]
            latency_histogram: Histogram::new_with_max(MAX_TRACKED_LATENCY_NS, 3)
                .ok()
                .map(RwLock::new),
            start_time: Instant::now(),
        }
    }

    pub fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished task, successful or not, with its run time
    pub fn record_task_execution(&self, duration: Duration) {
        let duration_ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
        self.busy_time_ns.fetch_add(duration_ns, Ordering::Relaxed);

        #[cfg(feature = "telemetry")]
        if let Some(histogram) = &self.latency_histogram {
            // saturating_record clamps values above the tracked maximum
            histogram.write().saturating_record(duration_ns.max(1));
        }
    }

    pub fn record_task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self, count: usize) {
        self.tasks_discarded
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        #[cfg_attr(not(feature = "telemetry"), allow(unused_mut))]
        let mut snapshot = MetricsSnapshot {
            uptime_ms: self.start_time.elapsed().as_millis() as u64,
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            tasks_discarded: self.tasks_discarded.load(Ordering::Relaxed),
            busy_time_ns: self.busy_time_ns.load(Ordering::Relaxed),
            ..MetricsSnapshot::default()
        };

        #[cfg(feature = "telemetry")]
        if let Some(histogram) = &self.latency_histogram {
            let histogram = histogram.read();
            if !histogram.is_empty() {
                snapshot.avg_latency_ns = histogram.mean() as u64;
                snapshot.p50_latency_ns = histogram.value_at_quantile(0.50);
                snapshot.p99_latency_ns = histogram.value_at_quantile(0.99);
                snapshot.max_latency_ns = histogram.max();
            }
        }

        snapshot
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`Metrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "telemetry", derive(serde::Serialize))]
pub struct MetricsSnapshot {
    pub uptime_ms: u64,
    pub tasks_submitted: u64,
    pub tasks_executed: u64,
    pub tasks_failed: u64,
    pub tasks_panicked: u64,
    pub tasks_discarded: u64,
    pub busy_time_ns: u64,
    pub avg_latency_ns: u64,
    pub p50_latency_ns: u64,
    pub p99_latency_ns: u64,
    pub max_latency_ns: u64,
}

impl MetricsSnapshot {
    /// Share of executed tasks that returned an error or panicked
    pub fn failure_rate(&self) -> f64 {
        if self.tasks_executed == 0 {
            return 0.0;
        }
        (self.tasks_failed + self.tasks_panicked) as f64 / self.tasks_executed as f64
    }

    /// Submitted tasks that have neither run nor been discarded
    pub fn outstanding(&self) -> u64 {
        self.tasks_submitted
            .saturating_sub(self.tasks_executed + self.tasks_discarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_basic() {
        let metrics = Metrics::new();

        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_task_execution(Duration::from_micros(1));
        metrics.record_task_execution(Duration::from_micros(2));
        metrics.record_task_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tasks_submitted, 3);
        assert_eq!(snapshot.tasks_executed, 2);
        assert_eq!(snapshot.tasks_failed, 1);
        assert_eq!(snapshot.outstanding(), 1);
        assert_eq!(snapshot.busy_time_ns, 3_000);
    }

    #[cfg(feature = "telemetry")]
    #[test]
    fn test_latency_histogram() {
        let metrics = Metrics::new();
        for _ in 0..10 {
            metrics.record_task_execution(Duration::from_micros(100));
        }

        let snapshot = metrics.snapshot();
        assert!(snapshot.avg_latency_ns > 0);
        assert!(snapshot.p99_latency_ns >= snapshot.p50_latency_ns);
        assert!(snapshot.max_latency_ns >= 99_000);
    }

    #[test]
    fn test_failure_rate() {
        let mut snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.failure_rate(), 0.0);

        snapshot.tasks_executed = 4;
        snapshot.tasks_failed = 1;
        snapshot.tasks_panicked = 1;
        assert_eq!(snapshot.failure_rate(), 0.5);
    }

    #[test]
    fn test_discarded_counts_as_settled() {
        let metrics = Metrics::new();
        for _ in 0..5 {
            metrics.record_submitted();
        }
        metrics.record_discarded(5);
        assert_eq!(metrics.snapshot().outstanding(), 0);
    }
}
