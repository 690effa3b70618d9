//! Query metrics and health tracking.
//!
//! The tracker is the one shared mutable resource in the service:
//! every query completion lands here. All counter updates and the
//! running-average recomputation happen under a single internal lock,
//! so concurrent completions cannot tear the average or lose updates.

use std::time::Duration;

use parking_lot::Mutex;
use sibyl_core::{MetricsSnapshot, SystemStatus};

/// Success rate above which the aggregate status reads healthy.
const HEALTH_THRESHOLD: f64 = 0.9;

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    successful: u64,
    failed: u64,
    average_response_time: f64,
}

/// Single-writer tracker of per-query outcomes.
#[derive(Debug, Default)]
pub struct MetricsTracker {
    counters: Mutex<Counters>,
}

impl MetricsTracker {
    /// Creates a tracker with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful query and folds its latency into the
    /// running average with the incremental-mean update.
    pub fn record_success(&self, latency: Duration) {
        let mut c = self.counters.lock();
        c.total += 1;
        c.successful += 1;
        let latency = latency.as_secs_f64();
        c.average_response_time += (latency - c.average_response_time) / c.successful as f64;
    }

    /// Records a failed query. Failed latencies do not move the average.
    pub fn record_failure(&self) {
        let mut c = self.counters.lock();
        c.total += 1;
        c.failed += 1;
    }

    /// Returns a point-in-time snapshot with the derived success rate
    /// and aggregate status.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.counters.lock();
        let success_rate = if c.total == 0 {
            0.0
        } else {
            c.successful as f64 / c.total as f64
        };

        MetricsSnapshot {
            total_queries: c.total,
            successful_queries: c.successful,
            failed_queries: c.failed,
            average_response_time: c.average_response_time,
            success_rate,
            system_status: if success_rate > HEALTH_THRESHOLD {
                SystemStatus::Healthy
            } else {
                SystemStatus::Degraded
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_snapshot() {
        let snapshot = MetricsTracker::new().snapshot();
        assert_eq!(snapshot.total_queries, 0);
        assert_eq!(snapshot.success_rate, 0.0);
        assert_eq!(snapshot.average_response_time, 0.0);
        assert_eq!(snapshot.system_status, SystemStatus::Degraded);
    }

    #[test]
    fn running_average_matches_arithmetic_mean() {
        let tracker = MetricsTracker::new();
        let latencies = [0.120, 0.340, 0.075, 1.800, 0.005];
        for secs in latencies {
            tracker.record_success(Duration::from_secs_f64(secs));
        }

        let mean: f64 = latencies.iter().sum::<f64>() / latencies.len() as f64;
        let snapshot = tracker.snapshot();
        assert!((snapshot.average_response_time - mean).abs() < 1e-9);
    }

    #[test]
    fn failures_count_but_do_not_move_average() {
        let tracker = MetricsTracker::new();
        tracker.record_success(Duration::from_millis(100));
        tracker.record_failure();
        tracker.record_failure();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.total_queries, 3);
        assert_eq!(snapshot.successful_queries, 1);
        assert_eq!(snapshot.failed_queries, 2);
        assert!((snapshot.average_response_time - 0.1).abs() < 1e-9);
        assert!((snapshot.success_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn status_threshold_is_exclusive_at_point_nine() {
        let tracker = MetricsTracker::new();
        for _ in 0..9 {
            tracker.record_success(Duration::from_millis(10));
        }
        tracker.record_failure();
        // 9/10 == 0.9 is not above the threshold.
        assert_eq!(tracker.snapshot().system_status, SystemStatus::Degraded);

        for _ in 0..90 {
            tracker.record_success(Duration::from_millis(10));
        }
        // 99/100 clears it.
        assert_eq!(tracker.snapshot().system_status, SystemStatus::Healthy);
    }

    #[test]
    fn counters_are_monotonic() {
        let tracker = MetricsTracker::new();
        let mut last_total = 0;
        for i in 0..20 {
            if i % 3 == 0 {
                tracker.record_failure();
            } else {
                tracker.record_success(Duration::from_millis(i));
            }
            let total = tracker.snapshot().total_queries;
            assert!(total > last_total);
            last_total = total;
        }
    }
}
