//! Relay statistics.
//!
//! Counts what the agent has seen and sent so a run can be summarised on
//! shutdown. Counters are independent of the metric values themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current run.
#[derive(Debug)]
pub struct RelayStats {
    /// Heart-rate readings from the tracked strap
    heart_rate_accepted: AtomicU64,
    /// Heart-rate readings from any other strap
    heart_rate_ignored: AtomicU64,
    radar_readings: AtomicU64,
    speed_readings: AtomicU64,
    /// Reports handed to the gateway
    reports_attempted: AtomicU64,
    reports_sent: AtomicU64,
    reports_failed: AtomicU64,
    /// Run start time
    session_start: DateTime<Utc>,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            heart_rate_accepted: AtomicU64::new(0),
            heart_rate_ignored: AtomicU64::new(0),
            radar_readings: AtomicU64::new(0),
            speed_readings: AtomicU64::new(0),
            reports_attempted: AtomicU64::new(0),
            reports_sent: AtomicU64::new(0),
            reports_failed: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_heart_rate(&self, accepted: bool) {
        let counter = if accepted {
            &self.heart_rate_accepted
        } else {
            &self.heart_rate_ignored
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_radar_reading(&self) {
        self.radar_readings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_speed_reading(&self) {
        self.speed_readings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_attempt(&self) {
        self.reports_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_sent(&self) {
        self.reports_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_failed(&self) {
        self.reports_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            heart_rate_accepted: self.heart_rate_accepted.load(Ordering::Relaxed),
            heart_rate_ignored: self.heart_rate_ignored.load(Ordering::Relaxed),
            radar_readings: self.radar_readings.load(Ordering::Relaxed),
            speed_readings: self.speed_readings.load(Ordering::Relaxed),
            reports_attempted: self.reports_attempted.load(Ordering::Relaxed),
            reports_sent: self.reports_sent.load(Ordering::Relaxed),
            reports_failed: self.reports_failed.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Heart rate readings: {} accepted, {} ignored\n\
             - Radar readings: {}\n\
             - Speed readings: {}\n\
             - Reports: {} attempted, {} sent, {} failed\n\
             - Session duration: {} seconds",
            stats.heart_rate_accepted,
            stats.heart_rate_ignored,
            stats.radar_readings,
            stats.speed_readings,
            stats.reports_attempted,
            stats.reports_sent,
            stats.reports_failed,
            stats.session_duration_secs
        )
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the relay counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayStatsSnapshot {
    pub heart_rate_accepted: u64,
    pub heart_rate_ignored: u64,
    pub radar_readings: u64,
    pub speed_readings: u64,
    pub reports_attempted: u64,
    pub reports_sent: u64,
    pub reports_failed: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared relay statistics.
pub type SharedRelayStats = Arc<RelayStats>;

/// Create a new shared statistics block.
pub fn create_shared_stats() -> SharedRelayStats {
    Arc::new(RelayStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_rate_counting() {
        let stats = RelayStats::new();
        stats.record_heart_rate(true);
        stats.record_heart_rate(true);
        stats.record_heart_rate(false);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.heart_rate_accepted, 2);
        assert_eq!(snapshot.heart_rate_ignored, 1);
    }

    #[test]
    fn test_report_counting() {
        let stats = RelayStats::new();
        stats.record_report_attempt();
        stats.record_report_attempt();
        stats.record_report_sent();
        stats.record_report_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.reports_attempted, 2);
        assert_eq!(snapshot.reports_sent, 1);
        assert_eq!(snapshot.reports_failed, 1);
    }

    #[test]
    fn test_summary_format() {
        let stats = RelayStats::new();
        stats.record_radar_reading();
        let summary = stats.summary();

        assert!(summary.contains("Heart rate readings"));
        assert!(summary.contains("Radar readings: 1"));
        assert!(summary.contains("Reports: 0 attempted"));
    }
}
