//! Latest-value store for the relayed metrics.
//!
//! Each field is an independent atomic. Scanner callbacks write from their own
//! threads while the reporter reads, so a snapshot is whole per field but not a
//! single point in time across fields.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// The values reported on each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Beats per minute from the tracked strap
    pub heart_rate: u32,
    /// Vehicles currently tracked by the radar
    pub car_count: usize,
    /// Speed as decoded by the speed sensor
    pub speed: f32,
}

/// Holds the most recent value of each metric.
#[derive(Debug, Default)]
pub struct MetricState {
    heart_rate: AtomicU32,
    car_count: AtomicUsize,
    /// `f32` bit pattern
    speed: AtomicU32,
}

impl MetricState {
    /// Create a store with every metric at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_heart_rate(&self, value: u32) {
        self.heart_rate.store(value, Ordering::Relaxed);
    }

    pub fn update_car_count(&self, value: usize) {
        self.car_count.store(value, Ordering::Relaxed);
    }

    pub fn update_speed(&self, value: f32) {
        self.speed.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Read every field once.
    pub fn read_snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            heart_rate: self.heart_rate.load(Ordering::Relaxed),
            car_count: self.car_count.load(Ordering::Relaxed),
            speed: f32::from_bits(self.speed.load(Ordering::Relaxed)),
        }
    }
}

/// Thread-safe shared metric store.
pub type SharedMetrics = Arc<MetricState>;

/// Create a new shared metric store.
pub fn create_shared_metrics() -> SharedMetrics {
    Arc::new(MetricState::new())
}

/// Count the occupied slots of a radar target list.
///
/// Always walks the whole list; the result replaces the previous count.
pub fn count_present_targets<T>(targets: &[Option<T>]) -> usize {
    targets.iter().filter(|target| target.is_some()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_defaults_are_zero() {
        let state = MetricState::new();
        assert_eq!(state.read_snapshot(), MetricSnapshot::default());
        assert_eq!(state.read_snapshot().speed, 0.0);
    }

    #[test]
    fn test_fields_update_independently() {
        let state = MetricState::new();
        state.update_heart_rate(72);
        state.update_speed(8.25);

        let snapshot = state.read_snapshot();
        assert_eq!(snapshot.heart_rate, 72);
        assert_eq!(snapshot.car_count, 0);
        assert_eq!(snapshot.speed, 8.25);

        state.update_car_count(3);
        let snapshot = state.read_snapshot();
        assert_eq!(snapshot.heart_rate, 72);
        assert_eq!(snapshot.car_count, 3);
    }

    #[test]
    fn test_out_of_range_values_are_stored_as_is() {
        let state = MetricState::new();
        state.update_heart_rate(u32::MAX);
        state.update_speed(-1.5);
        let snapshot = state.read_snapshot();
        assert_eq!(snapshot.heart_rate, u32::MAX);
        assert_eq!(snapshot.speed, -1.5);
    }

    #[test]
    fn test_count_present_targets() {
        assert_eq!(count_present_targets(&[Some(1), None, Some(2), None]), 2);
        assert_eq!(count_present_targets::<u8>(&[]), 0);
        assert_eq!(count_present_targets::<u8>(&[None, None]), 0);
    }

    #[test]
    fn test_concurrent_reads_never_see_torn_values() {
        // Writers alternate between two bit patterns that differ in every byte;
        // any other observed value would be a torn read.
        const SPEED_A: f32 = 1.0e-20;
        const SPEED_B: f32 = -3.0e+30;
        const HR_A: u32 = 0x0000_0000;
        const HR_B: u32 = 0xFFFF_FFFF;

        let state = create_shared_metrics();
        state.update_heart_rate(HR_A);
        state.update_speed(SPEED_A);

        let writers: Vec<_> = (0..2)
            .map(|w| {
                let state = state.clone();
                thread::spawn(move || {
                    for i in 0..20_000u32 {
                        let flip = (i + w) % 2 == 0;
                        state.update_heart_rate(if flip { HR_A } else { HR_B });
                        state.update_speed(if flip { SPEED_A } else { SPEED_B });
                        state.update_car_count(if flip { 0 } else { usize::MAX });
                    }
                })
            })
            .collect();

        for _ in 0..20_000 {
            let snapshot = state.read_snapshot();
            assert!(snapshot.heart_rate == HR_A || snapshot.heart_rate == HR_B);
            assert!(snapshot.speed == SPEED_A || snapshot.speed == SPEED_B);
            assert!(snapshot.car_count == 0 || snapshot.car_count == usize::MAX);
        }

        for writer in writers {
            writer.join().unwrap();
        }
    }
}
