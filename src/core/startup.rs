//! Startup sequencing for the sensor scanners.
//!
//! The order is fixed:
//!
//! ```text
//! session.open() ──▶ startup event ──▶ speed.scan()
//!                                          │
//!                                    speed attached
//!                                          │
//!                                   ScanGate::release()
//!                                     ├──▶ radar.scan()
//!                                     └──▶ heart_rate.scan()
//! ```
//!
//! Radar and heart-rate scanning only ever start through the gate.

use crate::core::aggregator::{count_present_targets, SharedMetrics};
use crate::device::{
    DeviceError, DeviceSession, HeartRateReading, RadarReading, SensorSuite, SpeedReading,
};
use crate::stats::SharedRelayStats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type ScanStart = Box<dyn Fn() -> Result<(), DeviceError> + Send + Sync>;

/// One-shot latch holding the scan-starts that wait on the speed sensor.
///
/// The latch closes before any dependent runs, so a panicking scan-start
/// cannot cause a later release to run or panic again.
pub struct ScanGate {
    released: AtomicBool,
    dependents: Vec<(&'static str, ScanStart)>,
}

impl ScanGate {
    pub fn new() -> Self {
        Self {
            released: AtomicBool::new(false),
            dependents: Vec::new(),
        }
    }

    /// Add a scan-start to run when the gate is released.
    pub fn with_dependent(
        mut self,
        name: &'static str,
        start: impl Fn() -> Result<(), DeviceError> + Send + Sync + 'static,
    ) -> Self {
        self.dependents.push((name, Box::new(start)));
        self
    }

    /// Start every dependent scanner. Only the first call has any effect.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        for (name, start) in &self.dependents {
            match start() {
                Ok(()) => tracing::debug!(scanner = *name, "scan started"),
                Err(e) => tracing::warn!(scanner = *name, error = %e, "scan failed to start"),
            }
        }
    }

    /// Check whether the gate has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of starting the monitor.
pub struct Monitor {
    /// The open session, or `None` when opening failed
    pub session: Option<Arc<dyn DeviceSession>>,
    gate: Arc<ScanGate>,
}

impl Monitor {
    /// Check whether the device session opened.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Check whether radar and heart-rate scanning have been started.
    pub fn dependents_started(&self) -> bool {
        self.gate.is_released()
    }
}

/// Wire the scanners into the metric store and open the device session.
///
/// Opening failures are logged and leave the agent in its degraded mode:
/// no scanning, metrics stay at zero, and the returned monitor has no session.
pub fn start_monitor(
    suite: &SensorSuite,
    metrics: SharedMetrics,
    stats: SharedRelayStats,
    heart_rate_sensor_id: u16,
) -> Monitor {
    let m = metrics.clone();
    let s = stats.clone();
    suite.heart_rate.listen_for_data(Box::new(move |reading: &HeartRateReading| {
        let accepted = reading.device_id == heart_rate_sensor_id;
        if accepted {
            m.update_heart_rate(u32::from(reading.computed_heart_rate));
        }
        s.record_heart_rate(accepted);
    }));
    suite
        .heart_rate
        .set_on_attach(Box::new(|| tracing::info!("Heart rate sensor attached")));

    let m = metrics.clone();
    let s = stats.clone();
    suite.radar.listen_for_data(Box::new(move |reading: &RadarReading| {
        m.update_car_count(count_present_targets(&reading.targets));
        s.record_radar_reading();
    }));
    suite
        .radar
        .set_on_attach(Box::new(|| tracing::info!("Radar sensor attached")));

    let m = metrics;
    let s = stats;
    suite.speed.listen_for_data(Box::new(move |reading: &SpeedReading| {
        m.update_speed(reading.calculated_speed);
        s.record_speed_reading();
    }));

    let radar = suite.radar.clone();
    let heart_rate = suite.heart_rate.clone();
    let gate = Arc::new(
        ScanGate::new()
            .with_dependent("radar", move || radar.scan())
            .with_dependent("heart-rate", move || heart_rate.scan()),
    );
    let g = gate.clone();
    suite.speed.set_on_attach(Box::new(move || {
        tracing::info!("Speed sensor attached");
        g.release();
    }));

    let speed = suite.speed.clone();
    suite.session.on_startup(Box::new(move || {
        if let Err(e) = speed.scan() {
            tracing::warn!(scanner = "speed", error = %e, "scan failed to start");
        }
    }));

    let session = match suite.session.open() {
        Ok(()) => {
            tracing::info!("device session opened");
            Some(suite.session.clone())
        }
        Err(e) => {
            tracing::error!(error = %e, "error opening usb driver, reporting zeros");
            None
        }
    };

    Monitor { session, gate }
}
