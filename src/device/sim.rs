//! Simulated ANT+ USB stick.
//!
//! Behaves like a real stick from the core's point of view: startup callbacks
//! fire from the stick's own I/O thread after `open`, and every scanner runs on
//! its own thread once started, attaching once and then streaming synthetic
//! readings until the session is closed.

use crate::device::types::{
    AttachCallback, DataCallback, DeviceError, DeviceSession, HeartRateReading, RadarReading,
    RadarTarget, Scanner, SensorSuite, SpeedReading, StartupCallback,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Number of target slots in a radar page.
pub const RADAR_TARGET_SLOTS: usize = 8;

/// Tuning for the simulated stick.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Device number the simulated heart-rate strap of interest broadcasts with
    pub heart_rate_device_id: u16,
    /// Device number of a second strap in range that must be ignored
    pub foreign_device_id: u16,
    /// Interval between readings on each scanner
    pub period: Duration,
    /// Delay between `scan()` and the attach event
    pub attach_delay: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            heart_rate_device_id: crate::config::DEFAULT_HEART_RATE_SENSOR_ID,
            foreign_device_id: 1111,
            period: Duration::from_millis(250),
            attach_delay: Duration::from_millis(500),
        }
    }
}

fn current<T: ?Sized>(slot: &Mutex<Option<Arc<T>>>) -> Option<Arc<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// The simulated stick's session handle.
pub struct SimulatedStick {
    open: Arc<AtomicBool>,
    startup: Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>,
}

impl SimulatedStick {
    fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(false)),
            startup: Mutex::new(Vec::new()),
        }
    }
}

impl DeviceSession for SimulatedStick {
    fn on_startup(&self, callback: StartupCallback) {
        self.startup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::from(callback));
    }

    fn open(&self) -> Result<(), DeviceError> {
        if self.open.swap(true, Ordering::SeqCst) {
            return Err(DeviceError::AlreadyOpen);
        }

        let callbacks = self
            .startup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        thread::Builder::new()
            .name("sim-stick-io".to_string())
            .spawn(move || {
                for callback in callbacks {
                    callback();
                }
            })
            .map_err(|e| {
                self.open.store(false, Ordering::SeqCst);
                DeviceError::Io(e.to_string())
            })?;

        tracing::debug!("simulated stick opened");
        Ok(())
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            tracing::debug!("simulated stick closed");
        }
    }
}

/// A scanner driven by a reading generator.
pub struct SimScanner<R> {
    name: &'static str,
    open: Arc<AtomicBool>,
    period: Duration,
    attach_delay: Duration,
    scanning: AtomicBool,
    generator: Arc<dyn Fn(u64) -> R + Send + Sync>,
    on_data: Arc<Mutex<Option<Arc<dyn Fn(&R) + Send + Sync>>>>,
    on_attach: Arc<Mutex<Option<Arc<dyn Fn() + Send + Sync>>>>,
}

impl<R> SimScanner<R> {
    fn new(
        name: &'static str,
        stick: &SimulatedStick,
        config: &SimConfig,
        generator: impl Fn(u64) -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            open: stick.open.clone(),
            period: config.period,
            attach_delay: config.attach_delay,
            scanning: AtomicBool::new(false),
            generator: Arc::new(generator),
            on_data: Arc::new(Mutex::new(None)),
            on_attach: Arc::new(Mutex::new(None)),
        }
    }
}

impl<R: Send + 'static> Scanner for SimScanner<R> {
    type Reading = R;

    fn scan(&self) -> Result<(), DeviceError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(DeviceError::NotOpen);
        }
        if self.scanning.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let open = self.open.clone();
        let period = self.period;
        let attach_delay = self.attach_delay;
        let generator = self.generator.clone();
        let on_data = self.on_data.clone();
        let on_attach = self.on_attach.clone();

        thread::Builder::new()
            .name(format!("sim-{}", self.name))
            .spawn(move || {
                thread::sleep(attach_delay);
                if !open.load(Ordering::SeqCst) {
                    return;
                }
                if let Some(callback) = current(&*on_attach) {
                    callback();
                }

                let mut sequence = 0u64;
                while open.load(Ordering::SeqCst) {
                    let reading = generator(sequence);
                    if let Some(callback) = current(&*on_data) {
                        callback(&reading);
                    }
                    sequence = sequence.wrapping_add(1);
                    thread::sleep(period);
                }
            })
            .map_err(|e| {
                self.scanning.store(false, Ordering::SeqCst);
                DeviceError::Io(e.to_string())
            })?;

        tracing::debug!(scanner = self.name, "simulated scan started");
        Ok(())
    }

    fn listen_for_data(&self, callback: DataCallback<R>) {
        *self.on_data.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(callback));
    }

    fn set_on_attach(&self, callback: AttachCallback) {
        *self.on_attach.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(callback));
    }
}

/// Heart rate pattern: every fifth broadcast comes from the foreign strap.
pub fn heart_rate_pattern(config: &SimConfig, sequence: u64) -> HeartRateReading {
    if sequence % 5 == 4 {
        HeartRateReading {
            device_id: config.foreign_device_id,
            computed_heart_rate: 180,
        }
    } else {
        HeartRateReading {
            device_id: config.heart_rate_device_id,
            computed_heart_rate: 60 + ((sequence * 3) % 40) as u8,
        }
    }
}

/// Radar pattern: zero to three vehicles spread over alternate slots.
pub fn radar_pattern(sequence: u64) -> RadarReading {
    let vehicles = ((sequence / 4) % 4) as usize;
    let approach = (sequence % 4) as f32 * 5.0;
    let targets = (0..RADAR_TARGET_SLOTS)
        .map(|slot| {
            let rank = slot / 2;
            (slot % 2 == 0 && rank < vehicles).then(|| RadarTarget {
                range_m: 40.0 + 30.0 * rank as f32 - approach,
                closing_speed_mps: 4.0,
            })
        })
        .collect();
    RadarReading { targets }
}

/// Speed pattern: a slow ramp that wraps around.
pub fn speed_pattern(sequence: u64) -> SpeedReading {
    SpeedReading {
        calculated_speed: 5.0 + (sequence % 40) as f32 * 0.25,
    }
}

/// Build a simulated stick and its three scanners.
pub fn simulated_suite(config: SimConfig) -> SensorSuite {
    let stick = SimulatedStick::new();

    let hr_config = config.clone();
    let heart_rate = SimScanner::new("heart-rate", &stick, &config, move |n| {
        heart_rate_pattern(&hr_config, n)
    });
    let radar = SimScanner::new("radar", &stick, &config, radar_pattern);
    let speed = SimScanner::new("speed", &stick, &config, speed_pattern);

    SensorSuite {
        session: Arc::new(stick),
        heart_rate: Arc::new(heart_rate),
        radar: Arc::new(radar),
        speed: Arc::new(speed),
    }
}
