//! Device backend used when no ANT+ USB driver is available.
//!
//! Opening always fails, so the agent runs in its degraded mode and keeps
//! reporting zero-valued metrics.

use crate::device::types::{
    AttachCallback, DataCallback, DeviceError, DeviceSession, HeartRateReading, RadarReading,
    Scanner, SensorSuite, SpeedReading, StartupCallback,
};
use std::marker::PhantomData;
use std::sync::Arc;

/// A session that can never be opened.
#[derive(Debug, Default)]
pub struct NoopSession;

impl DeviceSession for NoopSession {
    fn on_startup(&self, _callback: StartupCallback) {}

    fn open(&self) -> Result<(), DeviceError> {
        Err(DeviceError::Unavailable(
            "no ANT+ USB driver available on this build".to_string(),
        ))
    }

    fn close(&self) {}
}

/// A scanner that never emits readings.
pub struct NoopScanner<R> {
    _reading: PhantomData<fn() -> R>,
}

impl<R> NoopScanner<R> {
    pub fn new() -> Self {
        Self {
            _reading: PhantomData,
        }
    }
}

impl<R> Default for NoopScanner<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Scanner for NoopScanner<R> {
    type Reading = R;

    fn scan(&self) -> Result<(), DeviceError> {
        Err(DeviceError::NotOpen)
    }

    fn listen_for_data(&self, _callback: DataCallback<R>) {}

    fn set_on_attach(&self, _callback: AttachCallback) {}
}

/// Build a suite where every component is a no-op.
pub fn noop_suite() -> SensorSuite {
    SensorSuite {
        session: Arc::new(NoopSession),
        heart_rate: Arc::new(NoopScanner::<HeartRateReading>::new()),
        radar: Arc::new(NoopScanner::<RadarReading>::new()),
        speed: Arc::new(NoopScanner::<SpeedReading>::new()),
    }
}
