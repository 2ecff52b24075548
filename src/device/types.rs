//! Reading types and collaborator traits for the ANT+ device layer.
//!
//! The radio protocol and USB transport live behind these traits. The core only
//! registers callbacks and asks scanners to start.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Decoded heart-rate broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateReading {
    /// ANT+ device number of the broadcasting strap
    pub device_id: u16,
    /// Heart rate computed by the strap, beats per minute
    pub computed_heart_rate: u8,
}

/// A single tracked vehicle in a radar page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarTarget {
    /// Distance behind the rider in metres
    pub range_m: f32,
    /// Approach speed in metres per second
    pub closing_speed_mps: f32,
}

/// Decoded bike radar page.
///
/// Radar units report a fixed number of target slots; empty slots are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarReading {
    pub targets: Vec<Option<RadarTarget>>,
}

/// Decoded speed sensor broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedReading {
    pub calculated_speed: f32,
}

/// Errors raised by device sessions and scanners.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device unavailable: {0}")]
    Unavailable(String),
    #[error("device session is already open")]
    AlreadyOpen,
    #[error("device session is not open")]
    NotOpen,
    #[error("device I/O error: {0}")]
    Io(String),
}

pub type StartupCallback = Box<dyn Fn() + Send + Sync>;
pub type AttachCallback = Box<dyn Fn() + Send + Sync>;
pub type DataCallback<R> = Box<dyn Fn(&R) + Send + Sync>;

/// An opened radio handle.
pub trait DeviceSession: Send + Sync {
    /// Register a callback fired once the stick has finished its own startup.
    fn on_startup(&self, callback: StartupCallback);

    /// Open the transport. Startup callbacks fire after a successful open.
    fn open(&self) -> Result<(), DeviceError>;

    /// Release the transport. Scanners stop delivering after this returns.
    fn close(&self);
}

/// Listener for one class of sensor broadcast.
pub trait Scanner: Send + Sync {
    type Reading;

    /// Begin listening. Data callbacks only fire after this.
    fn scan(&self) -> Result<(), DeviceError>;

    fn listen_for_data(&self, callback: DataCallback<Self::Reading>);

    /// Fired once, on the first successful handshake with a device.
    fn set_on_attach(&self, callback: AttachCallback);
}

/// The session together with the three scanners bound to it.
#[derive(Clone)]
pub struct SensorSuite {
    pub session: Arc<dyn DeviceSession>,
    pub heart_rate: Arc<dyn Scanner<Reading = HeartRateReading>>,
    pub radar: Arc<dyn Scanner<Reading = RadarReading>>,
    pub speed: Arc<dyn Scanner<Reading = SpeedReading>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::Unavailable("no stick".to_string());
        assert_eq!(err.to_string(), "device unavailable: no stick");
        assert_eq!(DeviceError::NotOpen.to_string(), "device session is not open");
    }

    #[test]
    fn test_radar_reading_default_is_empty() {
        assert!(RadarReading::default().targets.is_empty());
    }
}
