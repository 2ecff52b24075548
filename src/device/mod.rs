//! Device layer for the ANT+ metrics agent.
//!
//! The radio protocol and USB transport are collaborators; this module holds
//! the traits the core drives them through, plus the backends the binary can
//! run against.

pub mod noop;
pub mod sim;
pub mod types;

// Re-export commonly used types
pub use noop::{noop_suite, NoopScanner, NoopSession};
pub use sim::{simulated_suite, SimConfig, SimScanner, SimulatedStick};
pub use types::{
    AttachCallback, DataCallback, DeviceError, DeviceSession, HeartRateReading, RadarReading,
    RadarTarget, Scanner, SensorSuite, SpeedReading, StartupCallback,
};
