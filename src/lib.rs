//! ANT+ Metrics Agent - relays live ride sensor readings to a remote collector.
//!
//! Heart-rate, bike radar and speed sensors are read through a USB radio stick.
//! Their latest values are kept in a shared store and posted to a collector
//! once per reporting interval.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ANT+ Metrics Agent                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Scanners   │──▶│   Metric    │──▶│  Reporter   │──▶ POST│
//! │  │ (callbacks) │   │   State     │   │  (1s tick)  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         ▲                                                    │
//! │  ┌─────────────┐                     ┌─────────────┐        │
//! │  │   Startup   │                     │  Shutdown   │◀── ^C  │
//! │  │  sequence   │                     │ controller  │        │
//! │  └─────────────┘                     └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ant_metrics_agent::{core, device, stats};
//!
//! let metrics = core::create_shared_metrics();
//! let suite = device::simulated_suite(device::SimConfig::default());
//! let monitor = core::start_monitor(&suite, metrics.clone(), stats::create_shared_stats(), 56482);
//!
//! println!("connected: {}", monitor.is_connected());
//! println!("{:?}", metrics.read_snapshot());
//! ```

pub mod config;
pub mod core;
pub mod device;
pub mod gateway;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, DeviceKind};
pub use self::core::{
    start_monitor, Monitor, MetricSnapshot, MetricState, SharedMetrics, ShutdownController,
};
pub use device::{DeviceError, DeviceSession, Scanner, SensorSuite};
pub use gateway::{format_speed, GatewayClient, GatewayConfig, GatewayError, MetricsForm, Reporter};
pub use stats::{RelayStats, SharedRelayStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the sensor suite for a configured device backend.
pub fn build_suite(config: &Config) -> SensorSuite {
    match config.device {
        DeviceKind::Sim => device::simulated_suite(device::SimConfig {
            heart_rate_device_id: config.heart_rate_sensor_id,
            ..device::SimConfig::default()
        }),
        DeviceKind::None => device::noop_suite(),
    }
}
