//! Core functionality for the ANT+ metrics agent.
//!
//! This module contains:
//! - The latest-value metric store shared by scanners and the reporter
//! - Startup sequencing of the device session and scanners
//! - Shutdown handling for the device session
//! - The interrupt/ticker event loop

pub mod aggregator;
pub mod event_loop;
pub mod shutdown;
pub mod startup;

// Re-export commonly used types
pub use aggregator::{
    count_present_targets, create_shared_metrics, MetricSnapshot, MetricState, SharedMetrics,
};
pub use event_loop::run;
pub use shutdown::{install_interrupt_handler, ShutdownController, ShutdownState};
pub use startup::{start_monitor, Monitor, ScanGate};
