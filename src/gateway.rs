//! Gateway client for reporting metrics to the remote collector.
//!
//! Each report is a single form-encoded POST carrying `hr`, `cars` and `speed`.
//! Failures are logged and counted; nothing is retried.

use crate::core::MetricSnapshot;
use crate::stats::SharedRelayStats;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Default collector endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://burtbot.app/metrics";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Full URL of the collector endpoint
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Create a new gateway configuration.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, Duration::from_secs(10))
    }
}

/// Gateway client error types.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway config error: {0}")]
    Config(String),
    #[error("Gateway network error: {0}")]
    Network(String),
    #[error("Gateway server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Form body posted to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsForm {
    /// Heart rate, decimal integer
    pub hr: String,
    /// Vehicle count, decimal integer
    pub cars: String,
    /// Speed with exactly one fraction digit
    pub speed: String,
}

impl From<&MetricSnapshot> for MetricsForm {
    fn from(snapshot: &MetricSnapshot) -> Self {
        Self {
            hr: snapshot.heart_rate.to_string(),
            cars: snapshot.car_count.to_string(),
            speed: format_speed(snapshot.speed),
        }
    }
}

/// Format a speed with one fraction digit.
///
/// Rounds half to even on the exact binary value of the reading, so `8.25`
/// becomes `"8.2"` while `8.35f32` (stored slightly above 8.35) becomes `"8.4"`.
/// NaN and infinite readings carry no usable speed and are sent as `"0.0"`.
pub fn format_speed(speed: f32) -> String {
    if !speed.is_finite() {
        return "0.0".to_string();
    }
    // f32 * 10 is exact in f64, so ties are real ties.
    let tenths = (f64::from(speed) * 10.0).round_ties_even();
    format!("{:.1}", tenths / 10.0)
}

/// Async client for the collector endpoint.
pub struct GatewayClient {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a new gateway client.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Post one set of metrics. The response body is ignored.
    pub async fn send(&self, form: &MetricsForm) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Get the configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

/// Fires reports from synchronous code without waiting on them.
///
/// Each report runs as its own task on the reporter's runtime, so a slow
/// collector never holds up the caller and calls from consecutive ticks may
/// overlap.
pub struct Reporter {
    client: Arc<GatewayClient>,
    stats: SharedRelayStats,
    runtime: tokio::runtime::Runtime,
}

impl Reporter {
    /// Create a new reporter with its own runtime.
    pub fn new(config: GatewayConfig, stats: SharedRelayStats) -> Result<Self, GatewayError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("gateway")
            .enable_all()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            client: Arc::new(GatewayClient::new(config)?),
            stats,
            runtime,
        })
    }

    /// Send a snapshot in the background.
    pub fn report(&self, snapshot: MetricSnapshot) -> JoinHandle<()> {
        let form = MetricsForm::from(&snapshot);
        let client = self.client.clone();
        let stats = self.stats.clone();
        stats.record_report_attempt();

        self.runtime.spawn(async move {
            match client.send(&form).await {
                Ok(()) => {
                    stats.record_report_sent();
                    tracing::debug!(
                        hr = %form.hr,
                        cars = %form.cars,
                        speed = %form.speed,
                        "metrics reported"
                    );
                }
                Err(e) => {
                    stats.record_report_failed();
                    tracing::warn!(
                        error = %e,
                        endpoint = client.endpoint(),
                        "metrics report failed"
                    );
                }
            }
        })
    }

    #[cfg(test)]
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::create_shared_stats;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.endpoint, "https://burtbot.app/metrics");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_format_speed_rounds_half_to_even() {
        assert_eq!(format_speed(8.25), "8.2");
        assert_eq!(format_speed(0.25), "0.2");
        assert_eq!(format_speed(0.75), "0.8");
        assert_eq!(format_speed(8.35), "8.4");
        assert_eq!(format_speed(8.15), "8.1");
    }

    #[test]
    fn test_format_speed_plain_values() {
        assert_eq!(format_speed(0.0), "0.0");
        assert_eq!(format_speed(12.0), "12.0");
        assert_eq!(format_speed(31.96), "32.0");
    }

    #[test]
    fn test_format_speed_non_finite_is_zero() {
        assert_eq!(format_speed(f32::NAN), "0.0");
        assert_eq!(format_speed(f32::INFINITY), "0.0");
        assert_eq!(format_speed(f32::NEG_INFINITY), "0.0");
    }

    #[test]
    fn test_form_from_snapshot() {
        let snapshot = MetricSnapshot {
            heart_rate: 72,
            car_count: 2,
            speed: 8.25,
        };
        let form = MetricsForm::from(&snapshot);
        assert_eq!(form.hr, "72");
        assert_eq!(form.cars, "2");
        assert_eq!(form.speed, "8.2");
    }

    #[test]
    fn test_zero_snapshot_form() {
        let form = MetricsForm::from(&MetricSnapshot::default());
        assert_eq!(
            form,
            MetricsForm {
                hr: "0".to_string(),
                cars: "0".to_string(),
                speed: "0.0".to_string(),
            }
        );
    }

    #[test]
    fn test_server_error_display() {
        let err = GatewayError::Server {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(err.to_string(), "Gateway server error (503): down");
    }

    #[test]
    fn test_failed_tick_does_not_block_next_tick() {
        // Nothing listens on port 1, so every send fails fast.
        let config = GatewayConfig::new("http://127.0.0.1:1/metrics", Duration::from_secs(2));
        let stats = create_shared_stats();
        let reporter = Reporter::new(config, stats.clone()).unwrap();

        let first = reporter.report(MetricSnapshot::default());
        reporter.block_on(first).unwrap();
        assert_eq!(stats.snapshot().reports_failed, 1);

        let second = reporter.report(MetricSnapshot {
            heart_rate: 80,
            ..MetricSnapshot::default()
        });
        reporter.block_on(second).unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.reports_attempted, 2);
        assert_eq!(snapshot.reports_failed, 2);
        assert_eq!(snapshot.reports_sent, 0);
    }
}
