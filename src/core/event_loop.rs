//! The agent's top-level loop.
//!
//! Waits on the interrupt channel and the report ticker. Only one of the two
//! is handled at a time; reports themselves run in the background.

use crate::core::aggregator::SharedMetrics;
use crate::core::shutdown::ShutdownController;
use crate::gateway::Reporter;
use crossbeam_channel::{select, Receiver};
use std::time::Instant;

/// Run until an interrupt arrives, then shut down and return the exit code.
///
/// A disconnected interrupt channel is treated as an interrupt.
pub fn run(
    signals: &Receiver<()>,
    ticker: &Receiver<Instant>,
    metrics: &SharedMetrics,
    reporter: &Reporter,
    shutdown: &mut ShutdownController,
) -> i32 {
    loop {
        select! {
            recv(signals) -> _ => {
                tracing::info!("interrupt received, shutting down");
                return shutdown.shutdown();
            }
            recv(ticker) -> _ => {
                // Fire and forget: a slow collector must not delay the next tick.
                let _ = reporter.report(metrics.read_snapshot());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::create_shared_metrics;
    use crate::core::shutdown::ShutdownState;
    use crate::device::{DeviceError, DeviceSession, StartupCallback};
    use crate::gateway::GatewayConfig;
    use crate::stats::create_shared_stats;
    use crossbeam_channel::{bounded, tick};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSession {
        closes: AtomicUsize,
    }

    impl DeviceSession for CountingSession {
        fn on_startup(&self, _callback: StartupCallback) {}

        fn open(&self) -> Result<(), DeviceError> {
            Ok(())
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn unreachable_reporter() -> (Reporter, crate::stats::SharedRelayStats) {
        let stats = create_shared_stats();
        let config = GatewayConfig::new("http://127.0.0.1:1/metrics", Duration::from_secs(2));
        (Reporter::new(config, stats.clone()).unwrap(), stats)
    }

    #[test]
    fn test_interrupt_closes_session_and_exits_zero() {
        let session = Arc::new(CountingSession::default());
        let mut shutdown = ShutdownController::new(Some(session.clone()));
        let (reporter, _stats) = unreachable_reporter();
        let (signal_tx, signals) = bounded(1);
        let ticker = tick(Duration::from_millis(10));

        signal_tx.send(()).unwrap();
        let code = run(&signals, &ticker, &create_shared_metrics(), &reporter, &mut shutdown);

        assert_eq!(code, 0);
        assert_eq!(session.closes.load(Ordering::SeqCst), 1);
        assert_eq!(shutdown.state(), ShutdownState::Terminated);
    }

    #[test]
    fn test_interrupt_without_session_exits_zero() {
        let mut shutdown = ShutdownController::new(None);
        let (reporter, _stats) = unreachable_reporter();
        let (signal_tx, signals) = bounded(1);
        let ticker = tick(Duration::from_millis(10));

        signal_tx.send(()).unwrap();
        let code = run(&signals, &ticker, &create_shared_metrics(), &reporter, &mut shutdown);

        assert_eq!(code, 0);
        assert_eq!(shutdown.state(), ShutdownState::Terminated);
    }

    #[test]
    fn test_ticks_report_until_interrupted() {
        let mut shutdown = ShutdownController::new(None);
        let (reporter, stats) = unreachable_reporter();
        let (signal_tx, signals) = bounded(1);
        let ticker = tick(Duration::from_millis(10));

        let interrupter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            signal_tx.send(()).unwrap();
        });
        let code = run(&signals, &ticker, &create_shared_metrics(), &reporter, &mut shutdown);
        interrupter.join().unwrap();

        assert_eq!(code, 0);
        assert!(stats.snapshot().reports_attempted >= 2);
    }
}
