//! Interrupt handling and session teardown.

use crate::device::DeviceSession;
use crossbeam_channel::{bounded, Receiver};
use std::sync::Arc;

/// Lifecycle of the agent process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Terminated,
}

/// Owns the device session for teardown.
///
/// This is the only place a session is closed.
pub struct ShutdownController {
    state: ShutdownState,
    session: Option<Arc<dyn DeviceSession>>,
}

impl ShutdownController {
    /// Exit code reported once terminated.
    pub const EXIT_CODE: i32 = 0;

    pub fn new(session: Option<Arc<dyn DeviceSession>>) -> Self {
        Self {
            state: ShutdownState::Running,
            session,
        }
    }

    pub fn state(&self) -> ShutdownState {
        self.state
    }

    /// Release the session, if any, and return the process exit code.
    ///
    /// A missing session is not an error, and calling this again after
    /// termination does nothing.
    pub fn shutdown(&mut self) -> i32 {
        if self.state == ShutdownState::Terminated {
            return Self::EXIT_CODE;
        }

        self.state = ShutdownState::ShuttingDown;
        match self.session.take() {
            Some(session) => {
                tracing::info!("closing device session");
                session.close();
            }
            None => tracing::debug!("no device session to close"),
        }
        self.state = ShutdownState::Terminated;

        Self::EXIT_CODE
    }
}

/// Forward the process interrupt signal onto a channel.
pub fn install_interrupt_handler() -> Result<Receiver<()>, ctrlc::Error> {
    let (sender, receiver) = bounded(1);
    ctrlc::set_handler(move || {
        // A full channel means an interrupt is already pending.
        let _ = sender.try_send(());
    })?;
    Ok(receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceError, StartupCallback};
    use std::sync::atomic::{AtomicUsize, Ordering};

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

    #[test]
    fn test_shutdown_without_session() {
        let mut controller = ShutdownController::new(None);
        assert_eq!(controller.state(), ShutdownState::Running);
        assert_eq!(controller.shutdown(), 0);
        assert_eq!(controller.state(), ShutdownState::Terminated);
    }

    #[test]
    fn test_shutdown_closes_session_once() {
        let session = Arc::new(CountingSession::default());
        let mut controller = ShutdownController::new(Some(session.clone()));

        assert_eq!(controller.shutdown(), 0);
        assert_eq!(controller.shutdown(), 0);
        assert_eq!(session.closes.load(Ordering::SeqCst), 1);
    }
}
