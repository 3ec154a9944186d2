//! Process lifecycle for the HTTP services.
//!
//! A service moves through four phases:
//!
//! ```text
//! Starting --bind--> Running --signal--> Draining --drained--> Terminated
//! ```
//!
//! The termination signal is observed exactly once. A signal that arrives while
//! the listener is still being bound is remembered, and the server drains as
//! soon as it starts instead of entering `Running`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

mod error;
mod metrics;
mod server;
mod signals;

pub use error::LifecycleError;
pub use server::{bind, serve, ShutdownReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Starting = 0,
    Running = 1,
    Draining = 2,
    Terminated = 3,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Phase::Starting,
            1 => Phase::Running,
            2 => Phase::Draining,
            _ => Phase::Terminated,
        }
    }
}

/// Shared handle on the lifecycle of one service process. Cheap to clone,
/// every clone observes the same phase.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    service_name: Arc<str>,
    shutdown_token: CancellationToken,
    phase: Arc<AtomicU8>,
}

impl Lifecycle {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: Arc::from(service_name),
            shutdown_token: CancellationToken::new(),
            phase: Arc::new(AtomicU8::new(Phase::Starting as u8)),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// True from the moment shutdown was requested, including after termination.
    pub fn is_draining(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Request shutdown. Returns true for the call that actually started the
    /// drain, false for every later one.
    pub fn begin_drain(&self, reason: &str) -> bool {
        let started = self
            .phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match Phase::from_u8(current) {
                    Phase::Starting | Phase::Running => Some(Phase::Draining as u8),
                    Phase::Draining | Phase::Terminated => None,
                }
            })
            .is_ok();

        if started {
            tracing::info!(
                service_name = %self.service_name,
                reason,
                "shutdown requested, draining"
            );
            metrics::emit_shutdown_initiated(&self.service_name, reason);
            self.shutdown_token.cancel();
        }
        started
    }

    /// Resolves once shutdown has been requested.
    pub fn shutdown_signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let token = self.shutdown_token.clone();
        async move { token.cancelled().await }
    }

    /// Spawn a task that starts the drain on SIGTERM or SIGINT.
    pub fn trap_signals(&self) -> JoinHandle<()> {
        let lifecycle = self.clone();
        tokio::spawn(async move {
            match signals::wait_for_shutdown_signal().await {
                Ok(name) => {
                    lifecycle.begin_drain(name);
                }
                Err(e) => tracing::error!("failed to install signal handlers: {}", e),
            }
        })
    }

    /// Starting -> Running. A drain requested before this point wins.
    pub(crate) fn mark_running(&self) -> bool {
        self.phase
            .compare_exchange(
                Phase::Starting as u8,
                Phase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn mark_terminated(&self) {
        self.phase.store(Phase::Terminated as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_starting() {
        let lifecycle = Lifecycle::new("test");
        assert_eq!(lifecycle.phase(), Phase::Starting);
        assert!(!lifecycle.is_draining());
    }

    #[test]
    fn drain_is_observed_once() {
        let lifecycle = Lifecycle::new("test");
        assert!(lifecycle.mark_running());
        assert_eq!(lifecycle.phase(), Phase::Running);

        let clone = lifecycle.clone();
        assert!(clone.begin_drain("SIGTERM"));
        assert!(!lifecycle.begin_drain("SIGINT"));
        assert_eq!(lifecycle.phase(), Phase::Draining);
        assert!(lifecycle.is_draining());
    }

    #[test]
    fn signal_during_startup_is_remembered() {
        let lifecycle = Lifecycle::new("test");
        assert!(lifecycle.begin_drain("SIGTERM"));
        assert!(!lifecycle.mark_running());
        assert_eq!(lifecycle.phase(), Phase::Draining);
    }

    #[test]
    fn no_drain_after_termination() {
        let lifecycle = Lifecycle::new("test");
        lifecycle.mark_terminated();
        assert!(!lifecycle.begin_drain("SIGTERM"));
        assert_eq!(lifecycle.phase(), Phase::Terminated);
    }

    #[tokio::test]
    async fn shutdown_signal_resolves_after_drain() {
        let lifecycle = Lifecycle::new("test");
        let signal = lifecycle.shutdown_signal();
        lifecycle.begin_drain("test");
        tokio::time::timeout(std::time::Duration::from_secs(1), signal)
            .await
            .expect("shutdown signal did not resolve");
    }
}
