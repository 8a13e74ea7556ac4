//! Background reconnect supervisor for the job-service client
//! (SPEC_FULL §12, resolving spec §9's guidance): a supervised task with
//! a cancellable token and a readiness flag the scheduler consults
//! before each tick, replacing a goroutine-dial-in-constructor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Tracks whether the job-service client is currently reachable. Starts
/// "not ready" and flips to ready once `probe` succeeds; if a later probe
/// run detects the dependency went away it can be reset externally.
pub struct ReadinessGate {
    ready: AtomicBool,
    notify: Notify,
}

impl ReadinessGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(false),
            notify: Notify::new(),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
        self.notify.notify_waiters();
    }
}

/// Spawns a task that retries `probe` every [`RECONNECT_BACKOFF`] until it
/// succeeds, then marks the gate ready. Does not block the caller —
/// `new` style constructors can hand back immediately so services boot
/// out of order (spec §9).
pub fn spawn_reconnect<F, Fut>(gate: Arc<ReadinessGate>, cancel: CancellationToken, probe: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = dts_core::error::Result<()>> + Send,
{
    tokio::spawn(async move {
        loop {
            if cancel.is_cancelled() {
                return;
            }

            match probe().await {
                Ok(()) => {
                    gate.set_ready(true);
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "job-service unreachable, retrying in 5s");
                    tokio::select! {
                        _ = tokio::time::sleep(RECONNECT_BACKOFF) => {}
                        _ = cancel.cancelled() => return,
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[tokio::test]
    async fn gate_flips_ready_once_probe_succeeds() {
        let gate = ReadinessGate::new();
        let cancel = CancellationToken::new();
        let attempts = Arc::new(AtomicU32::new(0));

        assert!(!gate.is_ready());

        let attempts_clone = attempts.clone();
        spawn_reconnect(gate.clone(), cancel.clone(), move || {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::timeout(Duration::from_secs(1), async {
            while !gate.is_ready() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("gate should become ready");

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
