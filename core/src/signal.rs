//! Single-slot completion notification.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::timeout;

/// Lossy completion signal.
///
/// The worker pulses this once per processed request, releasing at most
/// one waiter. A pulse with no waiter is dropped, not buffered, so the
/// worker can never block on an absent caller. Any timeout a caller
/// applies to [`wait`](Self::wait) is advisory: if it elapses, the request
/// may still be processed in the background.
#[derive(Debug, Default)]
pub struct CompletionSignal {
    notify: Notify,
    waiters: AtomicUsize,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release one waiter, if any. Never blocks.
    pub fn pulse(&self) {
        if self.waiters.load(Ordering::Acquire) > 0 {
            self.notify.notify_one();
        }
    }

    /// Wait until the next pulse.
    pub async fn wait(&self) {
        let _guard = WaiterGuard::register(self);
        self.notify.notified().await;
    }

    /// Wait until the next pulse or until `dur` elapses. Returns `true`
    /// when a pulse was observed.
    pub async fn wait_timeout(&self, dur: Duration) -> bool {
        timeout(dur, self.wait()).await.is_ok()
    }
}

/// Keeps the waiter count accurate even when a wait is cancelled by a
/// timeout.
struct WaiterGuard<'a> {
    signal: &'a CompletionSignal,
}

impl<'a> WaiterGuard<'a> {
    fn register(signal: &'a CompletionSignal) -> Self {
        signal.waiters.fetch_add(1, Ordering::AcqRel);
        Self { signal }
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.signal.waiters.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_pulse_without_waiter_is_dropped_not_buffered() {
        let signal = CompletionSignal::new();
        signal.pulse();

        // The earlier pulse must not satisfy a later wait.
        assert!(!signal.wait_timeout(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn test_wait_timeout_elapses_without_pulse() {
        let signal = CompletionSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pulse_releases_a_registered_waiter() {
        let signal = Arc::new(CompletionSignal::new());

        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.wait_timeout(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        signal.pulse();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pulse_releases_at_most_one_waiter() {
        let signal = Arc::new(CompletionSignal::new());
        let released = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let signal = Arc::clone(&signal);
            let released = Arc::clone(&released);
            tokio::spawn(async move {
                signal.wait().await;
                released.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        signal.pulse();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(released.load(Ordering::SeqCst), 1);

        signal.pulse();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
