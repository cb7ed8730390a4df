//! Bounded FIFO queue of pending ride requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::RideRequest;
use crate::error::DispatchError;

/// Producer handle for the bounded dispatch queue.
///
/// Enqueue is non-blocking: a full queue surfaces backpressure as
/// [`DispatchError::QueueFull`] instead of parking the caller, and a
/// queue closed for shutdown fails cleanly with
/// [`DispatchError::QueueClosed`].
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::Sender<RideRequest>,
    closed: Arc<AtomicBool>,
}

impl DispatchQueue {
    /// Create a queue of the given capacity plus its consumer half.
    /// `closed` is the shared shutdown flag; once set, producers are
    /// rejected while the worker drains nothing further.
    pub(crate) fn new(
        capacity: usize,
        closed: Arc<AtomicBool>,
    ) -> (Self, mpsc::Receiver<RideRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, closed }, rx)
    }

    /// Enqueue a request, FIFO.
    pub fn enqueue(&self, request: RideRequest) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::QueueClosed);
        }
        self.tx.try_send(request).map_err(|err| match err {
            TrySendError::Full(_) => DispatchError::QueueFull,
            TrySendError::Closed(_) => DispatchError::QueueClosed,
        })
    }
}
