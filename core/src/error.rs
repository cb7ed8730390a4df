//! Error taxonomy for dispatch core operations.

use thiserror::Error;

/// Errors surfaced by the dispatch core.
///
/// Nothing here is fatal to the process: every variant is either absorbed
/// locally with an observable event or returned to the immediate caller.
/// Dropped ride requests are not retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No rider is registered under the given identity.
    #[error("rider not found: {0}")]
    RiderNotFound(String),

    /// No driver is registered under the given identity.
    #[error("driver not found: {0}")]
    DriverNotFound(String),

    /// The driver exists but was not available at claim time.
    #[error("driver not available: {0}")]
    DriverUnavailable(String),

    /// The bounded dispatch queue is at capacity.
    #[error("dispatch queue is full")]
    QueueFull,

    /// The dispatch queue has been closed for shutdown.
    #[error("dispatch queue is closed")]
    QueueClosed,
}
