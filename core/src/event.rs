//! Structured events emitted by mutating operations.
//!
//! The core never formats or prints these itself; an external collaborator
//! drains the stream.

use tokio::sync::mpsc;

use crate::geo::Point;

/// Events emitted by the dispatch core for external observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// A rider was registered.
    RiderAdded { rider: String },
    /// A rider's recorded location changed.
    RiderLocationUpdated { rider: String, location: Point },
    /// A driver was registered.
    DriverAdded { driver: String },
    /// A driver's recorded location changed.
    DriverLocationUpdated { driver: String, location: Point },
    /// A driver's availability flag flipped.
    DriverStatusChanged { driver: String, available: bool },
    /// A rider was matched to a driver and the request enqueued.
    RideMatched { rider: String, driver: String },
    /// A ride completed and the fare was settled.
    RideBilled { rider: String, driver: String, fare: u64 },
    /// The claim failed and the request was dropped.
    RideNotStarted {
        rider: String,
        driver: String,
        reason: String,
    },
}

/// Receiving half of the event stream.
pub type EventStream = mpsc::UnboundedReceiver<DispatchEvent>;

/// Cheap-to-clone producer handle for dispatch events.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<DispatchEvent>,
}

impl EventSink {
    /// Create a sink and the stream that consumes it.
    pub fn channel() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event. Never blocks; a dropped receiver discards events.
    pub fn emit(&self, event: DispatchEvent) {
        let _ = self.tx.send(event);
    }
}
