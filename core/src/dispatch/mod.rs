//! Dispatch queue and the background worker that drains it.

mod queue;
mod worker;

pub use queue::DispatchQueue;
pub use worker::{DispatchWorker, WorkerHandle, WorkerState};

use crate::geo::Point;

/// An accepted-but-unprocessed ride.
///
/// Immutable once built and consumed exactly once by the worker. Rider and
/// driver are referenced by identity, never by live handles, so a record
/// replaced before processing surfaces as a not-found condition at claim
/// time instead of a stale dereference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RideRequest {
    pub rider: String,
    pub source: Point,
    pub destination: Point,
    pub driver: String,
}
