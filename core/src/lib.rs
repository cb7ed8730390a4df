//! Ride-Hailing Dispatch Core
//!
//! This crate implements the in-process dispatch core of a ride-hailing
//! service: rider and fleet directories, radius-based ride matching, a
//! bounded request queue drained by a single background worker, and fare
//! settlement. There is no wire protocol here; registration parsing,
//! process wiring, and presentation belong to the consuming binary, which
//! hands the core typed records and drains its event stream.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod fare;
pub mod fleet;
pub mod geo;
pub mod matching;
pub mod profile;
pub mod riders;
pub mod signal;

pub use app::DispatchApp;
pub use config::{DispatchConfig, ReleasePolicy};
pub use dispatch::RideRequest;
pub use error::DispatchError;
pub use event::{DispatchEvent, EventSink, EventStream};
pub use geo::Point;
pub use signal::CompletionSignal;

/// Fixed design parameters for the dispatch core.
pub mod params {
    /// Matching radius in distance units. The boundary is inclusive: a
    /// driver at exactly this distance is still eligible.
    pub const MATCH_RADIUS: f64 = 5.0;

    /// Fare rate in monetary units per distance unit.
    pub const FARE_RATE: u64 = 10;

    /// Default capacity of the bounded dispatch queue.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

    /// Worker idle tick in milliseconds. Bounds how long a stop request
    /// can go unobserved while the queue is empty.
    pub const WORKER_IDLE_TICK_MS: u64 = 1000;
}
