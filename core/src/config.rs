//! Dispatch core configuration.

use std::time::Duration;

use crate::params;

/// What the worker's release step does with a driver's availability after
/// drop-off.
///
/// The reference design leaves the driver off the market until an external
/// dispatcher-status call re-activates them; `ReactivateAfterDropoff`
/// folds that call into the release step instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleasePolicy {
    /// The driver stays unavailable after drop-off (reference behavior).
    #[default]
    HoldUnavailable,
    /// The driver returns to the available pool as part of release.
    ReactivateAfterDropoff,
}

/// Tunable parameters for a [`DispatchApp`](crate::app::DispatchApp).
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Capacity of the bounded ride-request queue.
    pub queue_capacity: usize,
    /// Matching radius in distance units (inclusive boundary).
    pub match_radius: f64,
    /// How long the worker waits for work before re-checking the stop flag.
    pub idle_tick: Duration,
    /// Availability handling in the worker's release step.
    pub release_policy: ReleasePolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: params::DEFAULT_QUEUE_CAPACITY,
            match_radius: params::MATCH_RADIUS,
            idle_tick: Duration::from_millis(params::WORKER_IDLE_TICK_MS),
            release_policy: ReleasePolicy::default(),
        }
    }
}
