//! Driver records with per-record locking.

use tokio::sync::Mutex;

use crate::geo::Point;
use crate::profile::{PersonProfile, VehicleProfile};

/// Mutable driver state, guarded by the record's own lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverState {
    pub location: Point,
    pub available: bool,
    pub earnings: u64,
}

/// A fleet driver: immutable identity and attributes plus independently
/// locked live state.
///
/// Invariant: availability and earnings are only ever mutated while
/// holding this record's lock. The directory lock protects the identity
/// map structure, not these fields.
#[derive(Debug)]
pub struct DriverRecord {
    name: String,
    profile: PersonProfile,
    vehicle: VehicleProfile,
    state: Mutex<DriverState>,
}

impl DriverRecord {
    /// New drivers enter the fleet available, with zero earnings.
    pub(crate) fn new(
        name: String,
        profile: PersonProfile,
        vehicle: VehicleProfile,
        location: Point,
    ) -> Self {
        Self {
            name,
            profile,
            vehicle,
            state: Mutex::new(DriverState {
                location,
                available: true,
                earnings: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> &PersonProfile {
        &self.profile
    }

    pub fn vehicle(&self) -> &VehicleProfile {
        &self.vehicle
    }

    /// Snapshot of the live state, taken under the record lock.
    pub async fn state(&self) -> DriverState {
        self.state.lock().await.clone()
    }

    /// Run `f` with the record lock held.
    pub(crate) async fn with_state<T>(&self, f: impl FnOnce(&mut DriverState) -> T) -> T {
        let mut state = self.state.lock().await;
        f(&mut state)
    }
}
