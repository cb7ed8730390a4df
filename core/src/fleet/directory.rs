//! Fleet directory: the authoritative in-memory registry of drivers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::driver::DriverRecord;
use crate::error::DispatchError;
use crate::event::{DispatchEvent, EventSink};
use crate::geo::{self, Point};
use crate::profile::{PersonProfile, VehicleProfile};

/// Owns the identity-to-driver mapping.
///
/// Two-level locking: the directory-wide lock guards the map structure
/// (insert/lookup) and is always taken before a record lock, never held
/// across long-running work. Each record's own lock guards its mutable
/// fields, and scans hold at most one record lock at a time.
pub struct FleetDirectory {
    drivers: RwLock<HashMap<String, Arc<DriverRecord>>>,
    events: EventSink,
}

impl FleetDirectory {
    pub fn new(events: EventSink) -> Self {
        Self {
            drivers: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Register a driver, available with zero earnings. A later add under
    /// the same identity replaces the record under the directory lock, so
    /// matching never observes a half-written entry.
    pub async fn add_driver(
        &self,
        name: impl Into<String>,
        profile: PersonProfile,
        vehicle: VehicleProfile,
        location: Point,
    ) {
        let name = name.into();
        let record = Arc::new(DriverRecord::new(name.clone(), profile, vehicle, location));
        self.drivers.write().await.insert(name.clone(), record);
        info!(driver = %name, "driver added");
        self.events.emit(DispatchEvent::DriverAdded { driver: name });
    }

    /// Handle lookup by identity.
    pub async fn get(&self, name: &str) -> Option<Arc<DriverRecord>> {
        self.drivers.read().await.get(name).cloned()
    }

    /// Move a driver. An unknown identity leaves all state unchanged.
    /// The new location is visible to matching as soon as this returns.
    pub async fn update_location(&self, name: &str, location: Point) -> Result<(), DispatchError> {
        let record = self
            .get(name)
            .await
            .ok_or_else(|| DispatchError::DriverNotFound(name.to_string()))?;
        record.with_state(|state| state.location = location).await;

        info!(driver = %name, %location, "driver location updated");
        self.events.emit(DispatchEvent::DriverLocationUpdated {
            driver: name.to_string(),
            location,
        });
        Ok(())
    }

    /// Flip a driver's availability flag.
    pub async fn set_availability(&self, name: &str, available: bool) -> Result<(), DispatchError> {
        let record = self
            .get(name)
            .await
            .ok_or_else(|| DispatchError::DriverNotFound(name.to_string()))?;
        record.with_state(|state| state.available = available).await;

        info!(driver = %name, available, "driver status changed");
        self.events.emit(DispatchEvent::DriverStatusChanged {
            driver: name.to_string(),
            available,
        });
        Ok(())
    }

    /// Credit a settled fare to a driver's earnings; returns the new total.
    pub async fn credit_earnings(&self, name: &str, amount: u64) -> Result<u64, DispatchError> {
        let record = self
            .get(name)
            .await
            .ok_or_else(|| DispatchError::DriverNotFound(name.to_string()))?;
        let total = record
            .with_state(|state| {
                state.earnings += amount;
                state.earnings
            })
            .await;
        Ok(total)
    }

    /// Available drivers within `radius` of `center`, boundary inclusive.
    ///
    /// Takes a read view of the directory and one record lock at a time.
    /// The result order is map iteration order, not stable across calls.
    /// An empty result means no match, never an error.
    pub async fn find_available_within(&self, center: Point, radius: f64) -> Vec<Arc<DriverRecord>> {
        let drivers = self.drivers.read().await;
        let mut matches = Vec::new();
        for record in drivers.values() {
            let state = record.state().await;
            if state.available && geo::distance(state.location, center) <= radius {
                matches.push(Arc::clone(record));
            }
        }
        matches
    }

    /// Cumulative earnings per driver, in no particular order.
    pub async fn earnings_report(&self) -> Vec<(String, u64)> {
        let drivers = self.drivers.read().await;
        let mut report = Vec::with_capacity(drivers.len());
        for (name, record) in drivers.iter() {
            let state = record.state().await;
            report.push((name.clone(), state.earnings));
        }
        report
    }

    /// Number of registered drivers.
    pub async fn count(&self) -> usize {
        self.drivers.read().await.len()
    }
}
