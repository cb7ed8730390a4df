//! Rider directory: registration and live rider state.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::DispatchError;
use crate::event::{DispatchEvent, EventSink};
use crate::geo::Point;
use crate::profile::PersonProfile;

/// A registered rider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rider {
    pub name: String,
    pub profile: PersonProfile,
    pub location: Point,
}

/// Owns every rider record under a single lock.
///
/// Riders are inserted and updated, never deleted.
pub struct RiderDirectory {
    riders: Mutex<HashMap<String, Rider>>,
    events: EventSink,
}

impl RiderDirectory {
    pub fn new(events: EventSink) -> Self {
        Self {
            riders: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Register a rider. A later add under the same identity overwrites.
    pub async fn add_rider(&self, name: impl Into<String>, profile: PersonProfile, location: Point) {
        let name = name.into();
        let rider = Rider {
            name: name.clone(),
            profile,
            location,
        };
        self.riders.lock().await.insert(name.clone(), rider);
        info!(rider = %name, "rider added");
        self.events.emit(DispatchEvent::RiderAdded { rider: name });
    }

    /// Move a rider. An unknown identity leaves all state unchanged.
    pub async fn update_location(&self, name: &str, location: Point) -> Result<(), DispatchError> {
        let mut riders = self.riders.lock().await;
        let rider = riders
            .get_mut(name)
            .ok_or_else(|| DispatchError::RiderNotFound(name.to_string()))?;
        rider.location = location;
        drop(riders);

        info!(rider = %name, %location, "rider location updated");
        self.events.emit(DispatchEvent::RiderLocationUpdated {
            rider: name.to_string(),
            location,
        });
        Ok(())
    }

    /// Snapshot of a rider's current record.
    pub async fn get(&self, name: &str) -> Result<Rider, DispatchError> {
        self.riders
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::RiderNotFound(name.to_string()))
    }

    /// Number of registered riders.
    pub async fn count(&self) -> usize {
        self.riders.lock().await.len()
    }
}
