//! Ride matching: radius-scoped candidate selection and request
//! submission.

use std::sync::Arc;

use tracing::info;

use crate::dispatch::{DispatchQueue, RideRequest};
use crate::error::DispatchError;
use crate::event::{DispatchEvent, EventSink};
use crate::fleet::{DriverRecord, FleetDirectory};
use crate::geo::Point;
use crate::riders::RiderDirectory;

/// Decides which drivers are eligible for a rider and feeds accepted
/// requests to the dispatch queue.
pub struct RideMatcher {
    riders: Arc<RiderDirectory>,
    fleet: Arc<FleetDirectory>,
    queue: DispatchQueue,
    events: EventSink,
    match_radius: f64,
}

impl RideMatcher {
    pub(crate) fn new(
        riders: Arc<RiderDirectory>,
        fleet: Arc<FleetDirectory>,
        queue: DispatchQueue,
        events: EventSink,
        match_radius: f64,
    ) -> Self {
        Self {
            riders,
            fleet,
            queue,
            events,
            match_radius,
        }
    }

    /// Candidate drivers for a rider, in directory iteration order.
    ///
    /// Eligibility is measured from the rider's recorded location, not the
    /// caller-supplied source: the directory is the authority on where the
    /// rider is. An unknown rider drops the request with no side effects.
    pub async fn find_ride(
        &self,
        rider: &str,
        source: Point,
        destination: Point,
    ) -> Result<Vec<Arc<DriverRecord>>, DispatchError> {
        info!(rider, %source, %destination, "finding ride");
        let rider_record = self.riders.get(rider).await?;
        let candidates = self
            .fleet
            .find_available_within(rider_record.location, self.match_radius)
            .await;
        if candidates.is_empty() {
            info!(rider, "no ride found");
        } else {
            info!(rider, candidates = candidates.len(), "rides available");
        }
        Ok(candidates)
    }

    /// Submit a ride: the first candidate wins and the request goes FIFO
    /// to the worker. `Ok(None)` means no driver was in range.
    pub async fn request_ride(
        &self,
        rider: &str,
        source: Point,
        destination: Point,
    ) -> Result<Option<RideRequest>, DispatchError> {
        let candidates = self.find_ride(rider, source, destination).await?;
        let Some(driver) = candidates.first() else {
            return Ok(None);
        };

        let request = RideRequest {
            rider: rider.to_string(),
            source,
            destination,
            driver: driver.name().to_string(),
        };
        self.queue.enqueue(request.clone())?;

        info!(rider, driver = %request.driver, "ride request enqueued");
        self.events.emit(DispatchEvent::RideMatched {
            rider: request.rider.clone(),
            driver: request.driver.clone(),
        });
        Ok(Some(request))
    }
}
