//! The long-lived dispatch context.
//!
//! Directories, queue, worker, and completion signal bundled as one struct
//! that is passed explicitly to collaborators. There are no process-wide
//! singletons; everything a component needs arrives through its
//! constructor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::config::DispatchConfig;
use crate::dispatch::{DispatchQueue, DispatchWorker, RideRequest, WorkerHandle, WorkerState};
use crate::error::DispatchError;
use crate::event::{EventSink, EventStream};
use crate::fleet::{DriverRecord, FleetDirectory};
use crate::geo::Point;
use crate::matching::RideMatcher;
use crate::profile::{PersonProfile, VehicleProfile};
use crate::riders::{Rider, RiderDirectory};
use crate::signal::CompletionSignal;

/// The dispatch core, fully wired.
pub struct DispatchApp {
    riders: Arc<RiderDirectory>,
    fleet: Arc<FleetDirectory>,
    matcher: RideMatcher,
    completion: Arc<CompletionSignal>,
    shutdown: Arc<AtomicBool>,
    events: EventSink,
    worker_rx: Option<mpsc::Receiver<RideRequest>>,
    worker: Option<WorkerHandle>,
    config: DispatchConfig,
}

impl DispatchApp {
    /// Build the full dispatch context plus the stream of structured
    /// events its operations emit.
    pub fn new(config: DispatchConfig) -> (Self, EventStream) {
        let (events, stream) = EventSink::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let riders = Arc::new(RiderDirectory::new(events.clone()));
        let fleet = Arc::new(FleetDirectory::new(events.clone()));
        let (queue, worker_rx) = DispatchQueue::new(config.queue_capacity, Arc::clone(&shutdown));
        let completion = Arc::new(CompletionSignal::new());
        let matcher = RideMatcher::new(
            Arc::clone(&riders),
            Arc::clone(&fleet),
            queue,
            events.clone(),
            config.match_radius,
        );

        let app = Self {
            riders,
            fleet,
            matcher,
            completion,
            shutdown,
            events,
            worker_rx: Some(worker_rx),
            worker: None,
            config,
        };
        (app, stream)
    }

    /// Spawn the background dispatch worker. Requests enqueued before the
    /// worker starts are processed once it does, in FIFO order. Calling
    /// this twice is a no-op.
    pub fn start(&mut self) {
        let Some(rx) = self.worker_rx.take() else {
            return;
        };
        let worker = DispatchWorker::new(
            Arc::clone(&self.fleet),
            rx,
            Arc::clone(&self.shutdown),
            self.events.clone(),
            Arc::clone(&self.completion),
            self.config.idle_tick,
            self.config.release_policy,
        );
        self.worker = Some(worker.spawn());
    }

    /// Request a cooperative stop and wait for the worker to wind down.
    ///
    /// The queue is closed to producers immediately; a request the worker
    /// has already dequeued still completes, and its effects remain
    /// observable afterwards.
    pub async fn stop(&mut self) {
        info!("stopping dispatch worker");
        self.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            worker.join().await;
        }
    }

    /// Lifecycle state of the worker, while one is running.
    pub async fn worker_state(&self) -> Option<WorkerState> {
        match &self.worker {
            Some(worker) => Some(worker.state().await),
            None => None,
        }
    }

    /// Completion signal pulsed once per processed request.
    pub fn completion(&self) -> Arc<CompletionSignal> {
        Arc::clone(&self.completion)
    }

    // Rider directory operations.

    pub async fn add_rider(&self, name: impl Into<String>, profile: PersonProfile, location: Point) {
        self.riders.add_rider(name, profile, location).await;
    }

    pub async fn update_rider_location(
        &self,
        name: &str,
        location: Point,
    ) -> Result<(), DispatchError> {
        self.riders.update_location(name, location).await
    }

    pub async fn rider(&self, name: &str) -> Result<Rider, DispatchError> {
        self.riders.get(name).await
    }

    // Fleet directory operations.

    pub async fn add_driver(
        &self,
        name: impl Into<String>,
        profile: PersonProfile,
        vehicle: VehicleProfile,
        location: Point,
    ) {
        self.fleet.add_driver(name, profile, vehicle, location).await;
    }

    pub async fn update_driver_location(
        &self,
        name: &str,
        location: Point,
    ) -> Result<(), DispatchError> {
        self.fleet.update_location(name, location).await
    }

    pub async fn set_driver_availability(
        &self,
        name: &str,
        available: bool,
    ) -> Result<(), DispatchError> {
        self.fleet.set_availability(name, available).await
    }

    pub async fn driver(&self, name: &str) -> Option<Arc<DriverRecord>> {
        self.fleet.get(name).await
    }

    pub async fn earnings_report(&self) -> Vec<(String, u64)> {
        self.fleet.earnings_report().await
    }

    // Matching operations.

    pub async fn find_ride(
        &self,
        rider: &str,
        source: Point,
        destination: Point,
    ) -> Result<Vec<Arc<DriverRecord>>, DispatchError> {
        self.matcher.find_ride(rider, source, destination).await
    }

    pub async fn request_ride(
        &self,
        rider: &str,
        source: Point,
        destination: Point,
    ) -> Result<Option<RideRequest>, DispatchError> {
        self.matcher.request_ride(rider, source, destination).await
    }
}
