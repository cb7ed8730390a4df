//! Background worker that serializes the claim, bill, settle, release
//! sequence for each dequeued ride.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

use super::RideRequest;
use crate::config::ReleasePolicy;
use crate::error::DispatchError;
use crate::event::{DispatchEvent, EventSink};
use crate::fare::fare;
use crate::fleet::FleetDirectory;
use crate::signal::CompletionSignal;

/// Observable worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting on the queue or on the idle tick.
    Idle,
    /// Executing the claim/bill/settle/release sequence for one request.
    Processing,
    /// Terminal: the stop flag was observed.
    Stopped,
}

/// The sole consumer of the dispatch queue.
///
/// Stop is cooperative: the shutdown flag is observed only at the
/// idle-loop check, so a request already dequeued always completes before
/// the worker winds down.
pub struct DispatchWorker {
    fleet: Arc<FleetDirectory>,
    rx: mpsc::Receiver<RideRequest>,
    shutdown: Arc<AtomicBool>,
    state: Arc<RwLock<WorkerState>>,
    events: EventSink,
    completion: Arc<CompletionSignal>,
    idle_tick: Duration,
    release_policy: ReleasePolicy,
}

/// Handle to the spawned worker task.
pub struct WorkerHandle {
    state: Arc<RwLock<WorkerState>>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Wait for the worker task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

impl DispatchWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        fleet: Arc<FleetDirectory>,
        rx: mpsc::Receiver<RideRequest>,
        shutdown: Arc<AtomicBool>,
        events: EventSink,
        completion: Arc<CompletionSignal>,
        idle_tick: Duration,
        release_policy: ReleasePolicy,
    ) -> Self {
        Self {
            fleet,
            rx,
            shutdown,
            state: Arc::new(RwLock::new(WorkerState::Idle)),
            events,
            completion,
            idle_tick,
            release_policy,
        }
    }

    /// Spawn the worker loop onto the runtime.
    pub(crate) fn spawn(self) -> WorkerHandle {
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(self.run());
        WorkerHandle { state, task }
    }

    /// Park on the queue with a bounded wait, waking on new work or to
    /// observe a stop request.
    async fn run(mut self) {
        info!("dispatch worker started");
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            match timeout(self.idle_tick, self.rx.recv()).await {
                Ok(Some(request)) => {
                    *self.state.write().await = WorkerState::Processing;
                    self.process(request).await;
                    *self.state.write().await = WorkerState::Idle;
                }
                // Every producer is gone; nothing can arrive anymore.
                Ok(None) => break,
                // Idle tick: loop around and re-check the stop flag.
                Err(_) => {}
            }
        }
        *self.state.write().await = WorkerState::Stopped;
        info!("dispatch worker stopped");
    }

    /// Claim, bill, settle, release, then signal completion.
    ///
    /// A failed claim drops the request with no retry and short-circuits
    /// billing; the completion signal fires either way.
    async fn process(&self, request: RideRequest) {
        info!(rider = %request.rider, driver = %request.driver, "processing ride request");
        match self.claim(&request).await {
            Ok(()) => self.settle(&request).await,
            Err(err) => {
                warn!(rider = %request.rider, driver = %request.driver, "ride not started: {err}");
                self.events.emit(DispatchEvent::RideNotStarted {
                    rider: request.rider.clone(),
                    driver: request.driver.clone(),
                    reason: err.to_string(),
                });
            }
        }
        self.completion.pulse();
    }

    /// Re-check that the assigned driver exists and is still available.
    async fn claim(&self, request: &RideRequest) -> Result<(), DispatchError> {
        let driver = self
            .fleet
            .get(&request.driver)
            .await
            .ok_or_else(|| DispatchError::DriverNotFound(request.driver.clone()))?;
        if !driver.state().await.available {
            return Err(DispatchError::DriverUnavailable(request.driver.clone()));
        }
        Ok(())
    }

    /// Bill the ride, credit the driver, and move them to the drop-off.
    async fn settle(&self, request: &RideRequest) {
        let amount = fare(request.source, request.destination);

        // The driver was claimed a moment ago; directory entries are only
        // ever replaced, not removed, so these lookups cannot fail in
        // practice. A failure is logged and the remaining steps still run.
        if let Err(err) = self.fleet.credit_earnings(&request.driver, amount).await {
            warn!(driver = %request.driver, "settlement step failed: {err}");
        }
        if let Err(err) = self
            .fleet
            .update_location(&request.driver, request.destination)
            .await
        {
            warn!(driver = %request.driver, "release step failed: {err}");
        }
        let available = matches!(self.release_policy, ReleasePolicy::ReactivateAfterDropoff);
        if let Err(err) = self.fleet.set_availability(&request.driver, available).await {
            warn!(driver = %request.driver, "release step failed: {err}");
        }

        info!(rider = %request.rider, driver = %request.driver, amount, "ride billed");
        self.events.emit(DispatchEvent::RideBilled {
            rider: request.rider.clone(),
            driver: request.driver.clone(),
            fare: amount,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchQueue;
    use crate::event::EventStream;
    use crate::geo::Point;
    use crate::profile::{PersonProfile, VehicleProfile};

    struct Fixture {
        fleet: Arc<FleetDirectory>,
        queue: DispatchQueue,
        shutdown: Arc<AtomicBool>,
        completion: Arc<CompletionSignal>,
        stream: EventStream,
        handle: WorkerHandle,
    }

    async fn fixture(release_policy: ReleasePolicy) -> Fixture {
        let (events, stream) = EventSink::channel();
        let fleet = Arc::new(FleetDirectory::new(events.clone()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (queue, rx) = DispatchQueue::new(4, Arc::clone(&shutdown));
        let completion = Arc::new(CompletionSignal::new());
        let worker = DispatchWorker::new(
            Arc::clone(&fleet),
            rx,
            Arc::clone(&shutdown),
            events,
            Arc::clone(&completion),
            Duration::from_millis(10),
            release_policy,
        );
        let handle = worker.spawn();
        Fixture {
            fleet,
            queue,
            shutdown,
            completion,
            stream,
            handle,
        }
    }

    fn profile() -> PersonProfile {
        PersonProfile {
            gender: "M".into(),
            age: 35,
        }
    }

    fn vehicle() -> VehicleProfile {
        VehicleProfile {
            model: "Swift".into(),
            plate_number: "KA-01-12345".into(),
        }
    }

    fn request() -> RideRequest {
        RideRequest {
            rider: "ana".into(),
            source: Point::new(0, 0),
            destination: Point::new(3, 4),
            driver: "dan".into(),
        }
    }

    /// Drain events until one matches `pred`, bounded by a timeout.
    async fn wait_for_event(
        stream: &mut EventStream,
        pred: impl Fn(&DispatchEvent) -> bool,
    ) -> DispatchEvent {
        loop {
            let event = timeout(Duration::from_secs(2), stream.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event stream closed");
            if pred(&event) {
                return event;
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_processed_ride_is_billed_and_released() {
        let mut fx = fixture(ReleasePolicy::HoldUnavailable).await;
        fx.fleet.add_driver("dan", profile(), vehicle(), Point::new(0, 1)).await;

        fx.queue.enqueue(request()).unwrap();
        let billed = wait_for_event(&mut fx.stream, |e| {
            matches!(e, DispatchEvent::RideBilled { .. })
        })
        .await;
        assert_eq!(
            billed,
            DispatchEvent::RideBilled {
                rider: "ana".into(),
                driver: "dan".into(),
                fare: 50,
            }
        );

        let state = fx.fleet.get("dan").await.unwrap().state().await;
        assert_eq!(state.earnings, 50);
        assert_eq!(state.location, Point::new(3, 4));
        assert!(!state.available);

        fx.shutdown.store(true, Ordering::Release);
        fx.handle.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reactivate_policy_returns_driver_to_service() {
        let mut fx = fixture(ReleasePolicy::ReactivateAfterDropoff).await;
        fx.fleet.add_driver("dan", profile(), vehicle(), Point::new(0, 1)).await;

        fx.queue.enqueue(request()).unwrap();
        wait_for_event(&mut fx.stream, |e| {
            matches!(e, DispatchEvent::RideBilled { .. })
        })
        .await;

        let state = fx.fleet.get("dan").await.unwrap().state().await;
        assert!(state.available);
        assert_eq!(state.location, Point::new(3, 4));

        fx.shutdown.store(true, Ordering::Release);
        fx.handle.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unavailable_driver_fails_the_claim() {
        let mut fx = fixture(ReleasePolicy::HoldUnavailable).await;
        fx.fleet.add_driver("dan", profile(), vehicle(), Point::new(0, 1)).await;
        fx.fleet.set_availability("dan", false).await.unwrap();

        fx.queue.enqueue(request()).unwrap();
        let dropped = wait_for_event(&mut fx.stream, |e| {
            matches!(e, DispatchEvent::RideNotStarted { .. })
        })
        .await;
        assert!(matches!(
            dropped,
            DispatchEvent::RideNotStarted { ref driver, .. } if driver == "dan"
        ));

        // Dropped means dropped: nothing was billed.
        assert_eq!(fx.fleet.get("dan").await.unwrap().state().await.earnings, 0);

        fx.shutdown.store(true, Ordering::Release);
        fx.handle.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_driver_fails_the_claim() {
        let mut fx = fixture(ReleasePolicy::HoldUnavailable).await;

        fx.queue.enqueue(request()).unwrap();
        let dropped = wait_for_event(&mut fx.stream, |e| {
            matches!(e, DispatchEvent::RideNotStarted { .. })
        })
        .await;
        assert!(matches!(dropped, DispatchEvent::RideNotStarted { .. }));

        fx.shutdown.store(true, Ordering::Release);
        fx.handle.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_completion_pulses_even_when_claim_fails() {
        let fx = fixture(ReleasePolicy::HoldUnavailable).await;

        let waiter = {
            let completion = Arc::clone(&fx.completion);
            tokio::spawn(async move { completion.wait_timeout(Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // No such driver: the claim fails, the signal still fires.
        fx.queue.enqueue(request()).unwrap();
        assert!(waiter.await.unwrap());

        fx.shutdown.store(true, Ordering::Release);
        fx.handle.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_flag_is_observed_at_the_idle_check() {
        let fx = fixture(ReleasePolicy::HoldUnavailable).await;

        fx.shutdown.store(true, Ordering::Release);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fx.handle.state().await, WorkerState::Stopped);
        fx.handle.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_requests_queued_after_stop_are_never_dequeued() {
        let fx = fixture(ReleasePolicy::HoldUnavailable).await;
        fx.fleet.add_driver("dan", profile(), vehicle(), Point::new(0, 1)).await;

        fx.shutdown.store(true, Ordering::Release);
        fx.handle.join().await;

        // Producers are rejected once the flag is up.
        assert_eq!(fx.queue.enqueue(request()).unwrap_err(), DispatchError::QueueClosed);
        assert_eq!(fx.fleet.get("dan").await.unwrap().state().await.earnings, 0);
    }
}
