//! Operator demo for the ride-hailing dispatch core: onboarding, a
//! matched ride, settlement, and graceful shutdown.

mod registration;

use std::time::Duration;

use anyhow::Result;
use ridehail_core::{DispatchApp, DispatchConfig, Point};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Advisory wait for the in-flight request; if it elapses, the request is
/// still being processed in the background.
const COMPLETION_WAIT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let (mut app, mut events) = DispatchApp::new(DispatchConfig::default());

    // Presentation collaborator: drain structured events into the log.
    let event_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            info!(?event, "dispatch event");
        }
    });

    onboard_riders(&app).await?;
    onboard_drivers(&app).await?;

    app.start();

    // Probe the matcher before committing to a ride.
    app.find_ride("Khanh L.", Point::new(0, 0), Point::new(20, 1)).await?;
    app.find_ride("Thu Tr.", Point::new(10, 0), Point::new(15, 3)).await?;

    // Park a waiter before submitting so the completion pulse has
    // someone to release.
    let completion = app.completion();
    let waiter =
        tokio::spawn(async move { completion.wait_timeout(COMPLETION_WAIT).await });
    tokio::task::yield_now().await;

    match app
        .request_ride("Thu Tr.", Point::new(10, 0), Point::new(15, 3))
        .await?
    {
        Some(request) => {
            info!(driver = %request.driver, "ride submitted, waiting for completion");
            if !waiter.await? {
                warn!("ride still processing after the advisory timeout");
            }
        }
        None => {
            info!("no ride available");
            waiter.abort();
        }
    }

    // Post-ride bookkeeping driven by the dispatcher-status collaborator.
    app.update_rider_location("Thu Tr.", Point::new(15, 3)).await?;
    app.update_driver_location("Driver1", Point::new(15, 3)).await?;
    app.set_driver_availability("Driver1", false).await?;

    // A rider with nobody in range comes up empty.
    app.find_ride("Blue", Point::new(15, 6), Point::new(20, 4)).await?;

    for (driver, earned) in app.earnings_report().await {
        info!(driver = %driver, earned, "driver earnings");
    }

    app.stop().await;
    event_log.abort();
    info!("dispatch demo finished");
    Ok(())
}

async fn onboard_riders(app: &DispatchApp) -> Result<()> {
    for (details, location) in [
        ("Khanh L., M, 23", Point::new(0, 0)),
        ("Thu Tr., F, 22", Point::new(10, 0)),
        ("Blue, M, 2", Point::new(15, 6)),
    ] {
        let (name, profile) = registration::parse_person(details)?;
        app.add_rider(name.as_str(), profile, Point::default()).await;
        app.update_rider_location(&name, location).await?;
    }
    Ok(())
}

async fn onboard_drivers(app: &DispatchApp) -> Result<()> {
    for (details, vehicle_details, location) in [
        ("Driver1, M, 22", "Swift, KA-01-12345", Point::new(10, 1)),
        ("Driver2, M, 29", "Swift, KA-01-12345", Point::new(11, 10)),
        ("Driver3, M, 24", "Swift, KA-01-12345", Point::new(5, 3)),
    ] {
        let (name, profile) = registration::parse_person(details)?;
        let vehicle = registration::parse_vehicle(vehicle_details)?;
        app.add_driver(name.as_str(), profile, vehicle, location).await;
    }
    Ok(())
}
