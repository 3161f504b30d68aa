use anyhow::Result;
use futures::future::join_all;
use skyhaul_dispatch::{
    Clock, DispatchConfig, DroneRegistry, EventReceiver, ReservationEvent, ReservationService,
    StaticCatalog, SystemClock,
};
use skyhaul_shared::{DroneId, DroneReservation};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = DispatchConfig::from_env()?;

    info!("Dispatch starting: {} drones", config.fleet.len());
    info!("  Delivery requests: {}", config.requests);
    info!("  Delivery time: {:?}", config.delivery_time);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let registry = Arc::new(DroneRegistry::new(clock.clone()));
    registry
        .seed(&StaticCatalog::new(config.fleet.clone()))
        .await?;

    let (service, mut events) = ReservationService::new(registry.clone(), clock);
    let service = Arc::new(service);

    // Spawn event logger
    let logger = tokio::spawn(async move {
        log_events(&mut events).await;
    });

    let fleet = Arc::new(registry.available().await);
    let config = Arc::new(config);

    let requests = (0..config.requests).map(|request| {
        let service = service.clone();
        let fleet = fleet.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let outcome = run_delivery(request, &service, &fleet, &config).await;
            (request, outcome)
        })
    });

    let mut delivered = 0usize;
    let mut failed = 0usize;
    for joined in join_all(requests).await {
        match joined {
            Ok((_, Ok(Some(_)))) => delivered += 1,
            Ok((request, Ok(None))) => {
                warn!("Request {} gave up: fleet busy", request);
                failed += 1;
            }
            Ok((request, Err(e))) => {
                error!("Request {} failed: {:#}", request, e);
                failed += 1;
            }
            Err(e) => {
                error!("Delivery task panicked: {}", e);
                failed += 1;
            }
        }
    }

    let stats = service.stats();
    info!(
        "Dispatch finished: delivered={} failed={} reserved={} rejected={} released={}",
        delivered, failed, stats.reserved, stats.rejected, stats.released
    );

    // Closing the last service handle ends the event stream
    drop(service);
    if let Err(e) = logger.await {
        error!("Event logger stopped abnormally: {}", e);
    }

    Ok(())
}

/// Run one delivery request: reserve a drone, fly, release.
/// Returns the reservation used, or `None` when the fleet stayed busy.
async fn run_delivery(
    request: usize,
    service: &ReservationService,
    fleet: &[DroneId],
    config: &DispatchConfig,
) -> Result<Option<DroneReservation>> {
    // Start each request at a different drone to spread contention
    let mut candidates = fleet.to_vec();
    if !candidates.is_empty() {
        let offset = request % candidates.len();
        candidates.rotate_left(offset);
    }

    for attempt in 1..=config.max_attempts {
        match service.reserve_first_available(&candidates).await? {
            Some(reservation) => {
                debug!(
                    "Request {} flying with {} (attempt {})",
                    request,
                    reservation.drone(),
                    attempt
                );
                tokio::time::sleep(config.delivery_time).await;
                service.release(&reservation).await?;
                return Ok(Some(reservation));
            }
            None => {
                tokio::time::sleep(config.retry_delay).await;
            }
        }
    }

    Ok(None)
}

/// Turn reservation events into log records
async fn log_events(events: &mut EventReceiver) {
    while let Some(event) = events.recv().await {
        match event {
            ReservationEvent::Reserved(reservation) => {
                info!(
                    "[DISPATCH] Reserved {} as {} at {}",
                    reservation.drone(),
                    reservation.id(),
                    reservation.reserved_at()
                );
            }
            ReservationEvent::Rejected { drone, reason } => {
                debug!("[DISPATCH] Reserve {} rejected: {}", drone, reason);
            }
            ReservationEvent::Released { drone, reservation } => match reservation {
                Some(id) => info!("[DISPATCH] Released {} ({})", drone, id),
                None => info!("[DISPATCH] Released {}", drone),
            },
            ReservationEvent::ReleaseRejected { drone, reason } => {
                warn!("[DISPATCH] Release of {} rejected: {}", drone, reason);
            }
        }
    }

    debug!("[DISPATCH] Event stream closed");
}
