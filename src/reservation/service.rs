//! Reservation service: reserve-or-reject and release

use super::events::{EventReceiver, ReservationEvent};
use super::stats::{ReservationStats, ReservationStatsSnapshot};
use crate::clock::Clock;
use crate::registry::{DroneRegistry, ReserveOutcome};
use skyhaul_shared::{DroneId, DroneReservation, ReservationError, ReservationId};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Events buffered for a slow observer before new ones are dropped
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Assigns drones to delivery requests.
///
/// Safe to share between any number of concurrent callers. Every outcome is
/// published on the event stream returned by [`ReservationService::new`];
/// the decision path itself does no logging. The stream is bounded: when the
/// observer falls behind, further events are dropped and counted in
/// [`ReservationStatsSnapshot::events_dropped`] instead of queueing.
pub struct ReservationService {
    registry: Arc<DroneRegistry>,
    clock: Arc<dyn Clock>,
    stats: ReservationStats,
    event_tx: mpsc::Sender<ReservationEvent>,
}

impl ReservationService {
    /// Create a new reservation service and its event stream
    pub fn new(registry: Arc<DroneRegistry>, clock: Arc<dyn Clock>) -> (Self, EventReceiver) {
        Self::with_event_capacity(registry, clock, DEFAULT_EVENT_CAPACITY)
    }

    /// Like `new`, buffering at most `capacity` unread events (minimum 1)
    pub fn with_event_capacity(
        registry: Arc<DroneRegistry>,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> (Self, EventReceiver) {
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));

        let service = Self {
            registry,
            clock,
            stats: ReservationStats::default(),
            event_tx,
        };

        (service, event_rx)
    }

    /// The registry this service reserves from
    pub fn registry(&self) -> &Arc<DroneRegistry> {
        &self.registry
    }

    /// Reserve `drone` for a delivery.
    ///
    /// Exactly one registry transition on success, none on failure. The
    /// returned timestamp is read after the transition was applied. Dropping
    /// the future before it resolves leaves the drone untouched.
    pub async fn reserve(&self, drone: &DroneId) -> Result<DroneReservation, ReservationError> {
        let id = self.registry.next_reservation_id();

        let result = match self
            .registry
            .try_reserve_at(drone, id, self.clock.as_ref())
            .await
        {
            Ok(ReserveOutcome::Reserved(at)) => Ok(DroneReservation::new(id, drone.clone(), at)),
            Ok(ReserveOutcome::Unavailable(status)) => Err(ReservationError::DroneUnavailable {
                drone: drone.clone(),
                status,
            }),
            Err(e) => Err(e),
        };

        match &result {
            Ok(reservation) => {
                self.stats.record_reserved();
                self.emit(ReservationEvent::Reserved(reservation.clone()));
            }
            Err(reason) => {
                if matches!(reason, ReservationError::UnknownDrone(_)) {
                    self.stats.record_unknown();
                } else {
                    self.stats.record_rejected();
                }
                self.emit(ReservationEvent::Rejected {
                    drone: drone.clone(),
                    reason: reason.clone(),
                });
            }
        }

        result
    }

    /// Try `candidates` in order and return the first successful reservation.
    ///
    /// `Ok(None)` means every candidate was unavailable. An unknown candidate
    /// is reported immediately rather than skipped.
    pub async fn reserve_first_available(
        &self,
        candidates: &[DroneId],
    ) -> Result<Option<DroneReservation>, ReservationError> {
        for drone in candidates {
            match self.reserve(drone).await {
                Ok(reservation) => return Ok(Some(reservation)),
                Err(ReservationError::DroneUnavailable { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Release a reservation. Only the live reservation it names is released;
    /// a second call for the same record yields `NotReserved`.
    pub async fn release(&self, reservation: &DroneReservation) -> Result<(), ReservationError> {
        let drone = reservation.drone();
        let result = self
            .registry
            .release_reservation(drone, reservation.id())
            .await;
        self.record_release(drone, Some(reservation.id()), &result);
        result
    }

    /// Release whatever reservation currently holds `drone`
    pub async fn release_drone(&self, drone: &DroneId) -> Result<(), ReservationError> {
        let result = self.registry.release(drone).await;
        self.record_release(drone, None, &result);
        result
    }

    fn record_release(
        &self,
        drone: &DroneId,
        reservation: Option<ReservationId>,
        result: &Result<(), ReservationError>,
    ) {
        match result {
            Ok(()) => {
                self.stats.record_released();
                self.emit(ReservationEvent::Released {
                    drone: drone.clone(),
                    reservation,
                });
            }
            Err(reason) => {
                if matches!(reason, ReservationError::UnknownDrone(_)) {
                    self.stats.record_unknown();
                } else {
                    self.stats.record_release_rejected();
                }
                self.emit(ReservationEvent::ReleaseRejected {
                    drone: drone.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    // Never waits on the observer; a dropped receiver is not an error
    fn emit(&self, event: ReservationEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => self.stats.record_event_dropped(),
        }
    }

    /// Get a snapshot of the outcome counters
    pub fn stats(&self) -> ReservationStatsSnapshot {
        self.stats.snapshot()
    }
}
