//! Reservation events for observers of the dispatch core

use skyhaul_shared::{DroneId, DroneReservation, ReservationError, ReservationId};
use tokio::sync::mpsc;

/// One event per reserve/release outcome.
///
/// Events from a single caller arrive in the order its calls returned.
/// Across callers they are published after the drone's lock is released, so
/// the stream can show `Reserved(D1, rsv-2)` ahead of `Released(D1, rsv-1)`;
/// order reservations of a drone by their `reserved_at`, not by arrival.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationEvent {
    /// A drone was reserved
    Reserved(DroneReservation),
    /// A reserve call failed (unknown or unavailable drone)
    Rejected {
        drone: DroneId,
        reason: ReservationError,
    },
    /// A drone went back to Available.
    /// `reservation` is `None` when released by drone id.
    Released {
        drone: DroneId,
        reservation: Option<ReservationId>,
    },
    /// A release call failed
    ReleaseRejected {
        drone: DroneId,
        reason: ReservationError,
    },
}

impl ReservationEvent {
    pub fn drone(&self) -> &DroneId {
        match self {
            ReservationEvent::Reserved(reservation) => reservation.drone(),
            ReservationEvent::Rejected { drone, .. }
            | ReservationEvent::Released { drone, .. }
            | ReservationEvent::ReleaseRejected { drone, .. } => drone,
        }
    }
}

/// Receiving end of the service's bounded event stream
pub type EventReceiver = mpsc::Receiver<ReservationEvent>;
