//! Per-drone state cell

use crate::clock::Clock;
use skyhaul_shared::{
    Drone, DroneId, DroneStatus, ReservationId, StatusEvent, StatusMachine, Timestamp,
    TransitionResult,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of an atomic reserve attempt on a known drone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Transition applied; timestamp read right after it
    Reserved(Timestamp),
    /// Drone was not available; its status at the time of the attempt
    Unavailable(DroneStatus),
}

#[derive(Debug)]
struct SlotState {
    machine: StatusMachine,
    reservation: Option<ReservationId>,
}

/// A registered drone with its own lock.
///
/// Every check-and-transition happens under `state`, which is held only for
/// the transition itself: no I/O, no await.
#[derive(Debug)]
pub(crate) struct DroneSlot {
    id: DroneId,
    registered_at: Timestamp,
    state: Mutex<SlotState>,
}

impl DroneSlot {
    pub fn new(id: DroneId, registered_at: Timestamp) -> Self {
        Self {
            id,
            registered_at,
            state: Mutex::new(SlotState {
                machine: StatusMachine::new(),
                reservation: None,
            }),
        }
    }

    // No code path panics while holding the lock, so a poisoned guard still
    // holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Drone {
        let state = self.lock();
        Drone {
            id: self.id.clone(),
            status: state.machine.status(),
            reservation: state.reservation,
            registered_at: self.registered_at,
        }
    }

    pub fn status(&self) -> DroneStatus {
        self.lock().machine.status()
    }

    /// Available -> Reserved, binding `reservation` to the drone
    pub fn try_reserve(&self, reservation: ReservationId, clock: &dyn Clock) -> ReserveOutcome {
        let mut state = self.lock();
        match state.machine.apply(StatusEvent::Reserve) {
            TransitionResult::Success(_) => {
                state.reservation = Some(reservation);
                ReserveOutcome::Reserved(clock.now())
            }
            TransitionResult::Invalid { from, .. } => ReserveOutcome::Unavailable(from),
        }
    }

    /// Reserved -> Available.
    ///
    /// With `expected` set, only the matching live reservation is released.
    pub fn release(&self, expected: Option<ReservationId>) -> bool {
        let mut state = self.lock();
        if expected.is_some() && state.reservation != expected {
            return false;
        }
        match state.machine.apply(StatusEvent::Release) {
            TransitionResult::Success(_) => {
                state.reservation = None;
                true
            }
            TransitionResult::Invalid { .. } => false,
        }
    }

    /// Offline handling; reservation events go through `try_reserve`/`release`
    pub fn apply_admin(&self, event: StatusEvent) -> TransitionResult {
        debug_assert!(matches!(event, StatusEvent::GoOffline | StatusEvent::ComeOnline));
        self.lock().machine.apply(event)
    }
}
