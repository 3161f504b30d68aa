//! Drone Status State Machine
//!
//! Defines valid availability transitions for a single drone.

use crate::DroneStatus;

/// Events that can trigger status transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// Claim the drone for a delivery
    Reserve,
    /// Hand a reserved drone back to the pool
    Release,
    /// Take an idle drone out of rotation
    GoOffline,
    /// Return an offline drone to the pool
    ComeOnline,
}

/// Result of a status transition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and status changed
    Success(DroneStatus),
    /// Transition was invalid from current status; nothing changed
    Invalid { from: DroneStatus, event: StatusEvent },
}

impl TransitionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransitionResult::Success(_))
    }
}

/// Status state machine for one drone
#[derive(Debug, Clone)]
pub struct StatusMachine {
    current: DroneStatus,
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusMachine {
    /// Create a new state machine in Available status
    pub fn new() -> Self {
        Self {
            current: DroneStatus::Available,
        }
    }

    /// Get current status
    pub fn status(&self) -> DroneStatus {
        self.current
    }

    /// Apply an event and return the transition result
    pub fn apply(&mut self, event: StatusEvent) -> TransitionResult {
        match next_status(self.current, event) {
            Some(status) => {
                self.current = status;
                TransitionResult::Success(status)
            }
            None => TransitionResult::Invalid {
                from: self.current,
                event,
            },
        }
    }
}

/// Get the next status for a given event, if the transition is valid
pub fn next_status(from: DroneStatus, event: StatusEvent) -> Option<DroneStatus> {
    use DroneStatus::*;
    use StatusEvent::*;

    match (from, event) {
        (Available, Reserve) => Some(Reserved),
        (Reserved, Release) => Some(Available),
        (Available, GoOffline) => Some(Offline),
        (Offline, ComeOnline) => Some(Available),

        // Reserving a reserved drone never overwrites the live reservation
        _ => None,
    }
}

/// Check if a transition from one status to another is generally valid
pub fn is_valid_transition(from: DroneStatus, to: DroneStatus) -> bool {
    use DroneStatus::*;

    matches!(
        (from, to),
        (Available, Reserved) | (Reserved, Available) | (Available, Offline) | (Offline, Available)
    )
}
