//! Error types surfaced by the registry and the reservation service

use thiserror::Error;

use crate::{DroneId, DroneStatus, StatusEvent};

/// Errors returned to callers of `reserve` / `release`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("Unknown drone: {0}")]
    UnknownDrone(DroneId),

    #[error("Drone {drone} unavailable: currently {status}")]
    DroneUnavailable { drone: DroneId, status: DroneStatus },

    #[error("Drone {0} has no live reservation")]
    NotReserved(DroneId),
}

impl ReservationError {
    /// The drone the failed operation targeted
    pub fn drone(&self) -> &DroneId {
        match self {
            ReservationError::UnknownDrone(drone)
            | ReservationError::DroneUnavailable { drone, .. }
            | ReservationError::NotReserved(drone) => drone,
        }
    }
}

/// Errors from registry administration (registration, offline handling)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown drone: {0}")]
    UnknownDrone(DroneId),

    #[error("Drone already registered: {0}")]
    DuplicateDrone(DroneId),

    #[error("Drone {0} is held by a live reservation")]
    DroneInUse(DroneId),

    #[error("Drone {drone} cannot {event:?} while {from}")]
    InvalidTransition {
        drone: DroneId,
        from: DroneStatus,
        event: StatusEvent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ReservationError::DroneUnavailable {
            drone: DroneId::from("drone-001"),
            status: DroneStatus::Reserved,
        };
        assert_eq!(err.to_string(), "Drone drone-001 unavailable: currently reserved");
        assert_eq!(err.drone().as_str(), "drone-001");

        let err = RegistryError::InvalidTransition {
            drone: DroneId::from("drone-002"),
            from: DroneStatus::Reserved,
            event: StatusEvent::GoOffline,
        };
        assert_eq!(err.to_string(), "Drone drone-002 cannot GoOffline while reserved");
    }
}
