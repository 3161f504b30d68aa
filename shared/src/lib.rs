//! Skyhaul Shared Domain Types
//!
//! This crate provides the drone identity, status and reservation types
//! shared between the dispatch core and the layers that call into it.

pub mod error;
pub mod state_machine;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use error::{RegistryError, ReservationError};
pub use state_machine::{StatusEvent, StatusMachine, TransitionResult};

/// Get current wall-clock time in microseconds since Unix epoch
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

/// Unique identity of a fleet drone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DroneId(String);

impl DroneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DroneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DroneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Availability of a drone as tracked by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DroneStatus {
    /// Free to be reserved
    Available,
    /// Held by exactly one live reservation
    Reserved,
    /// Taken out of rotation (maintenance, grounded)
    Offline,
}

impl fmt::Display for DroneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneStatus::Available => write!(f, "available"),
            DroneStatus::Reserved => write!(f, "reserved"),
            DroneStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Point in time, microseconds since Unix epoch (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

/// Identifier telling successive reservations of the same drone apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReservationId(u64);

impl ReservationId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rsv-{}", self.0)
    }
}

/// Immutable record binding a drone to the moment it was claimed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroneReservation {
    id: ReservationId,
    drone: DroneId,
    reserved_at: Timestamp,
}

impl DroneReservation {
    /// Build a reservation record.
    ///
    /// Building a record reserves nothing. Records meant for callers come
    /// from the dispatch service's `reserve`; a hand-built record is only
    /// honoured by `release` if its id matches the reservation the registry
    /// holds for the drone.
    #[doc(hidden)]
    pub fn new(id: ReservationId, drone: DroneId, reserved_at: Timestamp) -> Self {
        Self {
            id,
            drone,
            reserved_at,
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn drone(&self) -> &DroneId {
        &self.drone
    }

    pub fn reserved_at(&self) -> Timestamp {
        self.reserved_at
    }
}

/// Registry snapshot of a single drone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drone {
    pub id: DroneId,
    pub status: DroneStatus,
    /// Live reservation holding the drone; `Some` iff `status` is `Reserved`
    pub reservation: Option<ReservationId>,
    pub registered_at: Timestamp,
}

impl Drone {
    pub fn is_available(&self) -> bool {
        self.status == DroneStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drone_id_conversions() {
        let a = DroneId::from("drone-001");
        let b = DroneId::from(String::from("drone-001"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "drone-001");
        assert_eq!(a.to_string(), "drone-001");
    }

    #[test]
    fn test_timestamp_ordering_and_display() {
        let t0 = Timestamp::from_micros(1_700_000_000_000_001);
        let t1 = Timestamp::from_micros(1_700_000_000_000_002);
        assert!(t1 > t0);
        assert_eq!(t0.as_millis(), 1_700_000_000_000);
        assert_eq!(t0.to_string(), "1700000000.000001");
    }

    #[test]
    fn test_reservation_accessors() {
        let reservation = DroneReservation::new(
            ReservationId::new(7),
            DroneId::from("drone-007"),
            Timestamp::from_micros(42),
        );
        assert_eq!(reservation.id(), ReservationId::new(7));
        assert_eq!(reservation.drone().as_str(), "drone-007");
        assert_eq!(reservation.reserved_at().as_micros(), 42);
        assert_eq!(reservation.id().to_string(), "rsv-7");
    }

    #[test]
    fn test_now_micros_nonzero() {
        assert!(now_micros() > 0);
    }
}
