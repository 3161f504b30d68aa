//! Skyhaul dispatch core
//!
//! Assigns delivery drones to requests without double-booking: the
//! [`registry::DroneRegistry`] owns drone availability and the
//! [`reservation::ReservationService`] turns a successful transition into an
//! immutable [`skyhaul_shared::DroneReservation`].

pub mod catalog;
pub mod clock;
pub mod config;
pub mod registry;
pub mod reservation;

pub use catalog::{DroneCatalog, StaticCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DispatchConfig;
pub use registry::DroneRegistry;
pub use reservation::{EventReceiver, ReservationEvent, ReservationService, ReservationStatsSnapshot};
