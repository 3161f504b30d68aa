//! Reservation service
//!
//! This module handles:
//! - The atomic reserve-or-reject decision for a drone
//! - Building immutable reservation records
//! - Releasing reservations back to the registry
//! - Publishing outcome events and counters for observers

mod events;
mod service;
mod stats;

pub use events::{EventReceiver, ReservationEvent};
pub use service::{ReservationService, DEFAULT_EVENT_CAPACITY};
pub use stats::ReservationStatsSnapshot;
