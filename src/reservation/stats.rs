//! Outcome counters for the reservation service

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct ReservationStats {
    reserved: AtomicU64,
    rejected: AtomicU64,
    unknown: AtomicU64,
    released: AtomicU64,
    release_rejected: AtomicU64,
    events_dropped: AtomicU64,
}

/// Point-in-time copy of the service counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservationStatsSnapshot {
    /// Successful reservations
    pub reserved: u64,
    /// Reserve calls refused because the drone was not available
    pub rejected: u64,
    /// Calls naming a drone the registry does not know
    pub unknown: u64,
    /// Successful releases
    pub released: u64,
    /// Release calls refused with `NotReserved`
    pub release_rejected: u64,
    /// Events discarded because the observer's buffer was full
    pub events_dropped: u64,
}

impl ReservationStats {
    pub fn record_reserved(&self) {
        self.reserved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown(&self) {
        self.unknown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release_rejected(&self) {
        self.release_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReservationStatsSnapshot {
        ReservationStatsSnapshot {
            reserved: self.reserved.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            release_rejected: self.release_rejected.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }
}
