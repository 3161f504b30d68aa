//! Clock sources for reservation timestamps

use skyhaul_shared::{now_micros, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of reservation timestamps
pub trait Clock: Send + Sync {
    /// Current time. Successive readings from one clock never go backwards.
    fn now(&self) -> Timestamp;
}

/// Wall clock (UTC) made strictly increasing.
///
/// Each reading is at least one microsecond after the previous one, so two
/// sequential reservations always carry distinct, ordered timestamps even if
/// the system clock steps backwards.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = now_micros();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return Timestamp::from_micros(next),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Hand-driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            micros: AtomicU64::new(start.as_micros()),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.micros.store(at.as_micros(), Ordering::SeqCst);
    }

    pub fn advance(&self, micros: u64) {
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_strictly_increasing() {
        let clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let clock = SystemClock::new();
        let before = now_micros();
        let reading = clock.now().as_micros();
        assert!(reading >= before);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Timestamp::from_micros(100));
        assert_eq!(clock.now().as_micros(), 100);

        clock.advance(50);
        assert_eq!(clock.now().as_micros(), 150);

        clock.set(Timestamp::from_micros(10));
        assert_eq!(clock.now().as_micros(), 10);
    }
}
