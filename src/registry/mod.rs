//! Drone registry for tracking fleet availability
//!
//! This module handles:
//! - Drone registration and removal
//! - Atomic, per-drone reserve/release transitions
//! - Offline handling
//! - Read-only snapshots for callers

mod manager;
mod slot;

pub use manager::DroneRegistry;
pub(crate) use slot::ReserveOutcome;
