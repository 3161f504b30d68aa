//! Drone catalogs
//!
//! Durable drone catalogs live outside the dispatch core. This module holds
//! the seam the registry is seeded through and an in-memory implementation.

mod memory;
mod traits;

pub use memory::StaticCatalog;
pub use traits::DroneCatalog;
