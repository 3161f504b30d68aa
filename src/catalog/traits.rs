//! Catalog trait abstraction for pluggable drone sources

use anyhow::Result;
use async_trait::async_trait;
use skyhaul_shared::DroneId;

/// Source of drone identities used to seed the registry at startup
#[async_trait]
pub trait DroneCatalog: Send + Sync {
    /// Load every drone the catalog knows about
    async fn load(&self) -> Result<Vec<DroneId>>;

    /// Human-readable name for this catalog
    fn name(&self) -> &'static str;
}
