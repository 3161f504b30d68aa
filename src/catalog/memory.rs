//! In-memory catalog built from configuration

use super::traits::DroneCatalog;
use anyhow::{bail, Result};
use async_trait::async_trait;
use skyhaul_shared::DroneId;

/// Fixed list of drones, typically taken from `DispatchConfig::fleet`
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    drones: Vec<DroneId>,
}

impl StaticCatalog {
    pub fn new<I, S>(drones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<DroneId>,
    {
        Self {
            drones: drones.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl DroneCatalog for StaticCatalog {
    async fn load(&self) -> Result<Vec<DroneId>> {
        if let Some(blank) = self.drones.iter().position(|id| id.as_str().trim().is_empty()) {
            bail!("Catalog entry {} has an empty drone id", blank);
        }
        Ok(self.drones.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
