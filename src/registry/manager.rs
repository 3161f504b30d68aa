//! Drone registry: the single source of truth for drone availability

use super::slot::{DroneSlot, ReserveOutcome};
use crate::catalog::DroneCatalog;
use crate::clock::Clock;
use anyhow::Context;
use skyhaul_shared::{
    Drone, DroneId, DroneStatus, RegistryError, ReservationError, ReservationId, StatusEvent,
    TransitionResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Tracks every known drone and its current status.
///
/// The membership map is behind an async `RwLock`; each drone has its own
/// mutex for status changes. Reserve/release take the map read lock only, so
/// operations on unrelated drones never serialize on each other.
pub struct DroneRegistry {
    /// Map of drone id -> slot
    drones: RwLock<HashMap<DroneId, Arc<DroneSlot>>>,
    clock: Arc<dyn Clock>,
    /// Source of every reservation id bound to a drone in this registry
    reservation_id: AtomicU64,
}

impl DroneRegistry {
    /// Create an empty registry
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            drones: RwLock::new(HashMap::new()),
            clock,
            reservation_id: AtomicU64::new(0),
        }
    }

    /// Get the next reservation ID
    pub(crate) fn next_reservation_id(&self) -> ReservationId {
        ReservationId::new(self.reservation_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Register a new drone as Available
    pub async fn register(&self, id: impl Into<DroneId>) -> Result<(), RegistryError> {
        let id = id.into();
        let mut drones = self.drones.write().await;
        if drones.contains_key(&id) {
            return Err(RegistryError::DuplicateDrone(id));
        }

        let slot = DroneSlot::new(id.clone(), self.clock.now());
        drones.insert(id.clone(), Arc::new(slot));
        debug!("[REGISTRY] Registered drone {}", id);
        Ok(())
    }

    /// Remove a drone. Reserved drones stay until their reservation ends.
    pub async fn deregister(&self, id: &DroneId) -> Result<Drone, RegistryError> {
        let mut drones = self.drones.write().await;
        let slot = drones
            .get(id)
            .ok_or_else(|| RegistryError::UnknownDrone(id.clone()))?;

        // Holding the write lock excludes every reserve/release in flight
        let drone = slot.snapshot();
        if drone.status == DroneStatus::Reserved {
            return Err(RegistryError::DroneInUse(id.clone()));
        }

        drones.remove(id);
        debug!("[REGISTRY] Deregistered drone {}", id);
        Ok(drone)
    }

    /// Take an Available drone out of rotation
    pub async fn set_offline(&self, id: &DroneId) -> Result<(), RegistryError> {
        self.apply_admin(id, StatusEvent::GoOffline).await
    }

    /// Return an Offline drone to the pool
    pub async fn set_online(&self, id: &DroneId) -> Result<(), RegistryError> {
        self.apply_admin(id, StatusEvent::ComeOnline).await
    }

    async fn apply_admin(&self, id: &DroneId, event: StatusEvent) -> Result<(), RegistryError> {
        let drones = self.drones.read().await;
        let slot = drones
            .get(id)
            .ok_or_else(|| RegistryError::UnknownDrone(id.clone()))?;

        match slot.apply_admin(event) {
            TransitionResult::Success(status) => {
                debug!("[REGISTRY] Drone {} is now {}", id, status);
                Ok(())
            }
            TransitionResult::Invalid { from, event } => Err(RegistryError::InvalidTransition {
                drone: id.clone(),
                from,
                event,
            }),
        }
    }

    /// Atomically move a drone from Available to Reserved.
    ///
    /// Returns whether the transition happened; unknown ids are an error.
    /// The drone is bound to a fresh reservation id; release it with
    /// [`DroneRegistry::release`].
    pub async fn try_reserve(&self, id: &DroneId) -> Result<bool, ReservationError> {
        let reservation = self.next_reservation_id();
        let outcome = self.try_reserve_at(id, reservation, self.clock.as_ref()).await?;
        Ok(matches!(outcome, ReserveOutcome::Reserved(_)))
    }

    /// Like `try_reserve`, binding `reservation` (taken from
    /// `next_reservation_id`) and reading `clock` inside the critical section
    /// right after the transition succeeds.
    pub(crate) async fn try_reserve_at(
        &self,
        id: &DroneId,
        reservation: ReservationId,
        clock: &dyn Clock,
    ) -> Result<ReserveOutcome, ReservationError> {
        let drones = self.drones.read().await;
        let slot = drones
            .get(id)
            .ok_or_else(|| ReservationError::UnknownDrone(id.clone()))?;
        Ok(slot.try_reserve(reservation, clock))
    }

    /// Move a drone from Reserved back to Available, whatever reservation holds it
    pub async fn release(&self, id: &DroneId) -> Result<(), ReservationError> {
        self.release_matching(id, None).await
    }

    /// Release `id` only if `reservation` is the one currently holding it
    pub(crate) async fn release_reservation(
        &self,
        id: &DroneId,
        reservation: ReservationId,
    ) -> Result<(), ReservationError> {
        self.release_matching(id, Some(reservation)).await
    }

    async fn release_matching(
        &self,
        id: &DroneId,
        expected: Option<ReservationId>,
    ) -> Result<(), ReservationError> {
        let drones = self.drones.read().await;
        let slot = drones
            .get(id)
            .ok_or_else(|| ReservationError::UnknownDrone(id.clone()))?;

        if slot.release(expected) {
            Ok(())
        } else {
            Err(ReservationError::NotReserved(id.clone()))
        }
    }

    /// Read-only snapshot of one drone
    pub async fn lookup(&self, id: &DroneId) -> Result<Drone, ReservationError> {
        let drones = self.drones.read().await;
        drones
            .get(id)
            .map(|slot| slot.snapshot())
            .ok_or_else(|| ReservationError::UnknownDrone(id.clone()))
    }

    /// Snapshot of every drone, sorted by id
    pub async fn drones(&self) -> Vec<Drone> {
        let drones = self.drones.read().await;
        let mut all: Vec<Drone> = drones.values().map(|slot| slot.snapshot()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Ids of drones that are Available right now, sorted
    pub async fn available(&self) -> Vec<DroneId> {
        let drones = self.drones.read().await;
        let mut ids: Vec<DroneId> = drones
            .iter()
            .filter(|(_, slot)| slot.status() == DroneStatus::Available)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Exclusive hold on the membership map, parking every reserve/release
    #[cfg(test)]
    pub(crate) async fn hold_exclusive(
        &self,
    ) -> tokio::sync::RwLockWriteGuard<'_, HashMap<DroneId, Arc<DroneSlot>>> {
        self.drones.write().await
    }

    /// Get the number of registered drones
    pub async fn len(&self) -> usize {
        self.drones.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.drones.read().await.is_empty()
    }

    /// Register every drone the catalog yields, skipping ones already known.
    /// Returns how many were added.
    pub async fn seed(&self, catalog: &dyn DroneCatalog) -> anyhow::Result<usize> {
        let ids = catalog
            .load()
            .await
            .with_context(|| format!("Failed to load drones from {} catalog", catalog.name()))?;

        let mut added = 0;
        for id in ids {
            match self.register(id).await {
                Ok(()) => added += 1,
                Err(RegistryError::DuplicateDrone(id)) => {
                    warn!("[REGISTRY] Skipping duplicate catalog entry {}", id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            "[REGISTRY] Seeded {} drones from {} catalog",
            added,
            catalog.name()
        );
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::clock::{ManualClock, SystemClock};
    use futures::FutureExt;
    use skyhaul_shared::Timestamp;

    fn registry() -> DroneRegistry {
        DroneRegistry::new(Arc::new(SystemClock::new()))
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = registry();
        registry.register("drone-001").await.unwrap();

        let drone = registry.lookup(&"drone-001".into()).await.unwrap();
        assert_eq!(drone.status, DroneStatus::Available);
        assert_eq!(drone.reservation, None);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let registry = registry();
        registry.register("drone-001").await.unwrap();
        let err = registry.register("drone-001").await.unwrap_err();
        assert_eq!(err, RegistryError::DuplicateDrone("drone-001".into()));
    }

    #[tokio::test]
    async fn test_unknown_drone_reported() {
        let registry = registry();
        let id = DroneId::from("ghost");

        assert_eq!(
            registry.try_reserve(&id).await,
            Err(ReservationError::UnknownDrone(id.clone()))
        );
        assert_eq!(
            registry.release(&id).await,
            Err(ReservationError::UnknownDrone(id.clone()))
        );
        assert_eq!(
            registry.lookup(&id).await,
            Err(ReservationError::UnknownDrone(id.clone()))
        );
    }

    #[tokio::test]
    async fn test_try_reserve_and_release() {
        let registry = registry();
        let id = DroneId::from("drone-001");
        registry.register(id.clone()).await.unwrap();

        assert_eq!(registry.try_reserve(&id).await, Ok(true));
        assert_eq!(registry.lookup(&id).await.unwrap().status, DroneStatus::Reserved);

        // Rejected without touching the live reservation
        assert_eq!(registry.try_reserve(&id).await, Ok(false));
        assert_eq!(
            registry.lookup(&id).await.unwrap().reservation,
            Some(ReservationId::new(1))
        );

        assert_eq!(registry.release(&id).await, Ok(()));
        assert_eq!(registry.lookup(&id).await.unwrap().status, DroneStatus::Available);
        assert_eq!(
            registry.release(&id).await,
            Err(ReservationError::NotReserved(id.clone()))
        );
    }

    #[tokio::test]
    async fn test_try_reserve_at_uses_given_clock() {
        let registry = registry();
        let id = DroneId::from("drone-001");
        registry.register(id.clone()).await.unwrap();

        let clock = ManualClock::new(Timestamp::from_micros(9_000));
        let outcome = registry
            .try_reserve_at(&id, ReservationId::new(1), &clock)
            .await
            .unwrap();
        assert_eq!(outcome, ReserveOutcome::Reserved(Timestamp::from_micros(9_000)));

        let outcome = registry
            .try_reserve_at(&id, ReservationId::new(2), &clock)
            .await
            .unwrap();
        assert_eq!(outcome, ReserveOutcome::Unavailable(DroneStatus::Reserved));
    }

    #[tokio::test]
    async fn test_release_reservation_requires_match() {
        let registry = registry();
        let id = DroneId::from("drone-001");
        registry.register(id.clone()).await.unwrap();
        registry
            .try_reserve_at(&id, ReservationId::new(5), &SystemClock::new())
            .await
            .unwrap();

        assert_eq!(
            registry.release_reservation(&id, ReservationId::new(4)).await,
            Err(ReservationError::NotReserved(id.clone()))
        );
        assert_eq!(registry.release_reservation(&id, ReservationId::new(5)).await, Ok(()));
    }

    #[tokio::test]
    async fn test_reservation_ids_never_repeat() {
        let registry = registry();
        let id = DroneId::from("drone-001");
        registry.register(id.clone()).await.unwrap();

        registry.try_reserve(&id).await.unwrap();
        let first = registry.lookup(&id).await.unwrap().reservation.unwrap();
        registry.release(&id).await.unwrap();

        registry.try_reserve(&id).await.unwrap();
        let second = registry.lookup(&id).await.unwrap().reservation.unwrap();
        assert!(second > first);
        assert!(registry.next_reservation_id() > second);

        // The earlier booking's id no longer matches the live one
        assert_eq!(
            registry.release_reservation(&id, first).await,
            Err(ReservationError::NotReserved(id.clone()))
        );
        assert_eq!(registry.release_reservation(&id, second).await, Ok(()));
    }

    #[tokio::test]
    async fn test_cancelled_reserve_leaves_drone_available() {
        let registry = registry();
        let id = DroneId::from("drone-001");
        registry.register(id.clone()).await.unwrap();

        // Park the reserve on the map lock, then abandon it
        let guard = registry.hold_exclusive().await;
        assert!(registry.try_reserve(&id).now_or_never().is_none());
        drop(guard);

        let drone = registry.lookup(&id).await.unwrap();
        assert_eq!(drone.status, DroneStatus::Available);
        assert_eq!(drone.reservation, None);
        assert_eq!(registry.try_reserve(&id).await, Ok(true));
    }

    #[tokio::test]
    async fn test_deregister_in_use() {
        let registry = registry();
        let id = DroneId::from("drone-001");
        registry.register(id.clone()).await.unwrap();
        registry.try_reserve(&id).await.unwrap();

        assert_eq!(
            registry.deregister(&id).await,
            Err(RegistryError::DroneInUse(id.clone()))
        );

        registry.release(&id).await.unwrap();
        let removed = registry.deregister(&id).await.unwrap();
        assert_eq!(removed.id, id);
        assert!(registry.is_empty().await);
        assert_eq!(
            registry.deregister(&id).await,
            Err(RegistryError::UnknownDrone(id.clone()))
        );
    }

    #[tokio::test]
    async fn test_offline_drones_not_reservable() {
        let registry = registry();
        let id = DroneId::from("drone-001");
        registry.register(id.clone()).await.unwrap();

        registry.set_offline(&id).await.unwrap();
        assert_eq!(registry.try_reserve(&id).await, Ok(false));
        assert!(registry.available().await.is_empty());

        registry.set_online(&id).await.unwrap();
        assert_eq!(registry.available().await, vec![id.clone()]);
        assert_eq!(registry.try_reserve(&id).await, Ok(true));

        let err = registry.set_offline(&id).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTransition {
                drone: id.clone(),
                from: DroneStatus::Reserved,
                event: StatusEvent::GoOffline,
            }
        );
    }

    #[tokio::test]
    async fn test_drones_sorted_snapshot() {
        let registry = registry();
        for id in ["drone-003", "drone-001", "drone-002"] {
            registry.register(id).await.unwrap();
        }
        registry
            .try_reserve(&"drone-002".into())
            .await
            .unwrap();

        let drones = registry.drones().await;
        let ids: Vec<&str> = drones.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["drone-001", "drone-002", "drone-003"]);
        assert!(!drones[1].is_available());

        let available = registry.available().await;
        assert_eq!(available, vec![DroneId::from("drone-001"), DroneId::from("drone-003")]);
    }

    #[tokio::test]
    async fn test_seed_from_catalog() {
        let registry = registry();
        registry.register("drone-002").await.unwrap();

        let catalog = StaticCatalog::new(["drone-001", "drone-002", "drone-003"]);
        let added = registry.seed(&catalog).await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn test_seed_propagates_catalog_failure() {
        let registry = registry();
        let catalog = StaticCatalog::new([""]);
        assert!(registry.seed(&catalog).await.is_err());
        assert!(registry.is_empty().await);
    }
}
