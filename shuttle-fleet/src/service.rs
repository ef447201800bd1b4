use crate::lock::CycleLock;
use crate::synchronizer::{synchronize_day, SyncStrategy};
use crate::FleetResult;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shuttle_catalog::{validate_catalog, CatalogSource};
use shuttle_core::{Clock, TripRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const SYNC_LOCK_NAME: &str = "fleet-sync";

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub strategy: SyncStrategy,
    pub service_date: NaiveDate,
    pub upserted: usize,
    pub deleted: usize,
    /// Another cycle held the lock; nothing was read or written.
    pub skipped: bool,
    pub synced_at: DateTime<Utc>,
}

/// Runs synchronization cycles: load the timetable, plan against stored
/// instances, apply the plan as one unit.
pub struct FleetSynchronizer {
    catalog: Arc<dyn CatalogSource>,
    trips: Arc<dyn TripRepository>,
    clock: Arc<dyn Clock>,
    lock: Arc<dyn CycleLock>,
    strategy: SyncStrategy,
    default_seat_count: i32,
    lock_ttl: Duration,
}

impl FleetSynchronizer {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        trips: Arc<dyn TripRepository>,
        clock: Arc<dyn Clock>,
        lock: Arc<dyn CycleLock>,
        strategy: SyncStrategy,
        default_seat_count: i32,
    ) -> Self {
        Self {
            catalog,
            trips,
            clock,
            lock,
            strategy,
            default_seat_count,
            lock_ttl: Duration::from_secs(300),
        }
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    pub fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    pub async fn run_cycle(&self) -> FleetResult<SyncReport> {
        let service_date = self.clock.today();

        let Some(token) = self.lock.try_acquire(SYNC_LOCK_NAME, self.lock_ttl).await? else {
            info!(%service_date, "Fleet sync already running elsewhere; skipping cycle");
            return Ok(self.report(service_date, 0, 0, true));
        };

        let result = self.sync(service_date).await;

        if let Err(e) = self.lock.release(SYNC_LOCK_NAME, &token).await {
            warn!("Failed to release fleet sync lock: {}", e);
        }
        result
    }

    /// Scheduled entry point: a failed cycle is logged and leaves the stored
    /// instances exactly as they were.
    pub async fn run_logged(&self) -> Option<SyncReport> {
        match self.run_cycle().await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(strategy = %self.strategy, "Fleet sync failed: {}", e);
                None
            }
        }
    }

    /// Startup sync, only when no scheduled trip exists yet.
    pub async fn bootstrap(&self) -> FleetResult<Option<SyncReport>> {
        let trips = self.trips.list_trips().await?;
        if trips.iter().any(|t| !t.is_placeholder()) {
            info!(count = trips.len(), "Trips already materialized; skipping bootstrap sync");
            return Ok(None);
        }
        info!("No scheduled trips found; running bootstrap sync");
        self.run_cycle().await.map(Some)
    }

    async fn sync(&self, service_date: NaiveDate) -> FleetResult<SyncReport> {
        let templates = self.catalog.load().await?;
        validate_catalog(&templates)?;

        let existing = self.trips.list_trips().await?;
        let plan = synchronize_day(
            self.strategy,
            &templates,
            &existing,
            service_date,
            self.default_seat_count,
        );

        if !plan.is_empty() {
            self.trips.apply_sync_plan(&plan).await?;
        }

        info!(
            strategy = %self.strategy,
            %service_date,
            templates = templates.len(),
            upserted = plan.upserts.len(),
            deleted = plan.deletions.len(),
            "Fleet sync complete"
        );
        Ok(self.report(service_date, plan.upserts.len(), plan.deletions.len(), false))
    }

    fn report(&self, service_date: NaiveDate, upserted: usize, deleted: usize, skipped: bool) -> SyncReport {
        SyncReport {
            strategy: self.strategy,
            service_date,
            upserted,
            deleted,
            skipped,
            synced_at: self.clock.now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LocalCycleLock, LockToken};
    use chrono::NaiveDate;
    use shuttle_catalog::{StaticCatalog, TripTemplate};
    use shuttle_core::clock::{operating_offset, FixedClock};
    use shuttle_core::{DayTag, InMemoryStore, TripInstance};

    fn template(bus: &str, departure: &str, arrival: &str) -> TripTemplate {
        TripTemplate {
            bus_number: bus.to_string(),
            origin: "LNMIIT".to_string(),
            destination: "Ajmeri Gate".to_string(),
            departure_time: departure.to_string(),
            arrival_time: arrival.to_string(),
            driver: "Ramesh".to_string(),
            operating_days: DayTag::ALL.into_iter().collect(),
            seat_count: None,
        }
    }

    fn setup(templates: Vec<TripTemplate>) -> (Arc<StaticCatalog>, Arc<InMemoryStore>, FleetSynchronizer) {
        let catalog = Arc::new(StaticCatalog::new(templates));
        let store = Arc::new(InMemoryStore::new());
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let clock = Arc::new(FixedClock::at(date, 0, 0, operating_offset(330).unwrap()).unwrap());
        let sync = FleetSynchronizer::new(
            catalog.clone(),
            store.clone(),
            clock,
            Arc::new(LocalCycleLock::new()),
            SyncStrategy::UpsertAndPrune,
            40,
        );
        (catalog, store, sync)
    }

    #[tokio::test]
    async fn test_cycle_materializes_and_is_idempotent() {
        let (_, store, sync) = setup(vec![template("B1", "08:00 AM", "09:00 AM")]);

        let first = sync.run_cycle().await.unwrap();
        assert_eq!(first.upserted, 1);
        let ids: Vec<_> = store.list_trips().await.unwrap().iter().map(|t| t.id).collect();

        let second = sync.run_cycle().await.unwrap();
        assert_eq!((second.upserted, second.deleted), (0, 0));
        let again: Vec<_> = store.list_trips().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, again);
    }

    #[tokio::test]
    async fn test_invalid_catalog_leaves_store_untouched() {
        let (catalog, store, sync) = setup(vec![template("B1", "08:00 AM", "09:00 AM")]);
        sync.run_cycle().await.unwrap();

        // Same bus running two overlapping trips
        catalog.replace(vec![
            template("B1", "08:00 AM", "09:00 AM"),
            template("B1", "08:30 AM", "09:30 AM"),
        ]);
        assert!(sync.run_cycle().await.is_err());
        assert!(sync.run_logged().await.is_none());

        let trips = store.list_trips().await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].key().unwrap().departure_time, "08:00 AM");
    }

    #[tokio::test]
    async fn test_bootstrap_runs_only_on_empty_fleet() {
        let (_, store, sync) = setup(vec![template("B1", "08:00 AM", "09:00 AM")]);
        store
            .insert_trip(&TripInstance::placeholder("B7".to_string(), 40, "Suresh".to_string()))
            .await
            .unwrap();

        // Placeholders alone do not count as a materialized fleet
        assert!(sync.bootstrap().await.unwrap().is_some());
        assert!(sync.bootstrap().await.unwrap().is_none());
        assert_eq!(store.list_trips().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_held_lock_skips_cycle() {
        struct Busy;
        #[async_trait::async_trait]
        impl CycleLock for Busy {
            async fn try_acquire(&self, _: &str, _: Duration) -> FleetResult<Option<LockToken>> {
                Ok(None)
            }
            async fn release(&self, _: &str, _: &LockToken) -> FleetResult<()> {
                Ok(())
            }
        }

        let store = Arc::new(InMemoryStore::new());
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let sync = FleetSynchronizer::new(
            Arc::new(StaticCatalog::new(vec![template("B1", "08:00 AM", "09:00 AM")])),
            store.clone(),
            Arc::new(FixedClock::at(date, 0, 0, operating_offset(330).unwrap()).unwrap()),
            Arc::new(Busy),
            SyncStrategy::UpsertAndPrune,
            40,
        );

        let report = sync.run_cycle().await.unwrap();
        assert!(report.skipped);
        assert!(store.list_trips().await.unwrap().is_empty());
    }
}
