use async_trait::async_trait;
use shuttle_core::repository::TripRepository;
use shuttle_core::{StoreResult, SyncPlan, TripInstance};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::rows::{map_sqlx, TripParams, TripRow, TRIP_COLUMNS};

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Inserts or updates by trip identity. Id and conductor of an existing row are kept.
async fn upsert_scheduled(tx: &mut Transaction<'_, Postgres>, trip: &TripInstance) -> StoreResult<()> {
    let p = TripParams::of(trip);
    sqlx::query(
        "INSERT INTO trip_instances
            (id, bus_number, driver, total_seats, conductor_id, is_placeholder,
             origin, destination, route, departure_time, arrival_time, operating_days)
         VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (bus_number, departure_time) WHERE NOT is_placeholder
         DO UPDATE SET
            driver = EXCLUDED.driver,
            total_seats = EXCLUDED.total_seats,
            origin = EXCLUDED.origin,
            destination = EXCLUDED.destination,
            route = EXCLUDED.route,
            arrival_time = EXCLUDED.arrival_time,
            operating_days = EXCLUDED.operating_days,
            updated_at = NOW()",
    )
    .bind(trip.id)
    .bind(&trip.bus_number)
    .bind(&trip.driver)
    .bind(trip.total_seats)
    .bind(trip.conductor_id)
    .bind(p.origin)
    .bind(p.destination)
    .bind(p.route)
    .bind(p.departure_time)
    .bind(p.arrival_time)
    .bind(&p.operating_days)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn list_trips(&self) -> StoreResult<Vec<TripInstance>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trip_instances ORDER BY is_placeholder, bus_number, departure_time",
            TRIP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(TripInstance::try_from).collect()
    }

    async fn get_trip(&self, id: Uuid) -> StoreResult<Option<TripInstance>> {
        let row: Option<TripRow> = sqlx::query_as(&format!("SELECT {} FROM trip_instances WHERE id = $1", TRIP_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(TripInstance::try_from).transpose()
    }

    async fn insert_trip(&self, trip: &TripInstance) -> StoreResult<()> {
        let p = TripParams::of(trip);
        sqlx::query(
            "INSERT INTO trip_instances
                (id, bus_number, driver, total_seats, conductor_id, is_placeholder,
                 origin, destination, route, departure_time, arrival_time, operating_days)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(trip.id)
        .bind(&trip.bus_number)
        .bind(&trip.driver)
        .bind(trip.total_seats)
        .bind(trip.conductor_id)
        .bind(trip.is_placeholder())
        .bind(p.origin)
        .bind(p.destination)
        .bind(p.route)
        .bind(p.departure_time)
        .bind(p.arrival_time)
        .bind(&p.operating_days)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_conductor(&self, trip_id: Uuid, conductor_id: Option<Uuid>) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE trip_instances SET conductor_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(trip_id)
            .bind(conductor_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn apply_sync_plan(&self, plan: &SyncPlan) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Waiting-list rows go with their trip (ON DELETE CASCADE); bookings stay
        let deleted = sqlx::query("DELETE FROM trip_instances WHERE id = ANY($1) AND NOT is_placeholder")
            .bind(&plan.deletions)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?
            .rows_affected();

        for trip in plan.upserts.iter().filter(|t| !t.is_placeholder()) {
            upsert_scheduled(&mut tx, trip).await?;
        }

        tx.commit().await.map_err(map_sqlx)?;
        debug!(deleted, upserted = plan.upserts.len(), "Sync plan applied");
        Ok(())
    }
}
