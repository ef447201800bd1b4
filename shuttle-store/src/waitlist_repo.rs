use async_trait::async_trait;
use shuttle_core::repository::WaitlistRepository;
use shuttle_core::{Booking, StoreResult, WaitingListEntry};
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking_repo::insert_booking;
use crate::rows::{map_sqlx, WaitlistRow};

pub struct PgWaitlistRepository {
    pool: PgPool,
}

impl PgWaitlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WaitlistRepository for PgWaitlistRepository {
    async fn insert_entry(&self, entry: &WaitingListEntry) -> StoreResult<()> {
        sqlx::query("INSERT INTO waiting_list (id, user_id, trip_instance_id, created_at) VALUES ($1, $2, $3, $4)")
            .bind(entry.id)
            .bind(entry.user_id)
            .bind(entry.trip_instance_id)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_entry(&self, user_id: Uuid, trip_id: Uuid) -> StoreResult<Option<WaitingListEntry>> {
        let row: Option<WaitlistRow> = sqlx::query_as(
            "SELECT id, user_id, trip_instance_id, created_at FROM waiting_list
             WHERE user_id = $1 AND trip_instance_id = $2",
        )
        .bind(user_id)
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(WaitingListEntry::from))
    }

    async fn oldest_entry(&self, trip_id: Uuid) -> StoreResult<Option<WaitingListEntry>> {
        let row: Option<WaitlistRow> = sqlx::query_as(
            "SELECT id, user_id, trip_instance_id, created_at FROM waiting_list
             WHERE trip_instance_id = $1
             ORDER BY created_at, id
             LIMIT 1",
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(row.map(WaitingListEntry::from))
    }

    async fn remove_entry(&self, entry_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM waiting_list WHERE id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_entries(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM waiting_list")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn promote_entry(&self, entry_id: Uuid, booking: &Booking) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let removed = sqlx::query("DELETE FROM waiting_list WHERE id = $1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?
            .rows_affected();
        if removed == 0 {
            // Dropping the transaction rolls it back
            return Ok(false);
        }

        insert_booking(&mut *tx, booking).await?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(true)
    }
}
