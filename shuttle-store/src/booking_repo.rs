use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shuttle_core::repository::BookingRepository;
use shuttle_core::{Booking, BookingStatus, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::rows::{bookings_from, map_sqlx, BookingRow, BOOKING_COLUMNS};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_booking<'e, E>(executor: E, booking: &Booking) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        "INSERT INTO bookings
            (id, user_id, trip_instance_id, bus_number, route, departure_time, arrival_time,
             seat_number, travel_date, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(booking.id)
    .bind(booking.user_id)
    .bind(booking.trip_instance_id)
    .bind(&booking.bus_number)
    .bind(&booking.route)
    .bind(&booking.departure_time)
    .bind(&booking.arrival_time)
    .bind(booking.seat_number)
    .bind(booking.travel_date)
    .bind(booking.status.as_str())
    .bind(booking.created_at)
    .execute(executor)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        insert_booking(&self.pool, booking).await
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(Booking::try_from).transpose()
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_bookings_for_trip(&self, trip_id: Uuid, travel_date: NaiveDate) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings
             WHERE trip_instance_id = $1 AND travel_date = $2 AND status <> 'cancelled'
             ORDER BY seat_number",
            BOOKING_COLUMNS
        ))
        .bind(trip_id)
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        bookings_from(rows)
    }

    async fn active_bookings_for_user(&self, user_id: Uuid, travel_date: NaiveDate) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings
             WHERE user_id = $1 AND travel_date = $2 AND status <> 'cancelled'",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        bookings_from(rows)
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        bookings_from(rows)
    }

    async fn count_absences(&self, user_id: Uuid, since: Option<DateTime<Utc>>) -> StoreResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE user_id = $1 AND status = 'absent'
               AND ($2::timestamptz IS NULL OR created_at >= $2)",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn count_active_bookings(&self, travel_date: NaiveDate) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE travel_date = $1 AND status <> 'cancelled'")
            .bind(travel_date)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }
}
