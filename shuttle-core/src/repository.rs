use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, WaitingListEntry};
use crate::error::StoreResult;
use crate::fleet::{SyncPlan, TripInstance};
use crate::user::User;

/// Repository trait for trip instance (bus) records
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn list_trips(&self) -> StoreResult<Vec<TripInstance>>;

    async fn get_trip(&self, id: Uuid) -> StoreResult<Option<TripInstance>>;

    /// Fails with `UniqueViolation(TRIP_IDENTITY)` when a non-placeholder trip
    /// with the same bus number and departure time already exists.
    async fn insert_trip(&self, trip: &TripInstance) -> StoreResult<()>;

    async fn set_conductor(&self, trip_id: Uuid, conductor_id: Option<Uuid>) -> StoreResult<bool>;

    /// Applies every upsert and deletion in the plan, or none of them.
    ///
    /// Upserts match existing non-placeholder rows by (bus number, departure time)
    /// and keep the stored id and conductor. Deletions never touch placeholders and
    /// remove the waiting-list entries of the deleted trips.
    async fn apply_sync_plan(&self, plan: &SyncPlan) -> StoreResult<()>;
}

/// Repository trait for bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `UniqueViolation` on `BOOKING_SEAT` or `BOOKING_USER_TRIP`.
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<bool>;

    /// Confirmed, attended and absent bookings on a trip for one travel date.
    async fn active_bookings_for_trip(&self, trip_id: Uuid, travel_date: NaiveDate) -> StoreResult<Vec<Booking>>;

    /// Confirmed, attended and absent bookings of a user for one travel date.
    async fn active_bookings_for_user(&self, user_id: Uuid, travel_date: NaiveDate) -> StoreResult<Vec<Booking>>;

    /// All bookings of a user, newest first.
    async fn list_user_bookings(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// Absent bookings created at or after `since` (all time when `None`).
    async fn count_absences(&self, user_id: Uuid, since: Option<DateTime<Utc>>) -> StoreResult<i64>;

    async fn count_active_bookings(&self, travel_date: NaiveDate) -> StoreResult<i64>;
}

/// Repository trait for waiting-list entries
#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    /// Fails with `UniqueViolation(WAITLIST_USER_TRIP)` on a duplicate entry.
    async fn insert_entry(&self, entry: &WaitingListEntry) -> StoreResult<()>;

    async fn find_entry(&self, user_id: Uuid, trip_id: Uuid) -> StoreResult<Option<WaitingListEntry>>;

    /// Earliest entry by creation time.
    async fn oldest_entry(&self, trip_id: Uuid) -> StoreResult<Option<WaitingListEntry>>;

    async fn remove_entry(&self, entry_id: Uuid) -> StoreResult<bool>;

    async fn count_entries(&self) -> StoreResult<i64>;

    /// Inserts `booking` and removes the entry as one unit.
    ///
    /// Returns `Ok(false)` without writing anything when the entry no longer
    /// exists; a booking uniqueness violation leaves the entry in place.
    async fn promote_entry(&self, entry_id: Uuid, booking: &Booking) -> StoreResult<bool>;
}

/// Repository trait for the user fields the booking core reads and writes
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn place_on_hold(&self, id: Uuid) -> StoreResult<bool>;

    /// Lifts the hold and records the amnesty instant.
    async fn clear_hold(&self, id: Uuid, amnesty_date: DateTime<Utc>) -> StoreResult<bool>;

    async fn list_on_hold(&self) -> StoreResult<Vec<User>>;
}
