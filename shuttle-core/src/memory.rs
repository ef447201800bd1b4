//! In-process store that enforces the same uniqueness guards as the PostgreSQL
//! schema. Used by the test suites and for running the service without a database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, WaitingListEntry};
use crate::error::{constraints, StoreError, StoreResult};
use crate::fleet::{SyncPlan, TripInstance};
use crate::repository::{BookingRepository, TripRepository, UserRepository, WaitlistRepository};
use crate::user::User;

#[derive(Default, Clone)]
struct State {
    trips: HashMap<Uuid, TripInstance>,
    bookings: Vec<Booking>,
    waitlist: Vec<WaitingListEntry>,
    users: HashMap<Uuid, User>,
}

impl State {
    fn check_booking(&self, booking: &Booking) -> StoreResult<()> {
        if !booking.status.is_active() {
            return Ok(());
        }

        let same_trip_day = self.bookings.iter().filter(|b| {
            b.id != booking.id
                && b.status.is_active()
                && b.trip_instance_id == booking.trip_instance_id
                && b.travel_date == booking.travel_date
        });

        for existing in same_trip_day {
            if existing.seat_number == booking.seat_number {
                return Err(StoreError::unique(constraints::BOOKING_SEAT));
            }
            if existing.user_id == booking.user_id {
                return Err(StoreError::unique(constraints::BOOKING_USER_TRIP));
            }
        }
        Ok(())
    }

    fn check_trip_identity(trips: &HashMap<Uuid, TripInstance>, trip: &TripInstance) -> StoreResult<()> {
        let Some(key) = trip.key() else {
            return Ok(());
        };
        let clash = trips
            .values()
            .any(|t| t.id != trip.id && t.key().as_ref() == Some(&key));
        if clash {
            return Err(StoreError::unique(constraints::TRIP_IDENTITY));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.clone()
    }

    pub async fn entries(&self) -> Vec<WaitingListEntry> {
        self.state.lock().await.waitlist.clone()
    }
}

#[async_trait]
impl TripRepository for InMemoryStore {
    async fn list_trips(&self) -> StoreResult<Vec<TripInstance>> {
        let state = self.state.lock().await;
        let mut trips: Vec<TripInstance> = state.trips.values().cloned().collect();
        trips.sort_by(|a, b| {
            a.bus_number
                .cmp(&b.bus_number)
                .then(a.departure_minutes().cmp(&b.departure_minutes()))
        });
        Ok(trips)
    }

    async fn get_trip(&self, id: Uuid) -> StoreResult<Option<TripInstance>> {
        Ok(self.state.lock().await.trips.get(&id).cloned())
    }

    async fn insert_trip(&self, trip: &TripInstance) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        State::check_trip_identity(&state.trips, trip)?;
        state.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn set_conductor(&self, trip_id: Uuid, conductor_id: Option<Uuid>) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.trips.get_mut(&trip_id) {
            Some(trip) => {
                trip.conductor_id = conductor_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_sync_plan(&self, plan: &SyncPlan) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        // Work on a copy so a failure leaves the stored trips untouched.
        let mut trips = state.trips.clone();

        for id in &plan.deletions {
            if trips.get(id).is_some_and(|t| !t.is_placeholder()) {
                trips.remove(id);
            }
        }

        for incoming in &plan.upserts {
            let matched = incoming.key().and_then(|key| {
                trips
                    .values()
                    .find(|t| t.key().as_ref() == Some(&key))
                    .map(|t| t.id)
            });
            let target = matched.or_else(|| trips.contains_key(&incoming.id).then_some(incoming.id));

            match target {
                Some(id) => {
                    if let Some(stored) = trips.get_mut(&id) {
                        stored.driver = incoming.driver.clone();
                        stored.total_seats = incoming.total_seats;
                        stored.schedule = incoming.schedule.clone();
                    }
                }
                None => {
                    State::check_trip_identity(&trips, incoming)?;
                    trips.insert(incoming.id, incoming.clone());
                }
            }
        }

        state.trips = trips;
        let State { trips, waitlist, .. } = &mut *state;
        waitlist.retain(|e| trips.contains_key(&e.trip_instance_id));
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.check_booking(booking)?;
        state.bookings.push(booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let state = self.state.lock().await;
        Ok(state.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(index) = state.bookings.iter().position(|b| b.id == id) else {
            return Ok(false);
        };

        let mut updated = state.bookings[index].clone();
        updated.status = status;
        state.check_booking(&updated)?;
        state.bookings[index] = updated;
        Ok(true)
    }

    async fn active_bookings_for_trip(&self, trip_id: Uuid, travel_date: NaiveDate) -> StoreResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.trip_instance_id == trip_id && b.travel_date == travel_date && b.status.is_active())
            .cloned()
            .collect())
    }

    async fn active_bookings_for_user(&self, user_id: Uuid, travel_date: NaiveDate) -> StoreResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.travel_date == travel_date && b.status.is_active())
            .cloned()
            .collect())
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn count_absences(&self, user_id: Uuid, since: Option<DateTime<Utc>>) -> StoreResult<i64> {
        let state = self.state.lock().await;
        let count = state
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.status == BookingStatus::Absent)
            .filter(|b| since.map_or(true, |cutoff| b.created_at >= cutoff))
            .count();
        Ok(count as i64)
    }

    async fn count_active_bookings(&self, travel_date: NaiveDate) -> StoreResult<i64> {
        let state = self.state.lock().await;
        let count = state
            .bookings
            .iter()
            .filter(|b| b.travel_date == travel_date && b.status.is_active())
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl WaitlistRepository for InMemoryStore {
    async fn insert_entry(&self, entry: &WaitingListEntry) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .waitlist
            .iter()
            .any(|e| e.user_id == entry.user_id && e.trip_instance_id == entry.trip_instance_id);
        if duplicate {
            return Err(StoreError::unique(constraints::WAITLIST_USER_TRIP));
        }
        state.waitlist.push(entry.clone());
        Ok(())
    }

    async fn find_entry(&self, user_id: Uuid, trip_id: Uuid) -> StoreResult<Option<WaitingListEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .waitlist
            .iter()
            .find(|e| e.user_id == user_id && e.trip_instance_id == trip_id)
            .cloned())
    }

    async fn oldest_entry(&self, trip_id: Uuid) -> StoreResult<Option<WaitingListEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .waitlist
            .iter()
            .filter(|e| e.trip_instance_id == trip_id)
            .min_by_key(|e| e.created_at)
            .cloned())
    }

    async fn remove_entry(&self, entry_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.waitlist.len();
        state.waitlist.retain(|e| e.id != entry_id);
        Ok(state.waitlist.len() < before)
    }

    async fn count_entries(&self) -> StoreResult<i64> {
        Ok(self.state.lock().await.waitlist.len() as i64)
    }

    async fn promote_entry(&self, entry_id: Uuid, booking: &Booking) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(index) = state.waitlist.iter().position(|e| e.id == entry_id) else {
            return Ok(false);
        };
        state.check_booking(booking)?;
        state.bookings.push(booking.clone());
        state.waitlist.remove(index);
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn place_on_hold(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&id) {
            Some(user) => {
                user.on_hold = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_hold(&self, id: Uuid, amnesty_date: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&id) {
            Some(user) => {
                user.on_hold = false;
                user.amnesty_date = Some(amnesty_date);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_on_hold(&self) -> StoreResult<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.values().filter(|u| u.on_hold).cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}
