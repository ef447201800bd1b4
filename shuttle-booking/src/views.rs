use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use shuttle_core::{Booking, DayTag, TripInstance};
use shuttle_shared::Masked;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use crate::context::BookingContext;
use crate::error::{BookingError, BookingResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatState {
    pub seat_number: i32,
    pub booked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMap {
    pub trip_id: Uuid,
    pub bus_number: String,
    pub route: String,
    pub travel_date: NaiveDate,
    pub total_seats: i32,
    pub booked_count: usize,
    pub available_count: usize,
    pub seats: Vec<SeatState>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripAvailability {
    pub trip_id: Uuid,
    pub bus_number: String,
    pub route: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub driver: String,
    pub total_seats: i32,
    pub booked_seats: usize,
    pub available_seats: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldListEntry {
    pub user_id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    /// Every absence on record, including those forgiven by an amnesty.
    pub total_absences: i64,
    pub absences_since_amnesty: i64,
    pub amnesty_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub buses: usize,
    pub active_bookings: i64,
    pub waiting_entries: i64,
    pub capacity: i64,
    pub occupancy_percent: u32,
}

/// Read-only projections for riders, conductors and admins.
pub struct BookingViews {
    ctx: BookingContext,
}

impl BookingViews {
    pub fn new(ctx: BookingContext) -> Self {
        Self { ctx }
    }

    pub async fn seat_map(&self, trip_id: Uuid, travel_date: NaiveDate) -> BookingResult<SeatMap> {
        let trip = self
            .ctx
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or(BookingError::TripNotFound(trip_id))?;
        let booked: HashSet<i32> = self
            .ctx
            .bookings
            .active_bookings_for_trip(trip.id, travel_date)
            .await?
            .iter()
            .map(|b| b.seat_number)
            .collect();

        let seats: Vec<SeatState> = (1..=trip.total_seats)
            .map(|seat_number| SeatState {
                seat_number,
                booked: booked.contains(&seat_number),
            })
            .collect();
        let booked_count = seats.iter().filter(|s| s.booked).count();

        Ok(SeatMap {
            trip_id: trip.id,
            route: trip.route().to_string(),
            bus_number: trip.bus_number,
            travel_date,
            total_seats: trip.total_seats,
            booked_count,
            available_count: seats.len() - booked_count,
            seats,
        })
    }

    /// Today's trips that have not departed yet, earliest first.
    pub async fn bookable_trips(&self) -> BookingResult<Vec<TripAvailability>> {
        let today = self.ctx.clock.today();
        let now = self.ctx.clock.minutes_now();

        let mut trips: Vec<TripInstance> = self
            .trips_operating_on(today)
            .await?
            .into_iter()
            .filter(|t| t.departure_minutes() > now)
            .collect();
        trips.sort_by(|a, b| {
            a.departure_minutes()
                .cmp(&b.departure_minutes())
                .then_with(|| a.bus_number.cmp(&b.bus_number))
        });

        let counts = try_join_all(
            trips
                .iter()
                .map(|t| self.ctx.bookings.active_bookings_for_trip(t.id, today)),
        )
        .await?;

        Ok(trips
            .into_iter()
            .zip(counts)
            .filter_map(|(trip, bookings)| {
                let schedule = trip.schedule?;
                let total = usize::try_from(trip.total_seats).unwrap_or(0);
                Some(TripAvailability {
                    trip_id: trip.id,
                    bus_number: trip.bus_number,
                    route: schedule.route,
                    departure_time: schedule.departure_time,
                    arrival_time: schedule.arrival_time,
                    driver: trip.driver,
                    total_seats: trip.total_seats,
                    booked_seats: bookings.len(),
                    available_seats: total.saturating_sub(bookings.len()),
                })
            })
            .collect())
    }

    pub async fn my_bookings(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        Ok(self.ctx.bookings.list_user_bookings(user_id).await?)
    }

    pub async fn hold_list(&self) -> BookingResult<Vec<HoldListEntry>> {
        let users = self.ctx.users.list_on_hold().await?;
        let mut entries = Vec::with_capacity(users.len());
        for user in users {
            let total_absences = self.ctx.bookings.count_absences(user.id, None).await?;
            let absences_since_amnesty = self.ctx.bookings.count_absences(user.id, user.amnesty_date).await?;
            entries.push(HoldListEntry {
                user_id: user.id,
                name: user.name,
                email: user.email,
                total_absences,
                absences_since_amnesty,
                amnesty_date: user.amnesty_date,
            });
        }
        Ok(entries)
    }

    pub async fn daily_stats(&self, date: NaiveDate) -> BookingResult<DailyStats> {
        let trips = self.trips_operating_on(date).await?;
        let buses: BTreeSet<&str> = trips.iter().map(|t| t.bus_number.as_str()).collect();
        let capacity: i64 = trips.iter().map(|t| i64::from(t.total_seats)).sum();

        let active_bookings = self.ctx.bookings.count_active_bookings(date).await?;
        let waiting_entries = self.ctx.waitlist.count_entries().await?;
        let occupancy_percent = if capacity > 0 {
            ((active_bookings as f64 / capacity as f64) * 100.0).round() as u32
        } else {
            0
        };

        Ok(DailyStats {
            date,
            buses: buses.len(),
            active_bookings,
            waiting_entries,
            capacity,
            occupancy_percent,
        })
    }

    async fn trips_operating_on(&self, date: NaiveDate) -> BookingResult<Vec<TripInstance>> {
        let day = DayTag::of(date);
        Ok(self
            .ctx
            .trips
            .list_trips()
            .await?
            .into_iter()
            .filter(|t| {
                t.schedule
                    .as_ref()
                    .is_some_and(|s| s.operating_days.contains(&day))
            })
            .collect())
    }
}
