use chrono::NaiveDate;
use shuttle_core::error::constraints;
use shuttle_core::Booking;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::BookingContext;
use crate::error::BookingResult;
use crate::notifications;

/// Moves waiting-list entrants into freed seats, oldest entrant first.
pub struct WaitlistPromoter {
    ctx: BookingContext,
}

impl WaitlistPromoter {
    pub fn new(ctx: BookingContext) -> Self {
        Self { ctx }
    }

    /// Fills the lowest free seat of `trip_id` on `travel_date` from the
    /// waiting list. A no-op when the trip is full or nobody is waiting.
    ///
    /// Entrants who are on hold or already hold a seat on the trip are
    /// dropped from the list and the next one is tried.
    pub async fn promote(&self, trip_id: Uuid, travel_date: NaiveDate) -> BookingResult<Option<Booking>> {
        let Some(trip) = self.ctx.trips.get_trip(trip_id).await? else {
            return Ok(None);
        };
        let Some(schedule) = trip.schedule.as_ref() else {
            return Ok(None);
        };

        loop {
            let taken = self.ctx.bookings.active_bookings_for_trip(trip.id, travel_date).await?;
            let occupied: HashSet<i32> = taken.iter().map(|b| b.seat_number).collect();

            let Some(seat_number) = (1..=trip.total_seats).find(|s| !occupied.contains(s)) else {
                debug!(%trip_id, %travel_date, "Trip still full; nothing to promote");
                return Ok(None);
            };
            let Some(entry) = self.ctx.waitlist.oldest_entry(trip.id).await? else {
                debug!(%trip_id, "Waiting list empty");
                return Ok(None);
            };

            let user = match self.ctx.users.get_user(entry.user_id).await? {
                Some(user) if !user.on_hold && !taken.iter().any(|b| b.user_id == user.id) => user,
                _ => {
                    info!(entry_id = %entry.id, user_id = %entry.user_id, "Dropping ineligible waiting-list entry");
                    self.ctx.waitlist.remove_entry(entry.id).await?;
                    continue;
                }
            };

            let booking = Booking::confirmed(
                user.id,
                &trip,
                schedule,
                seat_number,
                travel_date,
                self.ctx.clock.now_utc(),
            );

            match self.ctx.waitlist.promote_entry(entry.id, &booking).await {
                Ok(true) => {}
                // Entry claimed by a concurrent promotion
                Ok(false) => continue,
                // Another seat may still be free; re-read the seat map
                Err(e) if e.is_unique_violation_of(constraints::BOOKING_SEAT) => {
                    debug!(%trip_id, seat_number, "Seat claimed concurrently; retrying");
                    continue;
                }
                Err(e) if e.is_unique_violation_of(constraints::BOOKING_USER_TRIP) => {
                    self.ctx.waitlist.remove_entry(entry.id).await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            info!(
                booking_id = %booking.id,
                user_id = %user.id,
                %trip_id,
                seat_number,
                "Promoted from waiting list"
            );
            notifications::dispatch_detached(
                self.ctx.notifier.clone(),
                self.ctx.rules.notification_timeout(),
                notifications::promoted_from_waitlist(&user, &booking),
            );

            return Ok(Some(booking));
        }
    }
}
