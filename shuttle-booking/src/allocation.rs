use chrono::NaiveDate;
use shuttle_core::error::constraints;
use shuttle_core::{Booking, BookingStatus, StoreError, WaitingListEntry};
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::BookingContext;
use crate::error::{BookingError, BookingResult};
use crate::notifications;
use crate::waitlist::WaitlistPromoter;

/// Seat allocation: booking, cancellation and waiting-list admission.
///
/// Every check here is a pre-check for a better error message. The store's
/// unique constraints decide races, and their violations are translated into
/// the same errors the pre-checks produce.
pub struct AllocationEngine {
    ctx: BookingContext,
    promoter: WaitlistPromoter,
}

impl AllocationEngine {
    pub fn new(ctx: BookingContext) -> Self {
        let promoter = WaitlistPromoter::new(ctx.clone());
        Self { ctx, promoter }
    }

    pub async fn create_booking(
        &self,
        user_id: Uuid,
        trip_id: Uuid,
        seat_number: i32,
        travel_date: NaiveDate,
    ) -> BookingResult<Booking> {
        let user = self.ctx.load_user(user_id).await?;
        if user.on_hold {
            return Err(BookingError::OnHold);
        }

        let trip = self
            .ctx
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or(BookingError::TripNotFound(trip_id))?;
        let Some(schedule) = trip.schedule.as_ref() else {
            return Err(BookingError::Validation(format!(
                "Bus {} is not in service",
                trip.bus_number
            )));
        };
        if travel_date < self.ctx.clock.today() {
            return Err(BookingError::Validation("Travel date is in the past".to_string()));
        }

        let window = schedule.window();
        let mine = self.ctx.bookings.active_bookings_for_user(user.id, travel_date).await?;
        let clash = mine.iter().find(|b| {
            b.trip_instance_id != trip.id
                && matches!(b.status, BookingStatus::Confirmed | BookingStatus::Attended)
                && b.window().overlaps(&window)
        });
        if let Some(clash) = clash {
            return Err(BookingError::TimeConflict {
                bus_number: clash.bus_number.clone(),
                departure_time: clash.departure_time.clone(),
                arrival_time: clash.arrival_time.clone(),
            });
        }

        let taken = self.ctx.bookings.active_bookings_for_trip(trip.id, travel_date).await?;
        if taken.iter().any(|b| b.seat_number == seat_number) {
            return Err(BookingError::SeatTaken { seat_number });
        }
        if taken.iter().any(|b| b.user_id == user.id) {
            return Err(BookingError::AlreadyBooked);
        }
        if !(1..=trip.total_seats).contains(&seat_number) {
            return Err(BookingError::Validation(format!(
                "Seat number must be between 1 and {}",
                trip.total_seats
            )));
        }

        let booking = Booking::confirmed(
            user.id,
            &trip,
            schedule,
            seat_number,
            travel_date,
            self.ctx.clock.now_utc(),
        );
        self.ctx
            .bookings
            .insert_booking(&booking)
            .await
            .map_err(|e| booking_conflict(e, seat_number))?;

        info!(
            booking_id = %booking.id,
            user_id = %user.id,
            trip_id = %trip.id,
            seat_number,
            %travel_date,
            "Booking confirmed"
        );
        notifications::dispatch(
            self.ctx.notifier.as_ref(),
            self.ctx.rules.notification_timeout(),
            notifications::booking_confirmed(&user, &booking),
        )
        .await;

        Ok(booking)
    }

    /// Soft-cancels a booking and hands the vacated seat to the waiting list.
    pub async fn cancel_booking(&self, user_id: Uuid, booking_id: Uuid) -> BookingResult<Booking> {
        let mut booking = self
            .ctx
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if booking.user_id != user_id {
            return Err(BookingError::policy("You can only cancel your own bookings"));
        }
        if booking.status.is_processed() {
            return Err(BookingError::policy(format!(
                "Booking already marked {} and cannot be cancelled",
                booking.status
            )));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::policy("Booking is already cancelled"));
        }

        let today = self.ctx.clock.today();
        if booking.travel_date < today {
            return Err(BookingError::policy("Cannot cancel a booking for a past date"));
        }
        if booking.travel_date == today {
            let minutes_left = booking.window().start - self.ctx.clock.minutes_now();
            if minutes_left < self.ctx.rules.cancellation_cutoff_minutes {
                return Err(BookingError::policy(format!(
                    "Cancellations close {} minutes before departure",
                    self.ctx.rules.cancellation_cutoff_minutes
                )));
            }
        }

        if !self
            .ctx
            .bookings
            .update_booking_status(booking.id, BookingStatus::Cancelled)
            .await?
        {
            return Err(BookingError::BookingNotFound(booking_id));
        }
        booking.status = BookingStatus::Cancelled;
        info!(booking_id = %booking.id, user_id = %user_id, trip_id = %booking.trip_instance_id, "Booking cancelled");

        match self.ctx.users.get_user(user_id).await {
            Ok(Some(user)) => {
                notifications::dispatch_detached(
                    self.ctx.notifier.clone(),
                    self.ctx.rules.notification_timeout(),
                    notifications::booking_cancelled(&user, &booking),
                );
            }
            Ok(None) => {}
            Err(e) => warn!(%user_id, "Skipping cancellation notice: {}", e),
        }

        // The cancellation stands even if the hand-off fails.
        if let Err(e) = self.promoter.promote(booking.trip_instance_id, booking.travel_date).await {
            warn!(trip_id = %booking.trip_instance_id, "Waiting list promotion failed: {}", e);
        }

        Ok(booking)
    }

    pub async fn join_waiting_list(
        &self,
        user_id: Uuid,
        trip_id: Uuid,
        travel_date: NaiveDate,
    ) -> BookingResult<WaitingListEntry> {
        let user = self.ctx.load_user(user_id).await?;
        if user.on_hold {
            return Err(BookingError::OnHold);
        }

        let trip = self
            .ctx
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or(BookingError::TripNotFound(trip_id))?;
        if trip.is_placeholder() {
            return Err(BookingError::Validation(format!(
                "Bus {} is not in service",
                trip.bus_number
            )));
        }

        let taken = self.ctx.bookings.active_bookings_for_trip(trip.id, travel_date).await?;
        if (taken.len() as i64) < i64::from(trip.total_seats) {
            return Err(BookingError::SeatsAvailable);
        }
        if self.ctx.waitlist.find_entry(user.id, trip.id).await?.is_some() {
            return Err(BookingError::AlreadyWaiting);
        }
        if taken.iter().any(|b| b.user_id == user.id) {
            return Err(BookingError::AlreadyBooked);
        }

        let entry = WaitingListEntry::new(user.id, trip.id, self.ctx.clock.now_utc());
        match self.ctx.waitlist.insert_entry(&entry).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation_of(constraints::WAITLIST_USER_TRIP) => {
                return Err(BookingError::AlreadyWaiting)
            }
            Err(e) => return Err(e.into()),
        }

        info!(entry_id = %entry.id, user_id = %user.id, trip_id = %trip.id, "Joined waiting list");
        Ok(entry)
    }

    pub fn promoter(&self) -> &WaitlistPromoter {
        &self.promoter
    }
}

fn booking_conflict(e: StoreError, seat_number: i32) -> BookingError {
    if e.is_unique_violation_of(constraints::BOOKING_SEAT) {
        BookingError::SeatTaken { seat_number }
    } else if e.is_unique_violation_of(constraints::BOOKING_USER_TRIP) {
        BookingError::AlreadyBooked
    } else {
        BookingError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use crate::ErrorKind;
    use shuttle_core::{BookingRepository, UserRepository, WaitlistRepository};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_concurrent_bookings_of_one_seat_admit_exactly_one() {
        let fx = Fixture::new().await;
        let trip_id = fx.trip("B1", "09:00 AM", "10:00 AM", 40).await.id;
        let engine = Arc::new(AllocationEngine::new(fx.ctx.clone()));

        let mut handles = Vec::new();
        for i in 0..16 {
            let user = fx.student(&format!("student{}", i)).await;
            let engine = engine.clone();
            let date = fx.date;
            handles.push(tokio::spawn(async move {
                engine.create_booking(user.id, trip_id, 7, date).await
            }));
        }

        let mut won = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(e) => {
                    assert!(matches!(e, BookingError::SeatTaken { seat_number: 7 }));
                    assert_eq!(e.kind(), ErrorKind::Conflict);
                }
            }
        }
        assert_eq!(won, 1);
    }

    #[tokio::test]
    async fn test_overlapping_trips_rejected_touching_allowed() {
        let fx = Fixture::new().await;
        let a = fx.trip("B1", "09:00 AM", "10:00 AM", 40).await;
        let b = fx.trip("B2", "09:30 AM", "10:30 AM", 40).await;
        let c = fx.trip("B3", "10:00 AM", "11:00 AM", 40).await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let user = fx.student("asha").await;

        engine.create_booking(user.id, a.id, 1, fx.date).await.unwrap();
        let err = engine.create_booking(user.id, b.id, 1, fx.date).await.unwrap_err();
        assert!(matches!(err, BookingError::TimeConflict { ref bus_number, .. } if bus_number == "B1"));
        engine.create_booking(user.id, c.id, 1, fx.date).await.unwrap();

        // Another day does not clash
        let next_day = fx.date.succ_opt().unwrap();
        engine.create_booking(user.id, b.id, 1, next_day).await.unwrap();
    }

    #[tokio::test]
    async fn test_precondition_order_and_reasons() {
        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "09:00 AM", "10:00 AM", 2).await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let asha = fx.student("asha").await;
        let ravi = fx.student("ravi").await;

        engine.create_booking(asha.id, trip.id, 1, fx.date).await.unwrap();

        let err = engine.create_booking(ravi.id, trip.id, 1, fx.date).await.unwrap_err();
        assert!(matches!(err, BookingError::SeatTaken { seat_number: 1 }));
        let err = engine.create_booking(asha.id, trip.id, 2, fx.date).await.unwrap_err();
        assert!(matches!(err, BookingError::AlreadyBooked));
        let err = engine.create_booking(ravi.id, trip.id, 3, fx.date).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = engine.create_booking(ravi.id, Uuid::new_v4(), 1, fx.date).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        fx.store.place_on_hold(ravi.id).await.unwrap();
        let err = engine.create_booking(ravi.id, trip.id, 2, fx.date).await.unwrap_err();
        assert!(matches!(err, BookingError::OnHold));
    }

    #[tokio::test]
    async fn test_booking_snapshots_trip_fields_and_notifies() {
        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "09:00 AM", "10:00 AM", 40).await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let user = fx.student("asha").await;

        let booking = engine.create_booking(user.id, trip.id, 12, fx.date).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.route, "LNMIIT → Raja Park");
        assert_eq!(booking.departure_time, "09:00 AM");
        assert_eq!(fx.notifier.subjects(), vec!["Booking Confirmed - LNMIIT Bus Service"]);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_booking() {
        let fx = Fixture::with_failing_notifier().await;
        let trip = fx.trip("B1", "09:00 AM", "10:00 AM", 40).await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let user = fx.student("asha").await;

        engine.create_booking(user.id, trip.id, 1, fx.date).await.unwrap();
        assert_eq!(fx.notifier.sent().len(), 1);
        assert_eq!(fx.store.bookings().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_promotes_oldest_entrant_to_lowest_free_seat() {
        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "09:00 AM", "10:00 AM", 3).await;
        let engine = AllocationEngine::new(fx.ctx.clone());

        let mut riders = Vec::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let user = fx.student(name).await;
            riders.push(engine.create_booking(user.id, trip.id, i as i32 + 1, fx.date).await.unwrap());
        }

        let first = fx.student("first").await;
        let second = fx.student("second").await;
        engine.join_waiting_list(first.id, trip.id, fx.date).await.unwrap();
        fx.clock.advance(chrono::Duration::seconds(1));
        engine.join_waiting_list(second.id, trip.id, fx.date).await.unwrap();

        // Free seat 2; seat 2 is the only hole
        let cancelled = engine.cancel_booking(riders[1].user_id, riders[1].id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let promoted = fx.store.active_bookings_for_user(first.id, fx.date).await.unwrap();
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].seat_number, 2);
        assert!(fx.store.find_entry(first.id, trip.id).await.unwrap().is_none());
        assert!(fx.store.find_entry(second.id, trip.id).await.unwrap().is_some());

        // Soft cancel: the record is still there
        let stored = fx.store.get_booking(riders[1].id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        fx.settle().await;
        assert!(fx
            .notifier
            .subjects()
            .contains(&"You're Off The Waiting List! - LNMIIT Bus Service".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_does_not_wait_for_mail_transport() {
        struct Hanging;
        #[async_trait::async_trait]
        impl shuttle_core::Notifier for Hanging {
            async fn notify(&self, _: &shuttle_core::Notification) -> Result<(), shuttle_core::NotifyError> {
                std::future::pending().await
            }
        }

        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "09:00 AM", "10:00 AM", 1).await;
        let setup = AllocationEngine::new(fx.ctx.clone());
        let rider = fx.student("rider").await;
        let waiter = fx.student("waiter").await;
        let booking = setup.create_booking(rider.id, trip.id, 1, fx.date).await.unwrap();
        setup.join_waiting_list(waiter.id, trip.id, fx.date).await.unwrap();

        let engine = AllocationEngine::new(BookingContext {
            notifier: Arc::new(Hanging),
            ..fx.ctx.clone()
        });
        let started = tokio::time::Instant::now();
        engine.cancel_booking(rider.id, booking.id).await.unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        let promoted = fx.store.active_bookings_for_user(waiter.id, fx.date).await.unwrap();
        assert_eq!(promoted[0].seat_number, 1);
    }

    #[tokio::test]
    async fn test_cancellation_cutoff() {
        // Fixture clock reads 08:00 on the service day
        let fx = Fixture::new().await;
        let engine = AllocationEngine::new(fx.ctx.clone());

        for (departure, allowed) in [("08:29 AM", false), ("08:30 AM", true), ("08:31 AM", true)] {
            let trip = fx.trip(&format!("B-{}", departure), departure, "09:15 AM", 40).await;
            let user = fx.student(departure).await;
            let booking = engine.create_booking(user.id, trip.id, 1, fx.date).await.unwrap();

            let result = engine.cancel_booking(user.id, booking.id).await;
            assert_eq!(result.is_ok(), allowed, "departure {}", departure);
            if let Err(e) = result {
                assert_eq!(e.kind(), ErrorKind::Policy);
            }
        }

        // Only the travel day itself is subject to the cutoff
        let trip = fx.trip("B9", "08:10 AM", "08:40 AM", 40).await;
        let user = fx.student("tomorrow").await;
        let tomorrow = fx.date.succ_opt().unwrap();
        let booking = engine.create_booking(user.id, trip.id, 1, tomorrow).await.unwrap();
        engine.cancel_booking(user.id, booking.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_guards() {
        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "06:00 PM", "07:00 PM", 40).await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let asha = fx.student("asha").await;
        let ravi = fx.student("ravi").await;
        let booking = engine.create_booking(asha.id, trip.id, 1, fx.date).await.unwrap();

        let err = engine.cancel_booking(ravi.id, booking.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Policy);

        fx.store.update_booking_status(booking.id, BookingStatus::Attended).await.unwrap();
        let err = engine.cancel_booking(asha.id, booking.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Policy);

        let err = engine.cancel_booking(asha.id, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancelled_seat_can_be_rebooked() {
        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "06:00 PM", "07:00 PM", 40).await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let asha = fx.student("asha").await;
        let ravi = fx.student("ravi").await;

        let booking = engine.create_booking(asha.id, trip.id, 5, fx.date).await.unwrap();
        engine.cancel_booking(asha.id, booking.id).await.unwrap();
        engine.create_booking(ravi.id, trip.id, 5, fx.date).await.unwrap();
        engine.create_booking(asha.id, trip.id, 6, fx.date).await.unwrap();
    }

    #[tokio::test]
    async fn test_waiting_list_only_when_full() {
        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "06:00 PM", "07:00 PM", 1).await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let asha = fx.student("asha").await;
        let ravi = fx.student("ravi").await;

        let err = engine.join_waiting_list(ravi.id, trip.id, fx.date).await.unwrap_err();
        assert!(matches!(err, BookingError::SeatsAvailable));

        engine.create_booking(asha.id, trip.id, 1, fx.date).await.unwrap();
        engine.join_waiting_list(ravi.id, trip.id, fx.date).await.unwrap();

        let err = engine.join_waiting_list(ravi.id, trip.id, fx.date).await.unwrap_err();
        assert!(matches!(err, BookingError::AlreadyWaiting));
        let err = engine.join_waiting_list(asha.id, trip.id, fx.date).await.unwrap_err();
        assert!(matches!(err, BookingError::AlreadyBooked));
        assert_eq!(fx.store.count_entries().await.unwrap(), 1);
    }
}
