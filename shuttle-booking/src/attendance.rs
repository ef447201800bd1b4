use shuttle_core::{Booking, BookingStatus};
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::BookingContext;
use crate::error::{BookingError, BookingResult};
use crate::holds::HoldTracker;

pub struct AttendanceDesk {
    ctx: BookingContext,
    holds: HoldTracker,
}

impl AttendanceDesk {
    pub fn new(ctx: BookingContext) -> Self {
        let holds = HoldTracker::new(ctx.clone());
        Self { ctx, holds }
    }

    /// Records a boarding outcome. Only the trip's conductor or an admin may
    /// mark; an absence re-evaluates the rider's hold status. No seat is
    /// released and no one is promoted.
    pub async fn mark_attendance(&self, actor_id: Uuid, booking_id: Uuid, status: BookingStatus) -> BookingResult<Booking> {
        if !status.is_processed() {
            return Err(BookingError::Validation(
                "Attendance must be either attended or absent".to_string(),
            ));
        }

        let actor = self.ctx.load_user(actor_id).await?;
        let mut booking = self
            .ctx
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::policy("Cancelled bookings cannot be marked"));
        }
        if !actor.is_admin() {
            let conductor = self
                .ctx
                .trips
                .get_trip(booking.trip_instance_id)
                .await?
                .and_then(|trip| trip.conductor_id);
            if conductor != Some(actor.id) {
                return Err(BookingError::policy("Only the assigned conductor can mark attendance for this trip"));
            }
        }

        if !self.ctx.bookings.update_booking_status(booking.id, status).await? {
            return Err(BookingError::BookingNotFound(booking_id));
        }
        booking.status = status;
        info!(booking_id = %booking.id, marked_by = %actor.id, status = %status, "Attendance marked");

        if status == BookingStatus::Absent {
            if let Err(e) = self.holds.evaluate(booking.user_id).await {
                warn!(user_id = %booking.user_id, "Hold evaluation failed: {}", e);
            }
        }
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::AllocationEngine;
    use crate::testing::Fixture;
    use crate::ErrorKind;
    use shuttle_core::{Role, TripRepository, WaitingListEntry, WaitlistRepository};

    #[tokio::test]
    async fn test_only_assigned_conductor_or_admin_marks() {
        let fx = Fixture::new().await;
        let trip = fx.trip("B1", "09:00 AM", "10:00 AM", 40).await;
        let conductor = fx.user("vikram", Role::Conductor).await;
        let other = fx.user("mohan", Role::Conductor).await;
        let admin = fx.user("warden", Role::Admin).await;
        fx.store.set_conductor(trip.id, Some(conductor.id)).await.unwrap();

        let rider = fx.student("asha").await;
        let booking = AllocationEngine::new(fx.ctx.clone())
            .create_booking(rider.id, trip.id, 3, fx.date)
            .await
            .unwrap();
        let desk = AttendanceDesk::new(fx.ctx.clone());

        let err = desk.mark_attendance(other.id, booking.id, BookingStatus::Attended).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Policy);
        let err = desk.mark_attendance(rider.id, booking.id, BookingStatus::Attended).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Policy);

        let marked = desk.mark_attendance(conductor.id, booking.id, BookingStatus::Attended).await.unwrap();
        assert_eq!(marked.status, BookingStatus::Attended);
        desk.mark_attendance(admin.id, booking.id, BookingStatus::Absent).await.unwrap();

        let err = desk.mark_attendance(admin.id, booking.id, BookingStatus::Confirmed).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_fifth_absence_places_hold_without_promotion() {
        let fx = Fixture::new().await;
        let admin = fx.user("warden", Role::Admin).await;
        let rider = fx.student("ravi").await;
        let engine = AllocationEngine::new(fx.ctx.clone());
        let desk = AttendanceDesk::new(fx.ctx.clone());

        let waiter = fx.student("waiter").await;
        let mut trips = Vec::new();
        for i in 0..5 {
            let departure = format!("{:02}:00", 10 + i);
            let arrival = format!("{:02}:30", 10 + i);
            let trip = fx.trip(&format!("B{}", i), &departure, &arrival, 1).await;
            let booking = engine.create_booking(rider.id, trip.id, 1, fx.date).await.unwrap();
            fx.store
                .insert_entry(&WaitingListEntry::new(waiter.id, trip.id, fx.ctx.clock.now_utc()))
                .await
                .unwrap();
            desk.mark_attendance(admin.id, booking.id, BookingStatus::Absent).await.unwrap();
            trips.push(trip);
        }

        assert!(fx.ctx.load_user(rider.id).await.unwrap().on_hold);
        // No-shows keep their seats; the waiter stays waiting everywhere
        for trip in &trips {
            assert!(fx.store.find_entry(waiter.id, trip.id).await.unwrap().is_some());
        }
        assert!(fx
            .notifier
            .subjects()
            .iter()
            .any(|s| s.starts_with("Account On Hold")));
    }
}
