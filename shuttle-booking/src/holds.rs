use shuttle_core::User;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::BookingContext;
use crate::error::{BookingError, BookingResult};
use crate::notifications;

/// Absence counting and the on-hold policy built on it.
pub struct HoldTracker {
    ctx: BookingContext,
}

impl HoldTracker {
    pub fn new(ctx: BookingContext) -> Self {
        Self { ctx }
    }

    /// Absences recorded at or after the user's amnesty date.
    pub async fn absent_count(&self, user_id: Uuid) -> BookingResult<i64> {
        let user = self.ctx.load_user(user_id).await?;
        Ok(self.ctx.bookings.count_absences(user.id, user.amnesty_date).await?)
    }

    pub async fn total_absences(&self, user_id: Uuid) -> BookingResult<i64> {
        Ok(self.ctx.bookings.count_absences(user_id, None).await?)
    }

    /// Lifts a hold and starts a fresh absence count. Past bookings keep their status.
    pub async fn clear_hold(&self, user_id: Uuid) -> BookingResult<User> {
        let amnesty = self.ctx.clock.now_utc();
        if !self.ctx.users.clear_hold(user_id, amnesty).await? {
            return Err(BookingError::UserNotFound(user_id));
        }
        info!(%user_id, %amnesty, "Hold cleared");
        self.ctx.load_user(user_id).await
    }

    /// Puts the user on hold once their post-amnesty absences reach the
    /// threshold. Returns whether the hold was placed by this call.
    pub async fn evaluate(&self, user_id: Uuid) -> BookingResult<bool> {
        let user = self.ctx.load_user(user_id).await?;
        if user.on_hold {
            return Ok(false);
        }

        let absences = self.ctx.bookings.count_absences(user.id, user.amnesty_date).await?;
        if absences < self.ctx.rules.absence_hold_threshold {
            return Ok(false);
        }

        self.ctx.users.place_on_hold(user.id).await?;
        warn!(%user_id, absences, "Account placed on hold");
        notifications::dispatch(
            self.ctx.notifier.as_ref(),
            self.ctx.rules.notification_timeout(),
            notifications::account_on_hold(&user, absences),
        )
        .await;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use shuttle_core::{Booking, BookingRepository, BookingStatus};

    async fn absent_booking(fx: &Fixture, user: &User, bus: &str) -> Booking {
        let trip = fx.trip(bus, "09:00 AM", "10:00 AM", 40).await;
        let mut booking = Booking::confirmed(
            user.id,
            &trip,
            trip.schedule.as_ref().unwrap(),
            1,
            fx.date,
            fx.ctx.clock.now_utc(),
        );
        booking.status = BookingStatus::Absent;
        fx.store.insert_booking(&booking).await.unwrap();
        booking
    }

    #[tokio::test]
    async fn test_amnesty_resets_count_without_touching_history() {
        let fx = Fixture::new().await;
        let holds = HoldTracker::new(fx.ctx.clone());
        let user = fx.student("asha").await;

        for i in 0..3 {
            absent_booking(&fx, &user, &format!("B{}", i)).await;
        }
        assert_eq!(holds.absent_count(user.id).await.unwrap(), 3);

        fx.clock.advance(chrono::Duration::minutes(1));
        let cleared = holds.clear_hold(user.id).await.unwrap();
        assert!(!cleared.on_hold);
        assert!(cleared.amnesty_date.is_some());
        assert_eq!(holds.absent_count(user.id).await.unwrap(), 0);

        fx.clock.advance(chrono::Duration::minutes(1));
        absent_booking(&fx, &user, "B9").await;
        assert_eq!(holds.absent_count(user.id).await.unwrap(), 1);
        assert_eq!(holds.total_absences(user.id).await.unwrap(), 4);

        let statuses: Vec<_> = fx.store.bookings().await.iter().map(|b| b.status).collect();
        assert!(statuses.iter().all(|s| *s == BookingStatus::Absent));
    }

    #[tokio::test]
    async fn test_hold_placed_at_threshold() {
        let fx = Fixture::new().await;
        let holds = HoldTracker::new(fx.ctx.clone());
        let user = fx.student("ravi").await;

        for i in 0..4 {
            absent_booking(&fx, &user, &format!("B{}", i)).await;
        }
        assert!(!holds.evaluate(user.id).await.unwrap());

        absent_booking(&fx, &user, "B4").await;
        assert!(holds.evaluate(user.id).await.unwrap());
        assert!(fx.ctx.load_user(user.id).await.unwrap().on_hold);
        // Already on hold: no second notice
        assert!(!holds.evaluate(user.id).await.unwrap());
        assert_eq!(fx.notifier.sent().len(), 1);
    }
}
