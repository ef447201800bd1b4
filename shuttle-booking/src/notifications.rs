//! User-facing message templates and best-effort delivery.

use shuttle_core::{Booking, Notification, Notifier, User};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SERVICE: &str = "LNMIIT Bus Service";

fn trip_summary(booking: &Booking) -> String {
    format!(
        "Bus: {}\nRoute: {}\nDate: {}\nDeparture: {}\nArrival: {}\nSeat: {}",
        booking.bus_number,
        booking.route,
        booking.travel_date.format("%a, %d %b %Y"),
        booking.departure_time,
        booking.arrival_time,
        booking.seat_number
    )
}

pub fn booking_confirmed(user: &User, booking: &Booking) -> Notification {
    Notification::new(
        user.email.clone(),
        format!("Booking Confirmed - {}", SERVICE),
        format!("Hi {},\n\nYour seat is confirmed.\n\n{}", user.name, trip_summary(booking)),
    )
}

pub fn booking_cancelled(user: &User, booking: &Booking) -> Notification {
    Notification::new(
        user.email.clone(),
        format!("Booking Cancelled - {}", SERVICE),
        format!("Hi {},\n\nYour booking has been cancelled.\n\n{}", user.name, trip_summary(booking)),
    )
}

pub fn promoted_from_waitlist(user: &User, booking: &Booking) -> Notification {
    Notification::new(
        user.email.clone(),
        format!("You're Off The Waiting List! - {}", SERVICE),
        format!(
            "Hi {},\n\nA seat opened up and has been booked for you.\n\n{}",
            user.name,
            trip_summary(booking)
        ),
    )
}

pub fn account_on_hold(user: &User, absences: i64) -> Notification {
    Notification::new(
        user.email.clone(),
        format!("Account On Hold - {}", SERVICE),
        format!(
            "Hi {},\n\nYou were marked absent on {} trips, so new bookings are blocked until an administrator clears the hold.",
            user.name, absences
        ),
    )
}

/// Delivers within `timeout`. Failures are logged and swallowed.
pub async fn dispatch(notifier: &dyn Notifier, timeout: Duration, notification: Notification) {
    match tokio::time::timeout(timeout, notifier.notify(&notification)).await {
        Ok(Ok(())) => debug!(recipient = %notification.recipient, subject = %notification.subject, "Notification sent"),
        Ok(Err(e)) => warn!(recipient = %notification.recipient, subject = %notification.subject, "Notification failed: {}", e),
        Err(_) => warn!(recipient = %notification.recipient, subject = %notification.subject, "Notification timed out"),
    }
}

/// Runs [`dispatch`] on its own task so the caller never waits on the transport.
pub fn dispatch_detached(notifier: Arc<dyn Notifier>, timeout: Duration, notification: Notification) -> JoinHandle<()> {
    tokio::spawn(async move { dispatch(notifier.as_ref(), timeout, notification).await })
}
