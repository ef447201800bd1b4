use serde::Deserialize;
use shuttle_core::{
    BookingRepository, Clock, InMemoryStore, Notifier, TripRepository, User, UserRepository, WaitlistRepository,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BookingRules {
    /// Same-day cancellations must happen at least this long before departure.
    pub cancellation_cutoff_minutes: i32,
    /// Post-amnesty absences that put an account on hold.
    pub absence_hold_threshold: i64,
    pub notification_timeout_seconds: u64,
}

impl BookingRules {
    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_seconds)
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            cancellation_cutoff_minutes: 30,
            absence_hold_threshold: 5,
            notification_timeout_seconds: 10,
        }
    }
}

/// Shared handles every booking component works through.
#[derive(Clone)]
pub struct BookingContext {
    pub trips: Arc<dyn TripRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub waitlist: Arc<dyn WaitlistRepository>,
    pub users: Arc<dyn UserRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub rules: BookingRules,
}

impl BookingContext {
    /// All four repositories backed by one in-memory store.
    pub fn in_memory(store: Arc<InMemoryStore>, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            trips: store.clone(),
            bookings: store.clone(),
            waitlist: store.clone(),
            users: store,
            notifier,
            clock,
            rules: BookingRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: BookingRules) -> Self {
        self.rules = rules;
        self
    }

    pub(crate) async fn load_user(&self, user_id: Uuid) -> BookingResult<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(BookingError::UserNotFound(user_id))
    }
}
