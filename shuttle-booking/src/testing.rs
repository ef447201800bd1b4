use chrono::NaiveDate;
use shuttle_core::clock::{operating_offset, FixedClock};
use shuttle_core::{DayTag, InMemoryStore, RecordingNotifier, Role, TripInstance, TripRepository, TripSchedule, User};
use std::sync::Arc;

use crate::context::BookingContext;

/// In-memory world pinned to Monday 2026-10-19, 08:00 IST.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub ctx: BookingContext,
    pub date: NaiveDate,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(RecordingNotifier::new())
    }

    pub async fn with_failing_notifier() -> Self {
        Self::build(RecordingNotifier::failing())
    }

    fn build(notifier: RecordingNotifier) -> Self {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(notifier);
        let clock = Arc::new(FixedClock::at(date, 8, 0, operating_offset(330).unwrap()).unwrap());
        let ctx = BookingContext::in_memory(store.clone(), notifier.clone(), clock.clone());
        Self {
            store,
            notifier,
            clock,
            ctx,
            date,
        }
    }

    pub async fn trip(&self, bus: &str, departure: &str, arrival: &str, seats: i32) -> TripInstance {
        let schedule = TripSchedule {
            origin: "LNMIIT".to_string(),
            destination: "Raja Park".to_string(),
            route: "LNMIIT → Raja Park".to_string(),
            departure_time: departure.to_string(),
            arrival_time: arrival.to_string(),
            operating_days: DayTag::ALL.into_iter().collect(),
        };
        let trip = TripInstance::scheduled(bus.to_string(), seats, "Ramesh".to_string(), schedule);
        self.store.insert_trip(&trip).await.unwrap();
        trip
    }

    pub async fn user(&self, name: &str, role: Role) -> User {
        let user = User::new(name, format!("{}@lnmiit.ac.in", name.replace(' ', ".")), role);
        self.store.add_user(user.clone()).await;
        user
    }

    pub async fn student(&self, name: &str) -> User {
        self.user(name, Role::Student).await
    }

    /// Lets detached notification tasks run on the current-thread test runtime.
    pub async fn settle(&self) {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }
}
