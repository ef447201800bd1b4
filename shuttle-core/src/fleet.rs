use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::days::OperatingDays;
use crate::time::{parse_to_minutes, TimeWindow};

/// Route label carried by fleet assets that are not in active rotation.
pub const PLACEHOLDER_ROUTE: &str = "New Asset (Placeholder)";

/// Identity of a scheduled trip instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripKey {
    pub bus_number: String,
    pub departure_time: String,
}

/// Route and timing of a scheduled trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSchedule {
    pub origin: String,
    pub destination: String,
    pub route: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub operating_days: OperatingDays,
}

impl TripSchedule {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_text(&self.departure_time, &self.arrival_time)
    }

    pub fn departure_minutes(&self) -> i32 {
        parse_to_minutes(&self.departure_time)
    }
}

/// A bus materialized for the service day, or a placeholder fleet asset when
/// `schedule` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripInstance {
    pub id: Uuid,
    pub bus_number: String,
    pub driver: String,
    pub total_seats: i32,
    pub conductor_id: Option<Uuid>,
    pub schedule: Option<TripSchedule>,
}

impl TripInstance {
    pub fn placeholder(bus_number: String, total_seats: i32, driver: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            bus_number,
            driver,
            total_seats,
            conductor_id: None,
            schedule: None,
        }
    }

    pub fn scheduled(bus_number: String, total_seats: i32, driver: String, schedule: TripSchedule) -> Self {
        Self {
            id: Uuid::new_v4(),
            bus_number,
            driver,
            total_seats,
            conductor_id: None,
            schedule: Some(schedule),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.schedule.is_none()
    }

    pub fn key(&self) -> Option<TripKey> {
        self.schedule.as_ref().map(|s| TripKey {
            bus_number: self.bus_number.clone(),
            departure_time: s.departure_time.clone(),
        })
    }

    pub fn route(&self) -> &str {
        self.schedule
            .as_ref()
            .map(|s| s.route.as_str())
            .unwrap_or(PLACEHOLDER_ROUTE)
    }

    /// Minutes since midnight of departure; placeholders sort first.
    pub fn departure_minutes(&self) -> i32 {
        self.schedule.as_ref().map(|s| s.departure_minutes()).unwrap_or(0)
    }
}

/// Mutations produced by one synchronization pass, applied as a single unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub upserts: Vec<TripInstance>,
    pub deletions: Vec<Uuid>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }
}
