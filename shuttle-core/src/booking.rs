use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::fleet::{TripInstance, TripSchedule};
use crate::time::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Attended,
    Absent,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Attended => "attended",
            BookingStatus::Absent => "absent",
        }
    }

    /// Holds a seat: everything except `Cancelled`.
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Already handled by a conductor; immutable to cancellation.
    pub fn is_processed(&self) -> bool {
        matches!(self, BookingStatus::Attended | BookingStatus::Absent)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "attended" => Ok(BookingStatus::Attended),
            "absent" => Ok(BookingStatus::Absent),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// A seat reservation. Route and timing fields are copied from the trip at
/// booking time and never re-read from the live trip instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_instance_id: Uuid,
    pub bus_number: String,
    pub route: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub seat_number: i32,
    pub travel_date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn confirmed(
        user_id: Uuid,
        trip: &TripInstance,
        schedule: &TripSchedule,
        seat_number: i32,
        travel_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            trip_instance_id: trip.id,
            bus_number: trip.bus_number.clone(),
            route: schedule.route.clone(),
            departure_time: schedule.departure_time.clone(),
            arrival_time: schedule.arrival_time.clone(),
            seat_number,
            travel_date,
            status: BookingStatus::Confirmed,
            created_at,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::from_text(&self.departure_time, &self.arrival_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingListEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_instance_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl WaitingListEntry {
    pub fn new(user_id: Uuid, trip_instance_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            trip_instance_id,
            created_at,
        }
    }
}
