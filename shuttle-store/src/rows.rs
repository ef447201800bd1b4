//! Row shapes shared by the PostgreSQL repositories and their domain conversions.

use chrono::{DateTime, NaiveDate, Utc};
use shuttle_core::{
    Booking, BookingStatus, DayTag, OperatingDays, StoreError, TripInstance, TripSchedule, User, WaitingListEntry,
    PLACEHOLDER_ROUTE,
};
use shuttle_shared::Masked;
use uuid::Uuid;

/// Translates driver errors; unique violations keep the index name so callers
/// can tell which guard fired.
pub(crate) fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::unique(db.constraint().unwrap_or_default());
        }
    }
    StoreError::Backend(e.to_string())
}

pub(crate) const TRIP_COLUMNS: &str = "id, bus_number, driver, total_seats, conductor_id, is_placeholder, \
     origin, destination, route, departure_time, arrival_time, operating_days";

pub(crate) const BOOKING_COLUMNS: &str = "id, user_id, trip_instance_id, bus_number, route, departure_time, \
     arrival_time, seat_number, travel_date, status, created_at";

#[derive(sqlx::FromRow)]
pub(crate) struct TripRow {
    id: Uuid,
    bus_number: String,
    driver: String,
    total_seats: i32,
    conductor_id: Option<Uuid>,
    is_placeholder: bool,
    origin: Option<String>,
    destination: Option<String>,
    route: String,
    departure_time: Option<String>,
    arrival_time: Option<String>,
    operating_days: Vec<String>,
}

impl TryFrom<TripRow> for TripInstance {
    type Error = StoreError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let schedule = if row.is_placeholder {
            None
        } else {
            let (Some(departure_time), Some(arrival_time)) = (row.departure_time, row.arrival_time) else {
                return Err(StoreError::Corrupt(format!("trip {} has no times", row.id)));
            };
            let operating_days = row
                .operating_days
                .iter()
                .map(|d| d.parse::<DayTag>())
                .collect::<Result<OperatingDays, _>>()
                .map_err(|e| StoreError::Corrupt(format!("trip {}: {}", row.id, e)))?;
            Some(TripSchedule {
                origin: row.origin.unwrap_or_default(),
                destination: row.destination.unwrap_or_default(),
                route: row.route,
                departure_time,
                arrival_time,
                operating_days,
            })
        };

        Ok(TripInstance {
            id: row.id,
            bus_number: row.bus_number,
            driver: row.driver,
            total_seats: row.total_seats,
            conductor_id: row.conductor_id,
            schedule,
        })
    }
}

/// Column values for an insert or upsert of `trip`.
pub(crate) struct TripParams<'a> {
    pub route: &'a str,
    pub origin: Option<&'a str>,
    pub destination: Option<&'a str>,
    pub departure_time: Option<&'a str>,
    pub arrival_time: Option<&'a str>,
    pub operating_days: Vec<String>,
}

impl<'a> TripParams<'a> {
    pub fn of(trip: &'a TripInstance) -> Self {
        match &trip.schedule {
            Some(s) => Self {
                route: &s.route,
                origin: Some(&s.origin),
                destination: Some(&s.destination),
                departure_time: Some(&s.departure_time),
                arrival_time: Some(&s.arrival_time),
                operating_days: s.operating_days.iter().map(|d| d.as_str().to_string()).collect(),
            },
            None => Self {
                route: PLACEHOLDER_ROUTE,
                origin: None,
                destination: None,
                departure_time: None,
                arrival_time: None,
                operating_days: Vec::new(),
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    trip_instance_id: Uuid,
    bus_number: String,
    route: String,
    departure_time: String,
    arrival_time: String,
    seat_number: i32,
    travel_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row.status.parse().map_err(StoreError::Corrupt)?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            trip_instance_id: row.trip_instance_id,
            bus_number: row.bus_number,
            route: row.route,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            seat_number: row.seat_number,
            travel_date: row.travel_date,
            status,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn bookings_from(rows: Vec<BookingRow>) -> Result<Vec<Booking>, StoreError> {
    rows.into_iter().map(Booking::try_from).collect()
}

#[derive(sqlx::FromRow)]
pub(crate) struct WaitlistRow {
    id: Uuid,
    user_id: Uuid,
    trip_instance_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<WaitlistRow> for WaitingListEntry {
    fn from(row: WaitlistRow) -> Self {
        WaitingListEntry {
            id: row.id,
            user_id: row.user_id,
            trip_instance_id: row.trip_instance_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    on_hold: bool,
    amnesty_date: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: Masked::new(row.email),
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            on_hold: row.on_hold,
            amnesty_date: row.amnesty_date,
        })
    }
}
