/// Names of the uniqueness guards every store implementation must enforce.
pub mod constraints {
    /// One non-cancelled booking per (trip instance, seat, travel date).
    pub const BOOKING_SEAT: &str = "bookings_active_seat_key";
    /// One non-cancelled booking per (user, trip instance, travel date).
    pub const BOOKING_USER_TRIP: &str = "bookings_active_user_trip_key";
    /// One waiting-list entry per (user, trip instance).
    pub const WAITLIST_USER_TRIP: &str = "waiting_list_user_trip_key";
    /// One non-placeholder trip instance per (bus number, departure time).
    pub const TRIP_IDENTITY: &str = "trip_instances_identity_key";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("Stored record is invalid: {0}")]
    Corrupt(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn unique(constraint: &str) -> Self {
        Self::UniqueViolation {
            constraint: constraint.to_string(),
        }
    }

    pub fn is_unique_violation_of(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
