use serde::Serialize;
use shuttle_core::StoreError;
use uuid::Uuid;

/// Coarse outcome classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    Policy,
    NotFound,
    Infrastructure,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),
    #[error("Seat {seat_number} is already booked for this trip")]
    SeatTaken { seat_number: i32 },
    #[error("You have already booked a seat on this bus for this date")]
    AlreadyBooked,
    #[error("This trip overlaps your booking on bus {bus_number} ({departure_time} - {arrival_time})")]
    TimeConflict {
        bus_number: String,
        departure_time: String,
        arrival_time: String,
    },
    #[error("Seats are still available on this bus. Book a seat directly.")]
    SeatsAvailable,
    #[error("You are already on the waiting list for this bus")]
    AlreadyWaiting,
    #[error("Your account is on hold due to repeated absences. Please contact the administrator.")]
    OnHold,
    #[error("{0}")]
    Policy(String),
    #[error("Trip not found: {0}")]
    TripNotFound(Uuid),
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),
    #[error("User not found: {0}")]
    UserNotFound(Uuid),
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_) => ErrorKind::Validation,
            BookingError::SeatTaken { .. }
            | BookingError::AlreadyBooked
            | BookingError::TimeConflict { .. }
            | BookingError::SeatsAvailable
            | BookingError::AlreadyWaiting => ErrorKind::Conflict,
            BookingError::OnHold | BookingError::Policy(_) => ErrorKind::Policy,
            BookingError::TripNotFound(_) | BookingError::BookingNotFound(_) | BookingError::UserNotFound(_) => {
                ErrorKind::NotFound
            }
            BookingError::Store(_) => ErrorKind::Infrastructure,
        }
    }

    pub(crate) fn policy(message: impl Into<String>) -> Self {
        BookingError::Policy(message.into())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(BookingError::SeatTaken { seat_number: 3 }.kind(), ErrorKind::Conflict);
        assert_eq!(BookingError::OnHold.kind(), ErrorKind::Policy);
        assert_eq!(BookingError::TripNotFound(Uuid::nil()).kind(), ErrorKind::NotFound);
        assert_eq!(
            BookingError::Store(StoreError::Backend("down".into())).kind(),
            ErrorKind::Infrastructure
        );
    }
}
