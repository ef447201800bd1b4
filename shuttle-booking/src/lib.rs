pub mod allocation;
pub mod attendance;
pub mod context;
pub mod error;
pub mod holds;
pub mod notifications;
pub mod views;
pub mod waitlist;

#[cfg(test)]
mod testing;

pub use allocation::AllocationEngine;
pub use attendance::AttendanceDesk;
pub use context::{BookingContext, BookingRules};
pub use error::{BookingError, BookingResult, ErrorKind};
pub use holds::HoldTracker;
pub use views::{BookingViews, DailyStats, HoldListEntry, SeatMap, SeatState, TripAvailability};
pub use waitlist::WaitlistPromoter;
