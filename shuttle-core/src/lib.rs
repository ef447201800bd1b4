pub mod booking;
pub mod clock;
pub mod days;
pub mod error;
pub mod fleet;
pub mod memory;
pub mod notify;
pub mod repository;
pub mod time;
pub mod user;

pub use booking::{Booking, BookingStatus, WaitingListEntry};
pub use clock::{Clock, FixedClock, SystemClock};
pub use days::{DayTag, OperatingDays};
pub use error::{StoreError, StoreResult};
pub use fleet::{SyncPlan, TripInstance, TripKey, TripSchedule, PLACEHOLDER_ROUTE};
pub use memory::InMemoryStore;
pub use notify::{LogNotifier, Notification, Notifier, NotifyError, RecordingNotifier};
pub use repository::{BookingRepository, TripRepository, UserRepository, WaitlistRepository};
pub use time::{overlap, parse_to_minutes, TimeWindow, MINUTES_PER_DAY};
pub use user::{Role, User};
