pub mod admin;
pub mod lock;
pub mod scheduler;
pub mod service;
pub mod synchronizer;

pub use admin::{FleetManager, NewTrip};
pub use lock::{CycleLock, LocalCycleLock, LockToken};
pub use scheduler::{daily_task, duration_until_next, DailyTask, TaskScheduler, TokioScheduler};
pub use service::{FleetSynchronizer, SyncReport};
pub use synchronizer::{synchronize_day, SyncStrategy};

use shuttle_catalog::CatalogError;
use shuttle_core::StoreError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
    #[error("Cycle lock unavailable: {0}")]
    Lock(String),
    #[error("Bus {bus_number} is already scheduled from {existing}. Cannot overlap.")]
    ScheduleOverlap { bus_number: String, existing: String },
    #[error("Bus {bus_number} already has a trip departing at {departure_time}")]
    DuplicateTrip {
        bus_number: String,
        departure_time: String,
    },
    #[error("Trip not found: {0}")]
    TripNotFound(Uuid),
    #[error("User {0} is not a conductor")]
    NotAConductor(Uuid),
    #[error("Invalid trip: {0}")]
    Invalid(String),
}

pub type FleetResult<T> = Result<T, FleetError>;
