pub mod source;
pub mod template;
pub mod validation;

pub use source::{CatalogSource, JsonFileCatalog, StaticCatalog};
pub use template::{TimetableRow, TripTemplate};
pub use validation::{timetable, validate_catalog};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
    #[error("Catalog is malformed: {0}")]
    Malformed(String),
    #[error("Invalid template for bus {bus_number}: {reason}")]
    InvalidTemplate { bus_number: String, reason: String },
    #[error("Bus {bus_number} is scheduled {first} and {second}, which overlap")]
    ScheduleOverlap {
        bus_number: String,
        first: String,
        second: String,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
