pub mod events;

pub use events::{FleetSyncedEvent, NotificationRequestedEvent};
