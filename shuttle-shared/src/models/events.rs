use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::pii::Masked;

/// Published for the mailer service whenever a booking-side notification is emitted.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct NotificationRequestedEvent {
    pub notification_id: Uuid,
    pub recipient: Masked<String>,
    pub subject: String,
    pub body: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct FleetSyncedEvent {
    pub strategy: String,
    pub service_date: chrono::NaiveDate,
    pub upserted: usize,
    pub deleted: usize,
    pub synced_at: DateTime<Utc>,
}
