//! Glue between the fleet synchronizer and the event stream.

use shuttle_fleet::{FleetResult, SyncReport};
use shuttle_shared::models::FleetSyncedEvent;
use tracing::{error, warn};

use crate::state::AppState;

pub async fn run_cycle(state: &AppState) -> FleetResult<SyncReport> {
    let report = state.sync.run_cycle().await?;
    publish(state, &report).await;
    Ok(report)
}

/// Startup sync: only materializes when the fleet is empty.
pub async fn bootstrap(state: &AppState) {
    match state.sync.bootstrap().await {
        Ok(Some(report)) => publish(state, &report).await,
        Ok(None) => {}
        Err(e) => error!("Bootstrap fleet sync failed: {}", e),
    }
}

/// Daily trigger. Errors end this run only.
pub async fn run_scheduled(state: &AppState) {
    if let Some(report) = state.sync.run_logged().await {
        publish(state, &report).await;
    }
}

async fn publish(state: &AppState, report: &SyncReport) {
    let Some(events) = &state.fleet_events else { return };
    if report.skipped {
        return;
    }

    let event = FleetSyncedEvent {
        strategy: report.strategy.to_string(),
        service_date: report.service_date,
        upserted: report.upserted,
        deleted: report.deleted,
        synced_at: report.synced_at,
    };
    let key = report.service_date.to_string();
    if let Err(e) = events.producer.publish_json(&events.topic, &key, &event).await {
        warn!("Failed to publish fleet sync event: {}", e);
    }
}
