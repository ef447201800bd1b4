use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use shuttle_booking::{DailyStats, HoldListEntry};
use shuttle_core::{TripInstance, User};
use shuttle_fleet::{NewTrip, SyncReport};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::sync;
use crate::trips::DateQuery;

#[derive(Debug, Deserialize)]
pub struct PlaceholderRequest {
    pub bus_number: String,
    pub total_seats: i32,
    pub driver: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignConductorRequest {
    pub conductor_id: Option<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/holds", get(list_holds))
        .route("/v1/admin/holds/{user_id}/clear", put(clear_hold))
        .route("/v1/admin/sync", post(run_sync))
        .route("/v1/admin/stats", get(daily_stats))
        .route("/v1/admin/fleet/placeholders", post(add_placeholder))
        .route("/v1/admin/fleet/trips", post(add_trip))
        .route("/v1/admin/fleet/trips/{id}/conductor", put(assign_conductor))
}

async fn list_holds(State(state): State<AppState>) -> Result<Json<Vec<HoldListEntry>>, AppError> {
    Ok(Json(state.views.hold_list().await?))
}

async fn clear_hold(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Result<Json<User>, AppError> {
    Ok(Json(state.holds.clear_hold(user_id).await?))
}

async fn run_sync(State(state): State<AppState>) -> Result<Json<SyncReport>, AppError> {
    Ok(Json(sync::run_cycle(&state).await?))
}

async fn daily_stats(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DailyStats>, AppError> {
    let date = query.date.unwrap_or_else(|| state.clock.today());
    Ok(Json(state.views.daily_stats(date).await?))
}

async fn add_placeholder(
    State(state): State<AppState>,
    Json(req): Json<PlaceholderRequest>,
) -> Result<(StatusCode, Json<TripInstance>), AppError> {
    let trip = state
        .fleet
        .add_placeholder(&req.bus_number, req.total_seats, &req.driver)
        .await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn add_trip(
    State(state): State<AppState>,
    Json(req): Json<NewTrip>,
) -> Result<(StatusCode, Json<TripInstance>), AppError> {
    Ok((StatusCode::CREATED, Json(state.fleet.add_trip(req).await?)))
}

async fn assign_conductor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignConductorRequest>,
) -> Result<StatusCode, AppError> {
    state.fleet.assign_conductor(id, req.conductor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
