use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shuttle_booking::{SeatMap, TripAvailability};
use shuttle_catalog::{timetable, TimetableRow};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/v1/timetable", get(get_timetable))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", get(list_bookable_trips))
        .route("/v1/trips/{id}/seats", get(get_seat_map))
}

async fn get_timetable(State(state): State<AppState>) -> Result<Json<Vec<TimetableRow>>, AppError> {
    let templates = state.catalog.load().await?;
    Ok(Json(timetable(&templates)))
}

async fn list_bookable_trips(State(state): State<AppState>) -> Result<Json<Vec<TripAvailability>>, AppError> {
    Ok(Json(state.views.bookable_trips().await?))
}

async fn get_seat_map(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SeatMap>, AppError> {
    let date = query.date.unwrap_or_else(|| state.clock.today());
    Ok(Json(state.views.seat_map(id, date).await?))
}
