use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shuttle_core::{Booking, WaitingListEntry};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub trip_id: Uuid,
    pub seat_number: i32,
    /// Defaults to today in the operating time zone.
    pub travel_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct JoinWaitlistRequest {
    pub trip_id: Uuid,
    pub travel_date: Option<NaiveDate>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/mine", get(my_bookings))
        .route("/v1/bookings/{id}", delete(cancel_booking))
        .route("/v1/waitlist", post(join_waiting_list))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let travel_date = req.travel_date.unwrap_or_else(|| state.clock.today());
    let booking = state
        .engine
        .create_booking(claims.sub, req.trip_id, req.seat_number, travel_date)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.views.my_bookings(claims.sub).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.engine.cancel_booking(claims.sub, id).await?))
}

async fn join_waiting_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<JoinWaitlistRequest>,
) -> Result<(StatusCode, Json<WaitingListEntry>), AppError> {
    let travel_date = req.travel_date.unwrap_or_else(|| state.clock.today());
    let entry = state
        .engine
        .join_waiting_list(claims.sub, req.trip_id, travel_date)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
