use axum::{
    extract::{Path, State},
    routing::put,
    Extension, Json, Router,
};
use serde::Deserialize;
use shuttle_core::{Booking, BookingStatus};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub status: BookingStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/conductor/bookings/{id}/attendance", put(mark_attendance))
}

async fn mark_attendance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<AttendanceRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.attendance.mark_attendance(claims.sub, id, req.status).await?))
}
