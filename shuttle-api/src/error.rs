use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shuttle_booking::{BookingError, ErrorKind};
use shuttle_catalog::CatalogError;
use shuttle_fleet::FleetError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    PolicyError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::PolicyError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let msg = err.to_string();
        match err.kind() {
            ErrorKind::Validation => AppError::ValidationError(msg),
            ErrorKind::Conflict => AppError::ConflictError(msg),
            ErrorKind::Policy => AppError::PolicyError(msg),
            ErrorKind::NotFound => AppError::NotFoundError(msg),
            ErrorKind::Infrastructure => AppError::InternalServerError(msg),
        }
    }
}

impl From<FleetError> for AppError {
    fn from(err: FleetError) -> Self {
        let msg = err.to_string();
        match err {
            FleetError::Invalid(_) | FleetError::NotAConductor(_) => AppError::ValidationError(msg),
            FleetError::ScheduleOverlap { .. } | FleetError::DuplicateTrip { .. } => AppError::ConflictError(msg),
            FleetError::TripNotFound(_) => AppError::NotFoundError(msg),
            FleetError::Catalog(e) => e.into(),
            FleetError::Store(_) | FleetError::Lock(_) => AppError::InternalServerError(msg),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let msg = err.to_string();
        match err {
            CatalogError::InvalidTemplate { .. } => AppError::ValidationError(msg),
            CatalogError::ScheduleOverlap { .. } => AppError::ConflictError(msg),
            CatalogError::Unavailable(_) | CatalogError::Malformed(_) => AppError::InternalServerError(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}
