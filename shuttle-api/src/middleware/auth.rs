use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shuttle_core::Role;
use uuid::Uuid;

use crate::state::AppState;

/// Claims carried by tokens from the campus identity service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

fn verify(state: &AppState, req: &Request) -> Result<Claims, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| StatusCode::UNAUTHORIZED)
}

async fn require(
    state: AppState,
    mut req: Request,
    next: Next,
    allowed: &[Role],
) -> Result<Response, StatusCode> {
    let claims = verify(&state, &req)?;
    if !allowed.is_empty() && !allowed.contains(&claims.role) {
        return Err(StatusCode::FORBIDDEN);
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Any signed-in user.
pub async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    require(state, req, next, &[]).await
}

pub async fn conductor_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    require(state, req, next, &[Role::Conductor, Role::Admin]).await
}

pub async fn admin_middleware(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    require(state, req, next, &[Role::Admin]).await
}
