use axum::{
    extract::State,
    http::Method,
    middleware::from_fn_with_state,
    response::IntoResponse,
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod conductor;
pub mod error;
pub mod middleware;
pub mod state;
pub mod sync;
pub mod trips;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let signed_in = Router::new()
        .merge(trips::routes())
        .merge(bookings::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));
    let conductor = conductor::routes().route_layer(from_fn_with_state(state.clone(), middleware::conductor_middleware));
    let admin = admin::routes().route_layer(from_fn_with_state(state.clone(), middleware::admin_middleware));

    let mut router = Router::new()
        .merge(trips::public_routes())
        .merge(signed_in)
        .merge(conductor)
        .merge(admin);

    // Needs ConnectInfo, so only for servers started with it
    if state.rate_limit.is_some() {
        router = router.layer(from_fn_with_state(state.clone(), rate_limit_middleware));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<SocketAddr>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let Some(limit) = &state.rate_limit else {
        return Ok(next.run(req).await);
    };
    let key = format!("ratelimit:{}", addr.ip());

    match limit.redis.check_rate_limit(&key, limit.requests_per_minute, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((axum::http::StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
