//! API routes

pub mod auth;
pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    auth::{optional_auth, require_admin, require_auth, require_owner_or_admin},
    state::AppState,
};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    // Public API routes (no auth required)
    let public_api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        // Session introspection wants the caller's identity when present but
        // must not block anonymous access
        .route(
            "/auth/session",
            get(auth::session).route_layer(middleware::from_fn_with_state(
                state.clone(),
                optional_auth,
            )),
        );

    // Protected API routes (auth required)
    let protected_api_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/auth/users/:id/activate",
            post(auth::activate_user).route_layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/auth/users/:id/deactivate",
            post(auth::deactivate_user).route_layer(middleware::from_fn(require_owner_or_admin)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api_v1_routes = Router::new()
        .merge(public_api_routes)
        .merge(protected_api_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
