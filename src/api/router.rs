use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes; Bearer token required when API_TOKEN is set
    let protected = Router::new()
        // Engine control
        .route("/api/engine/start", post(handlers::control::start))
        .route("/api/engine/stop", post(handlers::control::stop))
        .route("/api/engine/status", get(handlers::control::status))
        // Positions
        .route("/api/master-positions", put(handlers::positions::update_master))
        .route("/api/master-positions/:user_id", get(handlers::positions::list_master))
        .route("/api/follower-positions/:user_id", get(handlers::positions::list_follower))
        // Trade ledger
        .route("/api/trades", get(handlers::trades::list))
        // Follow configs
        .route("/api/follow-configs", put(handlers::follow_configs::upsert))
        .route("/api/follow-configs/:user_id", get(handlers::follow_configs::get_config))
        // Failures (`:id` is the user id on GET, the failure id on resolve)
        .route("/api/failures/:id", get(handlers::failures::list))
        .route("/api/failures/:id/resolve", post(handlers::failures::resolve))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
