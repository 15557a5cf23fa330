//! Route definitions for the Agri Supply Chain platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Public traceability routes (unauthenticated - for QR code scanning)
        .route("/trace/:public_batch_id", get(handlers::get_traceability_view))
        // Protected routes
        .merge(protected_routes(state))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/profiles", profile_routes())
        .nest("/batches", batch_routes())
        .nest("/transport-requests", transport_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Profile routes (protected)
fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::register_profile))
        .route("/me", get(handlers::get_my_profile))
        .route("/:profile_id", get(handlers::get_profile))
}

/// Batch lifecycle routes (protected)
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_batch))
        .route("/:batch_id", get(handlers::get_batch))
        .route("/:batch_id/history", get(handlers::get_batch_history))
        .route(
            "/:batch_id/transport-requests",
            get(handlers::list_batch_transports).post(handlers::request_transport),
        )
        .route(
            "/:batch_id/transport-requests/active",
            get(handlers::get_active_transport),
        )
        .route(
            "/:batch_id/transport-requests/retailer",
            post(handlers::request_transport_to_retailer),
        )
        .route("/:batch_id/transport-fees", get(handlers::get_transport_fees))
        .route("/:batch_id/store", post(handlers::store_batch))
        .route(
            "/:batch_id/distributor-margin",
            put(handlers::set_distributor_margin),
        )
        .route("/:batch_id/split", post(handlers::split_batch))
        .route("/:batch_id/list", post(handlers::list_batch))
        .route("/:batch_id/sell", post(handlers::sell_batch))
        .route("/:batch_id/suspend", post(handlers::suspend_batch))
        .route("/:batch_id/inspections", post(handlers::record_inspection))
}

/// Transport request routes (protected)
fn transport_routes() -> Router<AppState> {
    Router::new()
        .route("/:request_id/accept", post(handlers::accept_transport))
        .route("/:request_id/reject", post(handlers::reject_transport))
        .route("/:request_id/arrive", post(handlers::mark_arrival))
        .route("/:request_id/confirm", post(handlers::confirm_arrival))
        .route("/:request_id/deliver", post(handlers::deliver_batch))
}
