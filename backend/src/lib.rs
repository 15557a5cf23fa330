//! Agri Supply Chain platform backend
//!
//! Batch lifecycle engine for farm-to-shelf traceability: custody transfer
//! between farmers, transporters, distributors and retailers, batch splitting,
//! frozen retail pricing, and a public trace view.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

use external::ArtifactGenerator;
use middleware::AuthUser;
use services::{LifecycleService, ProfileService, TraceabilityService};
use shared::StakeholderProfile;
use store::EntityStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub artifacts: Arc<dyn ArtifactGenerator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(self.store.clone(), self.artifacts.clone())
            .with_max_lineage_depth(self.config.lifecycle.max_lineage_depth)
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.store.clone())
    }

    pub fn traceability(&self) -> TraceabilityService {
        TraceabilityService::new(self.store.clone())
            .with_max_lineage_depth(self.config.lifecycle.max_lineage_depth)
    }

    /// Profile acting for an authenticated account
    pub async fn actor(&self, user: &AuthUser) -> AppResult<StakeholderProfile> {
        self.profiles().resolve_actor(user.user_id).await
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Agri Supply Chain Platform API v1.0"
}
