//! Router construction

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))

        // Directory
        .route(
            "/api/v1/registries",
            get(handlers::list_registries).post(handlers::create_registry),
        )
        .route("/api/v1/registries/by-user/:address", get(handlers::registry_by_user))
        .route("/api/v1/registries/by-domain/:domain", get(handlers::registry_by_domain))
        .route("/api/v1/registries/:handle", get(handlers::get_registry))

        // Devices
        .route(
            "/api/v1/registries/:handle/devices",
            get(handlers::list_devices).post(handlers::add_device),
        )
        .route("/api/v1/registries/:handle/devices/:hash", get(handlers::get_device))

        // App permissions
        .route(
            "/api/v1/registries/:handle/devices/:hash/apps",
            get(handlers::list_apps).post(handlers::grant_app),
        )
        .route(
            "/api/v1/registries/:handle/devices/:hash/apps/:app_id",
            get(handlers::get_app).put(handlers::update_permission),
        )

        // Indexer feed and ENS lookups
        .route("/api/v1/events", get(handlers::events))
        .route("/api/v1/ens/resolve/:name", get(handlers::resolve))

        // State
        .with_state(state)

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
