use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api;
use crate::middleware::admin_auth_middleware;
use crate::state::AppState;

/// Firmware images for ESP32 partitions stay well below this.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let protected_api = Router::<AppState>::new()
        .nest("/admin/api", api::admin_router())
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    let public_routes = Router::<AppState>::new()
        .route("/api/firmware", get(api::check_firmware_update))
        .route("/status", get(api::get_status))
        .route("/health", get(api::health_check))
        .route("/healthz", get(api::health_check));

    let firmware_files = ServeDir::new(state.firmware().dir());

    protected_api
        .merge(public_routes)
        .with_state(state)
        .nest_service("/firmware", firmware_files)
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
