use std::path::Path;

use axum::routing::post;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;
use crate::providers::remote::GENERATE_PATH;

/// The generate route plus, when `static_dir` exists, static files for
/// every other path.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route(GENERATE_PATH, post(handlers::generate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) if dir.is_dir() => {
            router = router.fallback_service(ServeDir::new(dir));
            tracing::info!(path = %dir.display(), "Static file serving enabled");
        }
        Some(dir) => {
            tracing::warn!(path = %dir.display(), "Static directory not found, serving API only");
        }
        None => {}
    }

    router
}
