//! Route modules for the image upload server

pub mod health;
pub mod images;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
///
/// Static assets from the public directory win over image pages, so
/// `/:hash` is only reached when no file matches the path.
pub fn app(state: AppState) -> Router {
    let public_dir = state.config().server.public_dir.clone();
    let max_upload_bytes = state.config().upload.max_bytes;

    let image_pages = images::show_router().with_state(state.clone());
    let static_files = ServeDir::new(public_dir).fallback(image_pages);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", health::router())
        .merge(images::upload_router())
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
