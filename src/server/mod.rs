// HTTP facade - JSON API plus the static player pages

pub mod handlers;
pub mod middleware;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::post, Router};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::resolver::ExtractionOrchestrator;

pub struct AppState {
    pub orchestrator: ExtractionOrchestrator,
    pub public_dir: PathBuf,
}

pub fn router(state: Arc<AppState>) -> Router {
    let index = state.public_dir.join("index.html");
    let movies = state.public_dir.join("movies.html");

    Router::new()
        .route(
            "/api/fetch",
            post(handlers::fetch).options(handlers::preflight),
        )
        .route_service("/", ServeFile::new(&index))
        .route_service("/index.html", ServeFile::new(&index))
        .route_service("/movies", ServeFile::new(&movies))
        .nest_service("/static", ServeDir::new(&state.public_dir))
        .layer(axum_middleware::from_fn(middleware::add_response_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
