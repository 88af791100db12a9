// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{exams, results},
    state::AppState,
};

/// Assembles the main application router.
///
/// * JSON endpoints for exams, questions and results.
/// * Static mounts for the raw results log, reference images and the
///   optional browser front-end.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/exams", get(exams::list_exams))
        .route("/questions/{exam_name}", get(exams::get_questions))
        .route("/submit", post(results::submit_result))
        .route("/api/results", get(results::list_results));

    let static_routes = Router::new()
        .route_service("/results.json", ServeFile::new(&state.config.results_file))
        .nest_service("/images", ServeDir::new(&state.config.images_dir))
        .fallback_service(ServeDir::new(&state.config.public_dir));

    Router::new()
        .merge(api_routes)
        .merge(static_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
