use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{event_page, health, not_found};
use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/events/:slug", get(event_page))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
