use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::state::AppState;
use crate::templates::{EventTemplate, NotFoundTemplate};

pub const CACHE_TAGS_HEADER: &str = "x-cache-tags";

#[instrument(skip(state))]
pub async fn event_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let page = state.renderer.render(&slug).await?;
    let body = EventTemplate { event: page.view }.render()?;
    info!(tags = page.tags.len(), "rendered event page");

    let mut response = Html(body).into_response();
    if let Ok(value) = HeaderValue::from_str(&page.tags.join(",")) {
        if !value.is_empty() {
            response.headers_mut().insert(HeaderName::from_static(CACHE_TAGS_HEADER), value);
        }
    }
    Ok(response)
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "event-page",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn not_found() -> Result<Response, AppError> {
    let body = NotFoundTemplate { slug: None }.render()?;
    Ok((StatusCode::NOT_FOUND, Html(body)).into_response())
}
