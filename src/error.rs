//! Error types for the content client, the page renderer and the HTTP layer.
//!
//! Handler errors render as HTML pages rather than JSON, since every route
//! except `/health` serves a browser.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::config::ConfigError;
use crate::templates::{ErrorTemplate, NotFoundTemplate};

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Content API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ContentError>;

/// Outcome of rendering one event page.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("no event found for slug `{0}`")]
    NotFound(String),

    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream error: {0}")]
    Upstream(#[from] ContentError),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),
}

impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::NotFound(slug) => AppError::NotFound(slug),
            PageError::Content(err) => AppError::Upstream(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let rendered = match &self {
            AppError::NotFound(slug) => {
                tracing::debug!(%slug, "event not found");
                NotFoundTemplate { slug: Some(slug.clone()) }.render()
            }
            AppError::Upstream(err) => {
                tracing::error!(error = %err, "content backend request failed");
                ErrorTemplate {
                    title: "Service Unavailable".to_string(),
                    message: "The event listing is temporarily unavailable. Please try again later."
                        .to_string(),
                }
                .render()
            }
            AppError::Render(err) => {
                tracing::error!(error = %err, "template rendering failed");
                ErrorTemplate {
                    title: "Internal Error".to_string(),
                    message: "An internal error occurred. Please try again later.".to_string(),
                }
                .render()
            }
        };

        match rendered {
            Ok(body) => (status, Html(body)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "error page rendering failed");
                (status, status.canonical_reason().unwrap_or("Error")).into_response()
            }
        }
    }
}
