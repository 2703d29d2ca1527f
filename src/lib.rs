pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod image;
pub mod logging;
pub mod models;
pub mod page;
pub mod portable_text;
pub mod router;
pub mod state;
pub mod templates;

use std::sync::Arc;

use crate::config::Config;
use crate::content::{ContentClient, LiveFetcher};
use crate::error::Result;
use crate::image::ImageUrlBuilder;
use crate::page::EventPageRenderer;

/// Wires the content client, live read path and image URLs into a renderer.
pub fn build_renderer(config: &Config) -> Result<EventPageRenderer> {
    let client = ContentClient::new(config.content.clone())?;
    let images = ImageUrlBuilder::from_config(client.config());
    let live = LiveFetcher::new(&client);
    Ok(EventPageRenderer::new(Arc::new(live), images, config.display.zone))
}
