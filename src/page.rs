//! Event detail page: one query, one record, presentation values.

use chrono::{Local, TimeDelta, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

use crate::config::DisplayZone;
use crate::content::{ContentSource, QueryParams};
use crate::error::{ContentError, PageError};
use crate::image::{self, ImageUrlBuilder};
use crate::models::Event;
use crate::portable_text;

/// First event with the given slug, with its headline and venue resolved.
pub const EVENT_QUERY: &str = r#"*[
    _type == "event" &&
    slug.current == $slug
  ][0]{
  ...,
  headline->,
  venue->
}"#;

/// `Sat Nov 02 2024`
pub const DATE_FORMAT: &str = "%a %b %d %Y";
/// `8:00:00 PM`
pub const TIME_FORMAT: &str = "%-I:%M:%S %p";

/// Everything the event template displays, already formatted. `None` means
/// the corresponding section is left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    pub name: Option<String>,
    pub image_url: String,
    pub image_alt: String,
    pub format_label: Option<String>,
    pub headline: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub doors_open: Option<String>,
    pub venue: Option<String>,
    pub details_html: Option<String>,
    pub tickets: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EventPage {
    pub view: EventView,
    /// Cache tags of the content the page was built from.
    pub tags: Vec<String>,
}

pub struct EventPageRenderer {
    source: Arc<dyn ContentSource>,
    images: Option<ImageUrlBuilder>,
    zone: DisplayZone,
}

impl EventPageRenderer {
    pub fn new(
        source: Arc<dyn ContentSource>,
        images: Option<ImageUrlBuilder>,
        zone: DisplayZone,
    ) -> Self {
        Self { source, images, zone }
    }

    pub async fn render(&self, slug: &str) -> Result<EventPage, PageError> {
        if slug.trim().is_empty() || slug.contains('/') {
            return Err(PageError::NotFound(slug.to_string()));
        }

        let params = QueryParams::new().with("slug", slug);
        let result = self.source.fetch(EVENT_QUERY, &params).await?;
        if result.is_absent() {
            return Err(PageError::NotFound(slug.to_string()));
        }

        let event: Event = serde_json::from_value(result.data).map_err(ContentError::from)?;
        debug!(%slug, ?event, "event data");

        let view = match self.zone {
            DisplayZone::Local => present(&event, self.images.as_ref(), &Local),
            DisplayZone::Utc => present(&event, self.images.as_ref(), &Utc),
        };
        Ok(EventPage { view, tags: result.tags })
    }
}

/// Derives display values for `event`, formatting times in `tz`.
pub fn present<Tz>(event: &Event, images: Option<&ImageUrlBuilder>, tz: &Tz) -> EventView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let name = non_empty(event.name.clone());
    let starts_at = event.starts_at().map(|dt| dt.with_timezone(tz));

    // A zero offset counts as "not set", same as a missing one.
    let doors_open = match (&starts_at, event.doors_open) {
        (Some(start), Some(minutes)) if minutes != 0.0 && minutes.is_finite() => {
            TimeDelta::try_milliseconds((minutes * 60_000.0).round() as i64)
                .and_then(|offset| start.clone().checked_sub_signed(offset))
                .map(|t| t.format(TIME_FORMAT).to_string())
        }
        _ => None,
    };

    EventView {
        image_url: image::event_image_url(images, event.image.as_ref()),
        image_alt: name.clone().unwrap_or_else(|| "Event".to_string()),
        format_label: non_empty(event.format.as_ref().map(|f| f.replace('-', " "))),
        headline: non_empty(event.headline.as_ref().and_then(|h| h.name.clone())),
        event_date: starts_at.as_ref().map(|dt| dt.format(DATE_FORMAT).to_string()),
        event_time: starts_at.as_ref().map(|dt| dt.format(TIME_FORMAT).to_string()),
        doors_open,
        venue: non_empty(event.venue.as_ref().and_then(|v| v.name.clone())),
        details_html: (!event.details.is_empty()).then(|| portable_text::to_html(&event.details)),
        tickets: non_empty(event.tickets.clone()),
        name,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
