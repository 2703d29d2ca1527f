use askama::Template;

use crate::page::EventView;

#[derive(Template)]
#[template(path = "event.html")]
pub struct EventTemplate {
    pub event: EventView,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub slug: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}
