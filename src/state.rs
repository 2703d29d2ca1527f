use std::sync::Arc;

use crate::page::EventPageRenderer;

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<EventPageRenderer>,
}

impl AppState {
    pub fn new(renderer: EventPageRenderer) -> Self {
        Self {
            renderer: Arc::new(renderer),
        }
    }
}
