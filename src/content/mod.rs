//! Access to the hosted content lake.
//!
//! `ContentClient` speaks the HTTP query API; `LiveFetcher` is the read path
//! pages use. Both implement [`ContentSource`], which is the seam the page
//! renderer depends on.

pub mod client;
pub mod live;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

pub use client::ContentClient;
pub use live::LiveFetcher;

/// Named GROQ parameters, referenced in queries as `$name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryParams(Map<String, Value>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.trim_start_matches('$').to_string(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Query result plus the cache tags the backend attached to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    /// `Value::Null` when nothing matched.
    pub data: Value,
    pub tags: Vec<String>,
}

impl FetchResult {
    pub fn is_absent(&self) -> bool {
        self.data.is_null()
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, query: &str, params: &QueryParams) -> Result<FetchResult>;
}
