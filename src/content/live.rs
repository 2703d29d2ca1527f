use async_trait::async_trait;

use super::client::{ContentClient, FetchOptions};
use super::{ContentSource, FetchResult, QueryParams};
use crate::error::Result;

/// API version of the live read path; `X` is the experimental channel that
/// returns sync tags for every query.
pub const LIVE_API_VERSION: &str = "X";
pub const LIVE_PERSPECTIVE: &str = "published";
pub const REQUEST_TAG: &str = "event-page.fetch";
pub const TAG_PREFIX: &str = "sanity:";

/// Read path used by page renders: published documents only, tagged
/// requests, and cache tags namespaced for the HTTP layer.
#[derive(Debug, Clone)]
pub struct LiveFetcher {
    client: ContentClient,
}

impl LiveFetcher {
    pub fn new(base: &ContentClient) -> Self {
        Self {
            client: base.with_api_version(LIVE_API_VERSION),
        }
    }

    pub fn client(&self) -> &ContentClient {
        &self.client
    }

    pub fn options(&self) -> FetchOptions {
        FetchOptions {
            perspective: Some(LIVE_PERSPECTIVE.to_string()),
            tag: Some(REQUEST_TAG.to_string()),
            return_query: Some(false),
            // Only the CDN serves stale responses.
            cache_mode: self.client.config().use_cdn.then(|| "noStale".to_string()),
        }
    }
}

#[async_trait]
impl ContentSource for LiveFetcher {
    async fn fetch(&self, query: &str, params: &QueryParams) -> Result<FetchResult> {
        let response = self.client.fetch_raw(query, params, &self.options()).await?;
        Ok(FetchResult {
            data: response.result,
            tags: response
                .sync_tags
                .into_iter()
                .map(|tag| format!("{TAG_PREFIX}{tag}"))
                .collect(),
        })
    }
}
