use async_trait::async_trait;
use reqwest::{Client, Request, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::{ContentSource, FetchResult, QueryParams};
use crate::config::ContentConfig;
use crate::error::{ContentError, Result};

/// Queries whose GET URL would exceed this are sent as a POST body instead.
pub const MAX_GET_URL_LEN: usize = 11264;

/// Per-request knobs of the query endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    pub perspective: Option<String>,
    pub tag: Option<String>,
    pub return_query: Option<bool>,
    pub cache_mode: Option<String>,
}

impl FetchOptions {
    fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(perspective) = &self.perspective {
            pairs.push(("perspective".to_string(), perspective.clone()));
        }
        if let Some(tag) = &self.tag {
            pairs.push(("tag".to_string(), tag.clone()));
        }
        if let Some(return_query) = self.return_query {
            pairs.push(("returnQuery".to_string(), return_query.to_string()));
        }
        if let Some(cache_mode) = &self.cache_mode {
            pairs.push(("cacheMode".to_string(), cache_mode.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub result: Value,
    pub ms: Option<u64>,
    #[serde(rename = "syncTags", default)]
    pub sync_tags: Vec<String>,
}

/// HTTP client for one project/dataset. Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: Client,
    config: Arc<ContentConfig>,
}

impl ContentClient {
    pub fn new(config: ContentConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .user_agent(concat!("event-page/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// A client for the same dataset pinned to another API version.
    pub fn with_api_version(&self, version: &str) -> Self {
        let mut config = (*self.config).clone();
        config.api_version = version.trim_start_matches('v').to_string();
        Self {
            http: self.http.clone(),
            config: Arc::new(config),
        }
    }

    pub fn query_url(&self) -> String {
        let base = match &self.config.api_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => {
                let domain = if self.config.use_cdn { "apicdn.sanity.io" } else { "api.sanity.io" };
                format!("https://{}.{}", self.config.project_id, domain)
            }
        };
        format!(
            "{}/v{}/data/query/{}",
            base,
            self.config.api_version.trim_start_matches('v'),
            self.config.dataset
        )
    }

    pub async fn fetch_raw(
        &self,
        query: &str,
        params: &QueryParams,
        options: &FetchOptions,
    ) -> Result<QueryResponse> {
        let request = self.build_request(query, params, options)?;
        debug!(method = %request.method(), url = %request.url(), "querying content lake");

        let started = Instant::now();
        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("request failed").to_string()
            });
            warn!(status = status.as_u16(), %message, "content query rejected");
            return Err(ContentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: QueryResponse = serde_json::from_str(&body)?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            server_ms = ?parsed.ms,
            "content query finished"
        );
        Ok(parsed)
    }

    fn build_request(
        &self,
        query: &str,
        params: &QueryParams,
        options: &FetchOptions,
    ) -> Result<Request> {
        let url = self.query_url();

        let mut pairs = vec![("query".to_string(), query.to_string())];
        for (name, value) in params.iter() {
            pairs.push((format!("${name}"), serde_json::to_string(value)?));
        }
        pairs.extend(options.pairs());

        let get = self.authorize(self.http.get(&url).query(&pairs)).build()?;
        if get.url().as_str().len() <= MAX_GET_URL_LEN {
            return Ok(get);
        }

        let body = json!({ "query": query, "params": params });
        Ok(self
            .authorize(self.http.post(&url).query(&options.pairs()).json(&body))
            .build()?)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    async fn fetch(&self, query: &str, params: &QueryParams) -> Result<FetchResult> {
        let response = self.fetch_raw(query, params, &FetchOptions::default()).await?;
        Ok(FetchResult {
            data: response.result,
            tags: response.sync_tags,
        })
    }
}

/// Pulls a human-readable message out of an error body. The API uses both
/// `{"error": {"description": ..}}` and `{"error": "..", "message": ".."}`.
fn api_error_message(body: &str) -> Option<String> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            let trimmed = body.trim();
            return (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    };

    let error = value.get("error");
    error
        .and_then(|e| e.get("description"))
        .or_else(|| value.get("message"))
        .or(error)
        .and_then(Value::as_str)
        .map(str::to_string)
}
