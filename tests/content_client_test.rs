use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::net::TcpListener;
use tower::ServiceExt;

use event_page::build_renderer;
use event_page::config::{Config, ContentConfig, DisplayZone};
use event_page::content::client::{FetchOptions, MAX_GET_URL_LEN};
use event_page::content::{ContentClient, ContentSource, LiveFetcher, QueryParams};
use event_page::error::{ContentError, PageError};
use event_page::page::EVENT_QUERY;
use event_page::router::app_router;
use event_page::state::AppState;

/// Minimal stand-in for the query endpoint: knows one event, `jazz-night`.
/// Reports `ms` 3 for GET and 4 for POST so tests can tell the transports apart.
fn answer(
    query: Option<&str>,
    slug: Option<Value>,
    options: &HashMap<String, String>,
    ms: u64,
) -> (StatusCode, Json<Value>) {
    let Some(query) = query else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "description": "missing query", "type": "queryParseError" } })),
        );
    };
    if !query.contains("$slug") {
        return (StatusCode::OK, Json(json!({ "result": null, "ms": ms })));
    }
    let Some(slug) = slug else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": { "description": "param $slug referenced, but not provided", "type": "queryParseError" }
            })),
        );
    };

    let result = if slug == "jazz-night" {
        json!({
            "_id": "evt-jazz",
            "_type": "event",
            "slug": { "current": "jazz-night" },
            "name": "Jazz Night",
            "date": "2025-03-14T19:30:00Z",
            "format": "in-person",
            "doorsOpen": 30,
            "perspective": options.get("perspective"),
            "headline": { "_id": "a1", "name": "The Quartet" },
            "venue": { "_id": "v1", "name": "Royal Room" }
        })
    } else {
        Value::Null
    };
    (
        StatusCode::OK,
        Json(json!({ "result": result, "ms": ms, "syncTags": ["s1:jazz"] })),
    )
}

/// GET carries the query and `$`-prefixed JSON-encoded params in the URL.
async fn query_endpoint(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let slug = params
        .get("$slug")
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok());
    answer(params.get("query").map(String::as_str), slug, &params, 3)
}

/// POST carries `{query, params}` in the body and only options in the URL.
async fn query_post_endpoint(
    Query(options): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if options.contains_key("query") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "description": "query sent twice", "type": "queryParseError" } })),
        );
    }
    let slug = body.get("params").and_then(|p| p.get("slug")).cloned();
    answer(body.get("query").and_then(Value::as_str), slug, &options, 4)
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route(
            "/vX/data/query/production",
            get(query_endpoint).post(query_post_endpoint),
        )
        .route(
            "/v2024-11-01/data/query/production",
            get(query_endpoint).post(query_post_endpoint),
        )
        .route(
            "/v2024-11-01/data/query/private",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "Unauthorized", "message": "Session not found" })),
                )
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn content_config(host: String) -> ContentConfig {
    ContentConfig {
        api_host: Some(host),
        ..Default::default()
    }
}

#[tokio::test]
async fn base_client_returns_result_and_sync_tags() {
    let client = ContentClient::new(content_config(spawn_stub().await)).unwrap();
    let params = QueryParams::new().with("slug", "jazz-night");
    let result = client.fetch(EVENT_QUERY, &params).await.unwrap();

    assert_eq!(result.data["name"], "Jazz Night");
    assert_eq!(result.tags, vec!["s1:jazz".to_string()]);
}

#[tokio::test]
async fn live_fetch_reads_published_and_prefixes_tags() {
    let client = ContentClient::new(content_config(spawn_stub().await)).unwrap();
    let live = LiveFetcher::new(&client);
    let params = QueryParams::new().with("slug", "jazz-night");
    let result = live.fetch(EVENT_QUERY, &params).await.unwrap();

    assert_eq!(result.data["perspective"], "published");
    assert_eq!(result.tags, vec!["sanity:s1:jazz".to_string()]);
}

#[tokio::test]
async fn oversized_query_is_posted_and_decoded() {
    let client = ContentClient::new(content_config(spawn_stub().await)).unwrap();
    let padding = "x".repeat(MAX_GET_URL_LEN);
    let query = format!("*[slug.current == $slug && name != \"{padding}\"][0]");
    let params = QueryParams::new().with("slug", "jazz-night");
    let options = FetchOptions {
        perspective: Some("published".to_string()),
        tag: Some("event-page.test".to_string()),
        ..Default::default()
    };

    let response = client.fetch_raw(&query, &params, &options).await.unwrap();
    assert_eq!(response.ms, Some(4));
    assert_eq!(response.result["name"], "Jazz Night");
    assert_eq!(response.result["perspective"], "published");
    assert_eq!(response.sync_tags, vec!["s1:jazz".to_string()]);

    let short = client.fetch_raw(EVENT_QUERY, &params, &options).await.unwrap();
    assert_eq!(short.ms, Some(3));
}

#[tokio::test]
async fn unmatched_slug_is_absent() {
    let client = ContentClient::new(content_config(spawn_stub().await)).unwrap();
    let params = QueryParams::new().with("slug", "polka-night");
    assert!(client.fetch(EVENT_QUERY, &params).await.unwrap().is_absent());
}

#[tokio::test]
async fn query_errors_surface_description() {
    let client = ContentClient::new(content_config(spawn_stub().await)).unwrap();
    let err = client.fetch(EVENT_QUERY, &QueryParams::new()).await.unwrap_err();
    match err {
        ContentError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "param $slug referenced, but not provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn auth_failures_surface_message() {
    let client = ContentClient::new(ContentConfig {
        dataset: "private".to_string(),
        ..content_config(spawn_stub().await)
    })
    .unwrap();
    let err = client.fetch("*[0]", &QueryParams::new()).await.unwrap_err();
    assert!(matches!(err, ContentError::Api { status: 401, ref message } if message == "Session not found"));
}

#[tokio::test]
async fn unreachable_backend_is_http_error() {
    let client = ContentClient::new(content_config("http://127.0.0.1:9".to_string())).unwrap();
    let err = client.fetch("*[0]", &QueryParams::new()).await.unwrap_err();
    assert!(matches!(err, ContentError::Http(_)));
}

#[tokio::test]
async fn renderer_end_to_end() {
    let mut config = Config::default();
    config.content = content_config(spawn_stub().await);
    config.display.zone = DisplayZone::Utc;

    let renderer = build_renderer(&config).unwrap();
    let page = renderer.render("jazz-night").await.unwrap();
    assert_eq!(page.view.format_label.as_deref(), Some("in person"));
    assert_eq!(page.view.event_time.as_deref(), Some("7:30:00 PM"));
    assert_eq!(page.view.doors_open.as_deref(), Some("7:00:00 PM"));
    assert_eq!(page.view.headline.as_deref(), Some("The Quartet"));
    assert_eq!(page.view.venue.as_deref(), Some("Royal Room"));

    assert!(matches!(
        renderer.render("polka-night").await,
        Err(PageError::NotFound(_))
    ));

    let response = app_router(AppState::new(renderer))
        .oneshot(
            axum::http::Request::builder()
                .uri("/events/jazz-night")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-cache-tags").unwrap(), "sanity:s1:jazz");
}
