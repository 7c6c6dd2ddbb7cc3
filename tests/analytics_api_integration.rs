//! Integration tests for the analytics endpoints
//!
//! Rows are written through the storage layer (or the tracking endpoints) and
//! read back through `GET /api/analytics/stats`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use folio::api::{create_api_router, AppState};
use folio::auth::AuthService;
use folio::config::{AnalyticsConfig, AuthConfig, AuthMode, BlogConfig, FrontendConfig};
use folio::models::{EventType, NewBlogEvent, NewVisitor};
use folio::storage::{SqliteStorage, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const DAY: i64 = 24 * 60 * 60;

/// Helper to create test storage. One connection keeps a single in-memory DB.
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn create_app(storage: Option<Arc<dyn Storage>>, analytics: AnalyticsConfig) -> Router {
    let auth = AuthService::new(AuthConfig {
        mode: AuthMode::None,
        admin: None,
    })
    .unwrap();

    let state = Arc::new(AppState {
        storage,
        auth: Arc::new(auth),
        contact: None,
        analytics,
        blog: BlogConfig {
            default_author: "Admin".to_string(),
        },
    });

    create_api_router(
        state,
        &FrontendConfig {
            static_dir: None,
            cors_allowed_origins: vec![],
        },
    )
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Value, headers: &[(&str, &str)]) -> StatusCode {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = app
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    response.status()
}

async fn visit(storage: &Arc<dyn Storage>, created_at: i64, country: Option<&str>) {
    storage
        .record_visitor(&NewVisitor {
            created_at,
            country: country.map(str::to_string),
            city: None,
            ip_address: "203.0.113.7".to_string(),
        })
        .await
        .unwrap();
}

async fn blog_event(storage: &Arc<dyn Storage>, slug: &str, kind: EventType, created_at: i64) {
    storage
        .record_blog_event(&NewBlogEvent {
            blog_slug: slug.to_string(),
            blog_title: format!("Post {slug}"),
            event_type: kind,
            created_at,
        })
        .await
        .unwrap();
}

fn date_key(days_ago: i64) -> String {
    (Utc::now() - Duration::days(days_ago))
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
async fn test_stats_empty_database() {
    let storage = create_test_storage().await;
    let app = create_app(Some(storage), AnalyticsConfig::default());

    let (status, json) = get_json(app, "/api/analytics/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let stats = &json["stats"];
    assert_eq!(stats["totalVisitors"], 0);
    assert_eq!(stats["totalPageViews"], 0);
    assert_eq!(stats["topBlogPosts"].as_array().unwrap().len(), 0);
    assert_eq!(stats["visitorsByCountry"].as_array().unwrap().len(), 0);
    // Default window is 30 days
    assert_eq!(stats["dailyStats"].as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn test_stats_seven_day_scenario() {
    let storage = create_test_storage().await;
    let now = Utc::now().timestamp();

    visit(&storage, now - DAY, Some("India")).await;
    visit(&storage, now - DAY, Some("India")).await;
    visit(&storage, now - DAY, Some("USA")).await;
    blog_event(&storage, "a", EventType::View, now - 2 * DAY).await;
    blog_event(&storage, "a", EventType::View, now - 2 * DAY).await;

    let app = create_app(Some(storage), AnalyticsConfig::default());
    let (status, json) = get_json(app, "/api/analytics/stats?days=7").await;
    assert_eq!(status, StatusCode::OK);

    let stats = &json["stats"];
    assert_eq!(stats["totalVisitors"], 3);
    assert_eq!(stats["totalBlogViews"], 2);
    assert_eq!(
        stats["visitorsByCountry"],
        json!([
            { "country": "India", "count": 2 },
            { "country": "USA", "count": 1 }
        ])
    );

    let top = stats["topBlogPosts"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["slug"], "a");
    assert_eq!(top[0]["views"], 2);

    let daily = stats["dailyStats"].as_array().unwrap();
    assert_eq!(daily.len(), 7);
    assert_eq!(daily[6]["date"], date_key(0));
    assert_eq!(daily[0]["date"], date_key(6));

    for bucket in daily {
        let date = bucket["date"].as_str().unwrap();
        let (visitors, blog_views) = if date == date_key(1) {
            (3, 0)
        } else if date == date_key(2) {
            (0, 2)
        } else {
            (0, 0)
        };
        assert_eq!(bucket["visitors"], visitors, "visitors on {date}");
        assert_eq!(bucket["pageViews"], visitors, "page views on {date}");
        assert_eq!(bucket["blogViews"], blog_views, "blog views on {date}");
    }
}

#[tokio::test]
async fn test_stats_days_parameter_controls_series_length() {
    let storage = create_test_storage().await;

    for (query, expected) in [("days=1", 1), ("days=14", 14), ("days=0", 1), ("days=abc", 30)] {
        let app = create_app(Some(Arc::clone(&storage)), AnalyticsConfig::default());
        let (status, json) = get_json(app, &format!("/api/analytics/stats?{query}")).await;
        assert_eq!(status, StatusCode::OK);

        let daily = json["stats"]["dailyStats"].as_array().unwrap();
        assert_eq!(daily.len(), expected, "for {query}");

        let dates: Vec<&str> = daily.iter().map(|b| b["date"].as_str().unwrap()).collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]), "ascending for {query}");
    }
}

#[tokio::test]
async fn test_stats_rows_older_than_window_are_excluded() {
    let storage = create_test_storage().await;
    let now = Utc::now().timestamp();

    visit(&storage, now - 10 * DAY, Some("Germany")).await;
    visit(&storage, now - DAY, Some("Germany")).await;
    blog_event(&storage, "old", EventType::View, now - 10 * DAY).await;

    let app = create_app(Some(storage), AnalyticsConfig::default());
    let (_, json) = get_json(app, "/api/analytics/stats?days=7").await;

    let stats = &json["stats"];
    assert_eq!(stats["totalVisitors"], 1);
    assert_eq!(stats["totalBlogViews"], 0);
    assert_eq!(stats["visitorsByCountry"][0]["count"], 1);
    assert_eq!(stats["topBlogPosts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_stats_counts_every_interaction_type() {
    let storage = create_test_storage().await;
    let now = Utc::now().timestamp();

    blog_event(&storage, "rust", EventType::View, now).await;
    blog_event(&storage, "rust", EventType::Read, now).await;
    blog_event(&storage, "rust", EventType::Click, now).await;
    blog_event(&storage, "rust", EventType::Click, now).await;
    blog_event(&storage, "go", EventType::View, now).await;
    blog_event(&storage, "go", EventType::View, now).await;

    let app = create_app(Some(storage), AnalyticsConfig::default());
    let (_, json) = get_json(app, "/api/analytics/stats").await;

    let stats = &json["stats"];
    assert_eq!(stats["totalBlogViews"], 3);
    assert_eq!(stats["totalBlogReads"], 1);
    assert_eq!(stats["totalLinkClicks"], 2);

    let top = stats["topBlogPosts"].as_array().unwrap();
    assert_eq!(top[0]["slug"], "go");
    assert_eq!(top[0]["views"], 2);
    assert_eq!(top[1]["slug"], "rust");
    assert_eq!(top[1]["reads"], 1);
    assert_eq!(top[1]["clicks"], 2);
}

#[tokio::test]
async fn test_stats_caps_top_lists() {
    let storage = create_test_storage().await;
    let now = Utc::now().timestamp();

    for i in 0..12 {
        visit(&storage, now, Some(&format!("Country {i}"))).await;
        blog_event(&storage, &format!("post-{i}"), EventType::View, now).await;
    }

    let app = create_app(Some(storage), AnalyticsConfig::default());
    let (_, json) = get_json(app, "/api/analytics/stats").await;

    let stats = &json["stats"];
    assert_eq!(stats["topBlogPosts"].as_array().unwrap().len(), 10);
    assert_eq!(stats["visitorsByCountry"].as_array().unwrap().len(), 10);
    assert_eq!(stats["totalVisitors"], 12);
}

#[tokio::test]
async fn test_stats_without_database() {
    let app = create_app(None, AnalyticsConfig::default());

    let (status, json) = get_json(app, "/api/analytics/stats").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Database connection failed");
}

#[tokio::test]
async fn test_record_visit_then_read_back() {
    let storage = create_test_storage().await;
    let app = create_app(Some(Arc::clone(&storage)), AnalyticsConfig::default());

    let status = post_json(
        app.clone(),
        "/api/analytics/visit",
        json!({ "country": "Norway", "city": "Oslo" }),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Country falls back to the edge header when the body has none
    let status = post_json(
        app.clone(),
        "/api/analytics/visit",
        json!({}),
        &[("cf-ipcountry", "SE")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, json) = get_json(app, "/api/analytics/stats?days=1").await;
    let stats = &json["stats"];
    assert_eq!(stats["totalVisitors"], 2);
    assert_eq!(stats["recentVisitors"].as_array().unwrap().len(), 2);

    let countries: Vec<&str> = stats["visitorsByCountry"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["country"].as_str().unwrap())
        .collect();
    assert!(countries.contains(&"Norway"));
    assert!(countries.contains(&"SE"));
}

#[tokio::test]
async fn test_record_visit_anonymizes_forwarded_ip() {
    let storage = create_test_storage().await;
    let analytics = AnalyticsConfig {
        ip_anonymization: true,
        trusted_proxy_mode: folio::config::TrustedProxyMode::Cloudflare,
        ..AnalyticsConfig::default()
    };
    let app = create_app(Some(Arc::clone(&storage)), analytics);

    let status = post_json(
        app,
        "/api/analytics/visit",
        json!({}),
        &[("cf-connecting-ip", "198.51.100.77")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let recent = storage.recent_visitors(5).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].ip_address, "198.51.100.0");
}

#[tokio::test]
async fn test_record_blog_event() {
    let storage = create_test_storage().await;
    let app = create_app(Some(Arc::clone(&storage)), AnalyticsConfig::default());

    let status = post_json(
        app.clone(),
        "/api/analytics/blog-event",
        json!({ "blogSlug": "hello", "blogTitle": "Hello", "eventType": "read" }),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let status = post_json(
        app.clone(),
        "/api/analytics/blog-event",
        json!({ "blogSlug": "hello", "blogTitle": "Hello", "eventType": "share" }),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = post_json(
        app,
        "/api/analytics/blog-event",
        json!({ "blogSlug": "  ", "eventType": "view" }),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let events = storage.blog_events_since(0, None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Read);
    assert_eq!(events[0].blog_slug, "hello");
}
