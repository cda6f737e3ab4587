//! API integration tests, driving the router in-process

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::watch;
use tower::ServiceExt;

use feedboard::{
    api,
    clock::FixedClock,
    config::{AccountConfig, AppConfig},
    repository::memory::MemoryStore,
    services::{auth::hash_password, events::DashboardEvent, Services},
    AppState,
};

const NOW: i64 = 1_704_110_400_000;

struct TestApp {
    router: Router,
    _shutdown: watch::Sender<bool>,
}

/// Start the sync engine and wait until its subscriptions are live
async fn spawn_app() -> TestApp {
    let mut config = AppConfig::default();
    config.auth.accounts = vec![AccountConfig {
        uid: "u1".into(),
        email: "ops@example.org".into(),
        display_name: None,
        password_hash: hash_password("s3cret").unwrap(),
    }];

    let clock = Arc::new(FixedClock::new(NOW));
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let services = Services::new(store, clock, &config);

    let mut events = services.events.subscribe();
    let (shutdown, shutdown_rx) = watch::channel(false);
    tokio::spawn(services.sync_engine(&config).run(shutdown_rx));
    loop {
        if let DashboardEvent::FilteredViewChanged { .. } = events.recv().await.unwrap() {
            break;
        }
    }

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    TestApp {
        router: api::router(state),
        _shutdown: shutdown,
    }
}

/// Anonymous request
async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    request(app, None, method, uri, body).await
}

/// Request carrying a session token
async fn send_auth(
    app: &TestApp,
    token: &str,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    request(app, Some(token), method, uri, body).await
}

async fn request(
    app: &TestApp,
    token: Option<&str>,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Sign in and return the bearer token
async fn login(app: &TestApp) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({"email": "ops@example.org", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Poll `uri` until `check` accepts the body
async fn eventually(app: &TestApp, uri: &str, check: impl Fn(&Value) -> bool) -> Value {
    for _ in 0..100 {
        let (status, body) = send(app, Method::GET, uri, None).await;
        if status == StatusCode::OK && check(&body) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition on {} never held", uri);
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({"email": "", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({"email": "ops@example.org", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let (status, body) = send_auth(&app, &token, Method::GET, "/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ops@example.org");
    assert_eq!(body["displayLabel"], "ops");

    let (status, _) = send(&app, Method::POST, "/api/v1/auth/logout", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send_auth(&app, &token, Method::POST, "/api/v1/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_auth(&app, &token, Method::GET, "/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mutations_require_sign_in() {
    let app = spawn_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sources",
        Some(json!({"name": "BBC News", "url": "https://bbc.example/rss"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_other_clients_stay_anonymous_after_sign_in() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let source = json!({"name": "Injected", "url": "https://injected.example/rss"});
    let (status, _) = send(&app, Method::POST, "/api/v1/sources", Some(source.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_auth(
        &app,
        "not-a-token",
        Method::POST,
        "/api/v1/sources",
        Some(source.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_auth(&app, &token, Method::POST, "/api/v1/sources", Some(source)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_source_lifecycle() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let (status, body) = send_auth(
        &app,
        &token,
        Method::POST,
        "/api/v1/sources",
        Some(json!({"name": "BBC News", "url": "https://bbc.example/rss", "priority": 2, "region": "EU"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "bbc_news");

    let (status, _) = send_auth(
        &app,
        &token,
        Method::POST,
        "/api/v1/sources",
        Some(json!({"name": "bbc  news!", "url": "https://other.example/rss"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_auth(
        &app,
        &token,
        Method::POST,
        "/api/v1/sources",
        Some(json!({"name": "Broken", "url": "not a url"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let view = eventually(&app, "/api/v1/sources", |body| {
        body["sources"].as_array().is_some_and(|s| s.len() == 1)
    })
    .await;
    assert_eq!(view["sources"][0]["name"], "BBC News");
    assert_eq!(view["sources"][0]["enabled"], true);
    assert_eq!(view["counts"]["label"], "1 source");

    let (status, source) = send(&app, Method::GET, "/api/v1/sources/bbc_news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(source["lastUpdated"], json!(NOW));

    // enabled can only change through the toggle endpoint
    let (status, _) = send_auth(
        &app,
        &token,
        Method::PUT,
        "/api/v1/sources/bbc_news",
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, source) = send(&app, Method::GET, "/api/v1/sources/bbc_news", None).await;
    assert_eq!(source["enabled"], true);

    let (status, _) = send_auth(
        &app,
        &token,
        Method::PUT,
        "/api/v1/sources/bbc_news/enabled",
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let stats = eventually(&app, "/api/v1/sources/stats", |body| body["disabled"] == 1).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["regions"], 1);

    let activity = eventually(&app, "/api/v1/activity", |body| {
        body["summary"]["total"] == 2
    })
    .await;
    assert_eq!(activity["summary"]["added"], 1);
    assert_eq!(activity["summary"]["disabled"], 1);
    assert_eq!(activity["scaleMax"], 5);
    assert_eq!(activity["recent"][0]["message"], "Source BBC News disabled");

    let logs = eventually(&app, "/api/v1/logs", |body| {
        body.as_array().is_some_and(|l| l.len() == 2)
    })
    .await;
    assert_eq!(logs[0]["user"], "ops@example.org");
    assert_eq!(logs[1]["type"], "success");

    let (status, _) = send_auth(&app, &token, Method::DELETE, "/api/v1/sources/bbc_news", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_auth(&app, &token, Method::DELETE, "/api/v1/sources/bbc_news", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let view = eventually(&app, "/api/v1/sources", |body| {
        body["sources"].as_array().is_some_and(|s| s.is_empty())
    })
    .await;
    assert_eq!(view["counts"]["emptyReason"], "no_sources");
}

#[tokio::test]
async fn test_filters() {
    let app = spawn_app().await;
    let token = login(&app).await;
    for (name, region) in [("Reuters", "US"), ("Le Monde", "EU")] {
        let (status, _) = send_auth(
            &app,
            &token,
            Method::POST,
            "/api/v1/sources",
            Some(json!({"name": name, "url": "https://news.example/rss", "region": region})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    eventually(&app, "/api/v1/sources", |body| body["counts"]["total"] == 2).await;

    let (status, view) = send(
        &app,
        Method::PUT,
        "/api/v1/filters",
        Some(json!({"regionFilter": "EU", "sortKey": "name"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["counts"]["label"], "Showing 1 of 2 sources");
    assert_eq!(view["sources"][0]["name"], "Le Monde");

    let (_, state) = send(&app, Method::GET, "/api/v1/filters", None).await;
    assert_eq!(state["regionOptions"], json!(["EU", "US"]));
    assert_eq!(state["criteria"]["regionFilter"], "EU");

    let (status, criteria) = send(&app, Method::POST, "/api/v1/filters/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(criteria["regionFilter"], "all");
    assert_eq!(criteria["sortKey"], "priority");
}

#[tokio::test]
async fn test_notifications_and_export() {
    let app = spawn_app().await;
    let token = login(&app).await;
    send_auth(
        &app,
        &token,
        Method::POST,
        "/api/v1/sources",
        Some(json!({"name": "CNN", "url": "https://cnn.example/rss"})),
    )
    .await;

    let feed = eventually(&app, "/api/v1/notifications", |body| body["unreadCount"] == 1).await;
    let id = feed["notifications"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(feed["notifications"][0]["read"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/notifications/{}/read", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unreadCount"], 0);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/notifications", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::DELETE, "/api/v1/notifications?confirm=true", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, feed) = send(&app, Method::GET, "/api/v1/notifications", None).await;
    assert_eq!(feed["notifications"], json!([]));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/logs/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"server-logs-{}.json\"", NOW)
    );
}

#[tokio::test]
async fn test_openapi_document() {
    let app = spawn_app().await;
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/sources"].is_object());
}
