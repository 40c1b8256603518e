mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{bookmark, post_row, site, site_with, FakeNotion};
use notion2blog::{router, BearerToken, BlockId, SiteConfig};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "let-me-in";

fn blog() -> Arc<FakeNotion> {
    FakeNotion::with_rows(vec![
        post_row(1, "intro-to-rust", &["rust"], true, "2024-01-15"),
        post_row(2, "css-grid", &["web"], true, "2024-03-01"),
    ])
}

fn guarded_app(fake: &Arc<FakeNotion>) -> Router {
    let token = BearerToken::new(TOKEN.to_string()).unwrap();
    let config = SiteConfig {
        revalidation_token: Some(token.clone()),
        cache_warm_token: Some(token),
        ..SiteConfig::default()
    };
    router(site_with(fake, config))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(router(site(&blog())), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_revalidate_describes_actions() {
    let (status, body) = send(router(site(&blog())), get("/api/revalidate")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["actions"],
        json!(["posts", "post", "tag", "search", "static", "all"])
    );
}

#[tokio::test]
async fn test_revalidate_requires_token_when_configured() {
    let fake = blog();
    let app = guarded_app(&fake);

    let (status, body) = send(
        app.clone(),
        post("/api/revalidate", json!({ "action": "posts" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(
        app.clone(),
        post("/api/revalidate", json!({ "action": "posts" }), Some("nope")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        app,
        post("/api/revalidate", json!({ "action": "posts" }), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revalidated"], true);
    assert_eq!(body["action"], "posts");
    assert_eq!(body["tags"], json!(["posts", "content"]));
    assert_eq!(body["paths"], json!(["/", "/post"]));
}

fn post_raw(uri: &str, body: &'static str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_revalidate_checks_token_before_body() {
    let app = guarded_app(&blog());

    let (status, body) = send(app.clone(), post_raw("/api/revalidate", "{not json", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = send(app.clone(), post("/api/revalidate", json!({}), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = send(
        app.clone(),
        post_raw("/api/revalidate", "{not json", Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = send(app, post("/api/revalidate", json!({}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_revalidate_rejects_bad_requests() {
    let app = router(site(&blog()));

    let (status, body) = send(
        app.clone(),
        post("/api/revalidate", json!({ "action": "post" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = send(
        app.clone(),
        post("/api/revalidate", json!({ "action": "tag", "tag": " " }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app,
        post("/api/revalidate", json!({ "action": "everything" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("everything"));
}

#[tokio::test]
async fn test_revalidate_expires_cached_content() {
    let fake = blog();
    let state = site(&fake);
    state.pages.content().post_by_path("css-grid").await.unwrap();
    assert_eq!(fake.query_calls.load(Ordering::SeqCst), 1);

    let (status, body) = send(
        router(state.clone()),
        post(
            "/api/revalidate",
            json!({ "action": "post", "path": "css-grid" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paths"], json!(["/post/css-grid", "/"]));
    assert_eq!(body["entries_removed"], 1);

    state.pages.content().post_by_path("css-grid").await.unwrap();
    assert_eq!(fake.query_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_block_lookup() {
    let fake = blog();
    let root = BlockId::new_v4();
    let target = bookmark("https://ok.example/linked");
    let id = target.id().to_dashed();
    fake.set_children(&root, vec![target]);
    let app = router(site(&fake));

    let (status, _) = send(app.clone(), get("/api/notion/block")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app.clone(), get("/api/notion/block?id=not-a-block")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = BlockId::new_v4().to_dashed();
    let (status, body) = send(
        app.clone(),
        get(&format!("/api/notion/block?id={}", unknown)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = send(app.clone(), get(&format!("/api/notion/block?id={}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["block"]["type"], "bookmark");
    assert_eq!(
        body["block"]["metadata"]["title"],
        "Title of https://ok.example/linked"
    );

    fake.fail(true);
    let (status, body) = send(app, get(&format!("/api/notion/block?id={}", id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "server_error");
}

#[tokio::test]
async fn test_warm_cache() {
    let fake = blog();
    let app = guarded_app(&fake);

    let (status, body) = send(app.clone(), get("/api/warm-cache")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = send(app.clone(), post("/api/warm-cache", json!({}), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        app.clone(),
        post("/api/warm-cache", json!({}), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["all_posts"], 2);
    assert_eq!(body["result"]["all_tags"], 2);

    fake.fail(true);
    let app = guarded_app(&fake);
    let (status, body) = send(app, post("/api/warm-cache", json!({}), Some(TOKEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
}

#[tokio::test]
async fn test_stats_report_cache_and_posts() {
    let fake = blog();
    let state = site(&fake);
    state.pages.content().all_posts().await.unwrap();

    let (status, body) = send(router(state), get("/api/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"]["total_posts"], 2);
    assert!(body["cache"]["entries"].as_u64().unwrap() >= 2);
    assert!(body["cache"]["misses"].as_u64().unwrap() >= 1);
}
