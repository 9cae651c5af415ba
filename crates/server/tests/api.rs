use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::AuthConfig;

async fn test_app() -> Router {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let engine = Engine::builder().database(db).build().await.unwrap();
    server::app(
        engine,
        &AuthConfig {
            signing_key: "test-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
        },
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/auth",
            None,
            json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn first_login_registers_with_starting_coins() {
    let app = test_app().await;
    let token = login(&app, "alice", "pw").await;

    let (status, body) = send(&app, get("/api/info", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "coins": 1000,
            "inventory": [],
            "coinHistory": {"received": [], "sent": []}
        })
    );
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app().await;
    login(&app, "alice", "pw").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth",
            None,
            json!({"username": "alice", "password": "nope"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["errors"].is_string());
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/api/info")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/info", "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn buy_then_info_shows_inventory() {
    let app = test_app().await;
    let token = login(&app, "alice", "pw").await;

    let (status, _) = send(&app, get("/api/buy/t-shirt", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, get("/api/buy/cup?quantity=2", &token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/info", &token)).await;
    assert_eq!(body["coins"], 1000 - 80 - 40);
    assert_eq!(
        body["inventory"],
        json!([{"type": "cup", "quantity": 2}, {"type": "t-shirt", "quantity": 1}])
    );
}

#[tokio::test]
async fn buying_unknown_item_is_bad_request() {
    let app = test_app().await;
    let token = login(&app, "alice", "pw").await;

    let (status, body) = send(&app, get("/api/buy/unknown-item", &token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_str().unwrap().contains("unknown-item"));
}

#[tokio::test]
async fn send_coin_updates_both_histories() {
    let app = test_app().await;
    let alice = login(&app, "alice", "pw").await;
    let bob = login(&app, "bob", "pw").await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/sendCoin",
            Some(&alice),
            json!({"toUser": "bob", "amount": 300}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, alice_info) = send(&app, get("/api/info", &alice)).await;
    assert_eq!(alice_info["coins"], 700);
    assert_eq!(
        alice_info["coinHistory"]["sent"],
        json!([{"toUser": "bob", "amount": 300}])
    );

    let (_, bob_info) = send(&app, get("/api/info", &bob)).await;
    assert_eq!(bob_info["coins"], 1300);
    assert_eq!(
        bob_info["coinHistory"]["received"],
        json!([{"fromUser": "alice", "amount": 300}])
    );
}

#[tokio::test]
async fn send_coin_rejections_are_bad_requests() {
    let app = test_app().await;
    let alice = login(&app, "alice", "pw").await;
    login(&app, "bob", "pw").await;

    for body in [
        json!({"toUser": "bob", "amount": 0}),
        json!({"toUser": "bob", "amount": 5000}),
        json!({"toUser": "alice", "amount": 10}),
        json!({"toUser": "nobody", "amount": 10}),
        json!({"amount": 10}),
    ] {
        let (status, response) =
            send(&app, post_json("/api/sendCoin", Some(&alice), body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(response["errors"].is_string(), "{body}");
    }

    let (_, info) = send(&app, get("/api/info", &alice)).await;
    assert_eq!(info["coins"], 1000);
}

#[tokio::test]
async fn send_coin_reports_bad_amount_before_unknown_receiver() {
    let app = test_app().await;
    let alice = login(&app, "alice", "pw").await;

    let (status, response) = send(
        &app,
        post_json(
            "/api/sendCoin",
            Some(&alice),
            json!({"toUser": "nobody", "amount": 0}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = response["errors"].as_str().unwrap();
    assert!(message.starts_with("Invalid amount"), "{message}");
}
