//! End-to-end flows against a live Postgres. Set TEST_DATABASE_URL (or DATABASE_URL) to run them;
//! without it every test returns early.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{json_request, send, settings, MemoryStore, Outbox, CDN};
use serde_json::{json, Value};
use social_api::{app, ensure_database_exists, ensure_tables, AppState, TokenKeys};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const PASSWORD: &str = "Secret123";
const BOUNDARY: &str = "social-test-boundary";

static SETUP: Mutex<()> = Mutex::new(());

struct Harness {
    app: Router,
    pool: PgPool,
    outbox: Arc<Outbox>,
    store: Arc<MemoryStore>,
}

struct Account {
    id: String,
    email: String,
    token: String,
}

async fn harness() -> Option<Harness> {
    let url = match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            return None;
        }
    };
    let pool = {
        // Concurrent CREATE DATABASE / CREATE TABLE IF NOT EXISTS can still collide.
        let _setup = SETUP.lock().unwrap_or_else(|e| e.into_inner());
        ensure_database_exists(&url).await.expect("database");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("connect");
        ensure_tables(&pool).await.expect("schema");
        pool
    };

    let mut settings = settings();
    settings.database_url = url;
    let outbox = Arc::new(Outbox::default());
    let store = Arc::new(MemoryStore::default());
    let state = AppState {
        pool: pool.clone(),
        tokens: Arc::new(TokenKeys::from_settings(&settings)),
        settings: Arc::new(settings),
        storage: store.clone(),
        mailer: outbox.clone(),
    };
    Some(Harness {
        app: app(state),
        pool,
        outbox,
        store,
    })
}

impl Harness {
    async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        send(self.app.clone(), req).await
    }

    async fn register(&self) -> (String, String) {
        let username = format!("u{}", &Uuid::new_v4().simple().to_string()[..12]);
        let email = format!("{}@example.com", username);
        let (status, body) = self
            .call(json_request(
                "POST",
                "/auth/register",
                json!({
                    "username": username,
                    "email": email,
                    "password": PASSWORD,
                    "confirmationPassword": PASSWORD,
                    "phoneNumber": "01012345678"
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (body["data"]["id"].as_str().unwrap().to_string(), email)
    }

    async fn confirm(&self, email: &str, code: &str) -> (StatusCode, Value) {
        self.call(json_request("PATCH", "/auth/confirm-email", json!({ "email": email, "OTP": code })))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(json_request("POST", "/auth/login", json!({ "email": email, "password": password })))
            .await
    }

    /// Registered, confirmed and logged-in user.
    async fn account(&self) -> Account {
        let (id, email) = self.register().await;
        let code = self.outbox.code_for(&email, 1).await;
        assert_eq!(self.confirm(&email, &code).await.0, StatusCode::OK);
        let (status, body) = self.login(&email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        Account {
            id,
            email,
            token: body["data"]["accessToken"].as_str().unwrap().to_string(),
        }
    }

    async fn create_post(&self, who: &Account, content: &str, images: usize) -> (StatusCode, Value) {
        self.call(multipart("POST", "/post", &who.token, Some(content), images)).await
    }

    async fn post_action(&self, method: &str, uri: String, who: &Account) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", who.token))
            .body(Body::empty())
            .unwrap();
        self.call(req).await
    }
}

fn multipart(method: &str, uri: &str, token: &str, content: Option<&str>, images: usize) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some(text) = content {
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\n{t}\r\n",
                b = BOUNDARY,
                t = text
            )
            .as_bytes(),
        );
    }
    for i in 0..images {
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"attachment\"; filename=\"pic{i}.png\"\r\nContent-Type: image/png\r\n\r\n",
                b = BOUNDARY,
                i = i
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0x89, b'P', b'N', b'G', b'\r', b'\n']);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn post_id(body: &Value) -> String {
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_confirm_and_login() {
    let Some(h) = harness().await else { return };
    let (_, email) = h.register().await;

    let (status, body) = h.login(&email, PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please confirm your email first");

    let code = h.outbox.code_for(&email, 1).await;
    let wrong = if code == "000000" { "111111" } else { "000000" };
    assert_eq!(h.confirm(&email, wrong).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(h.confirm(&email, &code).await.0, StatusCode::OK);
    assert_eq!(h.confirm(&email, &code).await.0, StatusCode::NOT_FOUND);

    let (status, body) = h.login(&email, PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
    assert_eq!(h.login(&email, "Wrong1234").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_confirmation_code_can_be_reissued() {
    let Some(h) = harness().await else { return };
    let (_, email) = h.register().await;
    let first = h.outbox.code_for(&email, 1).await;
    sqlx::query("UPDATE users SET otp_expires_at = NOW() - INTERVAL '1 minute' WHERE email = $1")
        .bind(&email)
        .execute(&h.pool)
        .await
        .unwrap();

    let (status, body) = h.confirm(&email, &first).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Code expired, request a new one");

    let (status, _) = h
        .call(json_request("PATCH", "/auth/resend-confirmation", json!({ "email": email })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = h.outbox.code_for(&email, 2).await;
    assert_eq!(h.confirm(&email, &second).await.0, StatusCode::OK);
    assert_eq!(h.login(&email, PASSWORD).await.0, StatusCode::OK);

    let (status, _) = h
        .call(json_request("PATCH", "/auth/resend-confirmation", json!({ "email": email })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn password_reset_needs_a_validated_code() {
    let Some(h) = harness().await else { return };
    let who = h.account().await;
    let (status, _) = h
        .call(json_request("PATCH", "/auth/forget-password", json!({ "email": who.email })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let code = h.outbox.code_for(&who.email, 2).await;

    let reset = json!({
        "email": who.email,
        "OTP": code,
        "password": "Newpass123",
        "confirmationPassword": "Newpass123"
    });
    let (status, body) = h.call(json_request("PATCH", "/auth/reset-password", reset.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validate the reset code first");

    let (status, _) = h
        .call(json_request("PATCH", "/auth/validate-reset-code", json!({ "email": who.email, "OTP": code })))
        .await;
    assert_eq!(status, StatusCode::OK);

    // iat has second precision; let the old token fall strictly before the change.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    assert_eq!(h.call(json_request("PATCH", "/auth/reset-password", reset)).await.0, StatusCode::OK);
    assert_eq!(h.login(&who.email, PASSWORD).await.0, StatusCode::NOT_FOUND);
    assert_eq!(h.login(&who.email, "Newpass123").await.0, StatusCode::OK);

    let (status, _) = h.post_action("GET", "/user/profile".into(), &who).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_post_stores_uploaded_attachments() {
    let Some(h) = harness().await else { return };
    let who = h.account().await;

    let (status, body) = h.create_post(&who, "two pictures", 2).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let attachments = body["data"]["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 2);
    let folder = format!("{}/social/user/{}/posts/", CDN, who.id);
    for a in attachments {
        assert!(a["secure_url"].as_str().unwrap().starts_with(&folder));
    }
    assert_eq!(body["data"]["createdBy"], who.id.as_str());

    let (status, _) = h.create_post(&who, "too many", 3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h.post_action("GET", format!("/post/{}", post_id(&body)), &who).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["post"]["createdBy"]["id"], who.id.as_str());
}

#[tokio::test]
async fn updating_attachments_replaces_stored_objects() {
    let Some(h) = harness().await else { return };
    let who = h.account().await;
    let (_, body) = h.create_post(&who, "before", 1).await;
    let id = post_id(&body);
    let old_key = body["data"]["attachments"][0]["public_id"].as_str().unwrap().to_string();

    let (status, body) = h
        .call(multipart("PATCH", &format!("/post/{}", id), &who.token, Some("after"), 1))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["content"], "after");
    assert_eq!(body["data"]["updatedBy"], who.id.as_str());
    assert_ne!(body["data"]["attachments"][0]["public_id"], old_key.as_str());

    for _ in 0..100 {
        if !h.store.keys.lock().unwrap().contains(&old_key) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("replaced attachment {} was not deleted", old_key);
}

#[tokio::test]
async fn liking_twice_conflicts() {
    let Some(h) = harness().await else { return };
    let author = h.account().await;
    let fan = h.account().await;
    let (_, body) = h.create_post(&author, "like me", 0).await;
    let like = format!("/post/{}/like", post_id(&body));

    let (status, body) = h.post_action("PATCH", like.clone(), &fan).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likes"], json!([fan.id]));

    let (status, body) = h.post_action("PATCH", like, &fan).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Post already liked");
}

#[tokio::test]
async fn frozen_and_missing_posts_are_not_found() {
    let Some(h) = harness().await else { return };
    let author = h.account().await;
    let (_, body) = h.create_post(&author, "soon frozen", 0).await;
    let id = post_id(&body);

    let (status, body) = h.post_action("DELETE", format!("/post/{}", id), &author).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deletedBy"], author.id.as_str());

    for (method, uri) in [
        ("PATCH", format!("/post/{}/like", id)),
        ("PATCH", format!("/post/{}/unlike", id)),
        ("DELETE", format!("/post/{}", id)),
        ("GET", format!("/post/{}", id)),
    ] {
        let (status, _) = h.post_action(method, uri.clone(), &author).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
    }
    let (status, _) = h
        .call(multipart("PATCH", &format!("/post/{}", id), &author.token, Some("edit"), 0))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = Uuid::new_v4();
    let (status, _) = h.post_action("PATCH", format!("/post/{}/like", missing), &author).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.post_action("PATCH", "/post/not-a-uuid/like".into(), &author).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn only_the_freezer_can_unfreeze() {
    let Some(h) = harness().await else { return };
    let author = h.account().await;
    let other = h.account().await;
    let (_, body) = h.create_post(&author, "mine", 0).await;
    let id = post_id(&body);

    let (status, _) = h.post_action("DELETE", format!("/post/{}", id), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.post_action("DELETE", format!("/post/{}", id), &author).await.0, StatusCode::OK);

    let unfreeze = format!("/post/{}/unfreeze", id);
    let (status, _) = h.post_action("PATCH", unfreeze.clone(), &other).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = h.post_action("PATCH", unfreeze, &author).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("isDeleted").is_none());
    assert_eq!(h.post_action("GET", format!("/post/{}", id), &other).await.0, StatusCode::OK);
}

#[tokio::test]
async fn empty_update_only_stamps_the_editor() {
    let Some(h) = harness().await else { return };
    let who = h.account().await;
    let (_, body) = h.create_post(&who, "unchanged", 0).await;
    let id = post_id(&body);

    let (status, body) = h.call(multipart("PATCH", &format!("/post/{}", id), &who.token, None, 0)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["content"], "unchanged");
    assert_eq!(body["data"]["updatedBy"], who.id.as_str());

    let (status, _) = h
        .call(multipart("PATCH", &format!("/post/{}", id), &who.token, Some(" "), 0))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
