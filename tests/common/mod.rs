//! Fakes and settings shared by the router tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use regex::Regex;
use social_api::config::SmtpSettings;
use social_api::mail::{Email, Mailer};
use social_api::models::Attachment;
use social_api::storage::{ObjectStore, UploadedFile};
use social_api::{AppError, Settings};
use serde_json::Value;
use std::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

pub const CDN: &str = "https://cdn.test";

#[derive(Default)]
pub struct MemoryStore {
    pub keys: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, folder: &str, file: UploadedFile) -> Result<Attachment, AppError> {
        let key = format!("{}/{}.{}", folder, Uuid::new_v4(), file.extension);
        self.keys.lock().unwrap().push(key.clone());
        Ok(Attachment {
            secure_url: format!("{}/{}", CDN, key),
            public_id: key,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), AppError> {
        self.keys.lock().unwrap().retain(|k| k != public_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct Outbox {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, email: Email) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

impl Outbox {
    /// Number of mails delivered to `to` so far.
    pub fn count_for(&self, to: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|e| e.to == to).count()
    }

    /// Waits for the `nth` (1-based) mail to `to` and returns the code in it.
    /// Mails go out on a spawned task, so they may land after the response.
    pub async fn code_for(&self, to: &str, nth: usize) -> String {
        let re = Regex::new(r"<h2[^>]*>(\d{6})</h2>").unwrap();
        for _ in 0..100 {
            let found = self
                .sent
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.to == to)
                .nth(nth - 1)
                .and_then(|e| re.captures(&e.html).map(|c| c[1].to_string()));
            if let Some(code) = found {
                return code;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("no mail #{} for {}", nth, to);
    }
}

pub fn settings() -> Settings {
    Settings {
        database_url: "postgres://localhost/social_test".into(),
        bind_addr: "127.0.0.1:0".into(),
        app_name: "social".into(),
        access_token_secret: "test-access".into(),
        refresh_token_secret: "test-refresh".into(),
        access_token_ttl: Duration::minutes(5),
        refresh_token_ttl: Duration::days(1),
        otp_ttl: Duration::minutes(10),
        s3_bucket: "bucket".into(),
        s3_public_url: Some(CDN.into()),
        smtp: SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            username: String::new(),
            password: String::new(),
            from: "Social <noreply@localhost>".into(),
        },
        max_upload_bytes: 1024 * 1024,
    }
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
