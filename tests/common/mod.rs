#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use panchayath_connect::auth::TokenKeys;
use panchayath_connect::config::Config;
use panchayath_connect::media::LocalMediaHost;
use panchayath_connect::payments::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};
use panchayath_connect::state::{AppState, DbPool};
use panchayath_connect::{build_app, db};

pub const KEY_SECRET: &str = "test_key_secret";
const BOUNDARY: &str = "----panchayath-test-boundary";

/// Hands out sequential order ids without any network.
#[derive(Default)]
pub struct FakeGateway {
    issued: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("order_test_{}", n);
        Ok(GatewayOrder {
            id: id.clone(),
            amount: request.amount,
            raw: json!({
                "id": id,
                "entity": "order",
                "amount": request.amount,
                "currency": request.currency,
                "receipt": request.receipt,
                "status": "created",
            }),
        })
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: DbPool,
    pub tokens: TokenKeys,
    pub dir: TempDir,
}

/// A file part for a multipart request.
pub struct Part<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub data: &'a [u8],
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();

        let mut config = Config::default();
        config.database.path = Some(dir.path().join("test.db"));
        config.storage.path = Some(dir.path().join("media"));
        config.auth.bcrypt_cost = 4;
        config.auth.jwt_secret = Some("integration-secret".into());
        config.payment.key_secret = Some(KEY_SECRET.into());

        let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        let tokens = TokenKeys::from_config(&config.auth);
        let state = AppState {
            db: pool.clone(),
            tokens: tokens.clone(),
            media: Arc::new(LocalMediaHost::new(config.media_path(), "http://test.local")),
            payments: Arc::new(FakeGateway::default()),
            config,
        };

        Self {
            app: build_app(state),
            db: pool,
            tokens,
            dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        files: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        for part in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, part.field, part.file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Register a resident through the API; returns (token, user id).
    pub async fn register_user(&self, name: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/registration/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "secret123",
                    "confirmPassword": "secret123",
                    "district": "Ernakulam",
                    "panchayath": "Aluva",
                    "wardNo": 3,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register user: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["userId"].as_str().unwrap().to_string(),
        )
    }

    pub async fn register_member(&self, name: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/member/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "secret123",
                    "confirmPassword": "secret123",
                    "phone": "9876543210",
                    "wardNo": 3,
                    "startYear": 2020,
                    "endYear": 2025,
                    "district": "Ernakulam",
                    "panchayath": "Aluva",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register member: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["member"]["id"].as_str().unwrap().to_string(),
        )
    }

    pub async fn register_admin(&self, name: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/admin/register",
                None,
                Some(json!({ "name": name, "email": email, "password": "secret123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register admin: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["id"].as_str().unwrap().to_string(),
        )
    }

    /// File a report as `token` and return its id.
    pub async fn create_report(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/userPost",
                Some(token),
                Some(json!({
                    "title": title,
                    "description": "Large pothole near the school gate",
                    "category": "Roads",
                    "location": "Main St",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create report: {}", body);
        body["report"]["id"].as_str().unwrap().to_string()
    }

    pub fn count(&self, table: &str) -> i64 {
        let conn = self.db.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }
}
