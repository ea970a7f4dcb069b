//! Shared fixtures for the HTTP-level tests.
//!
//! Each test builds its own router over a private in-memory database, so
//! tests are independent and can run in parallel.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use jsonwebtoken::Algorithm;
use serde_json::Value;
use tower::ServiceExt;

use soapbox_api::auth::{AppState, AppStateInner};
use soapbox_api::config::Settings;
use soapbox_api::password;
use soapbox_db::Database;

pub const SECRET: &str = "integration-test-secret-4f1d9c";
pub const PASSWORD: &str = "password123";

pub fn test_settings() -> Settings {
    Settings {
        database_url: ":memory:".to_string(),
        secret_key: SECRET.to_string(),
        algorithm: Algorithm::HS256,
        access_token_expire_minutes: 30,
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestResponse {
    pub fn detail(&self) -> &str {
        self.body["detail"].as_str().unwrap_or_default()
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("in-memory database");
        let state = AppStateInner::new(db, &test_settings());
        let router = soapbox_api::router(state.clone());
        Self { state, router }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Insert a user directly and mint a token for them.
    pub fn create_user(&self, email: &str) -> TestUser {
        let hash = password::hash_password(PASSWORD).unwrap();
        let id = self.db().create_user(email, &hash).unwrap().unwrap();
        let token = self.state.tokens.issue(id).unwrap();
        TestUser {
            id,
            email: email.to_string(),
            token,
        }
    }

    pub fn create_post(&self, owner: &TestUser, title: &str, content: &str) -> i64 {
        self.db()
            .create_post(owner.id, title, content, true)
            .unwrap()
            .id
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(text.clone()))
        };

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let req = builder(Method::GET, uri, token).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let req = builder(Method::DELETE, uri, token).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send_json(Method::POST, uri, token, body).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send_json(Method::PUT, uri, token, body).await
    }

    /// Send an arbitrary body with an arbitrary content type.
    pub async fn post_raw(
        &self,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: &str,
    ) -> TestResponse {
        let req = builder(Method::POST, uri, token)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    /// POST with no body and no content type.
    pub async fn post_empty(&self, uri: &str) -> TestResponse {
        let req = builder(Method::POST, uri, None).body(Body::empty()).unwrap();
        self.send(req).await
    }

    /// POST /login with an already-encoded form body.
    pub async fn login(&self, form: &str) -> TestResponse {
        self.post_raw("/login", None, "application/x-www-form-urlencoded", form)
            .await
    }

    async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &Value,
    ) -> TestResponse {
        let req = builder(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// Two users and four posts: three owned by james, one by ann.
pub struct Fixture {
    pub app: TestApp,
    pub james: TestUser,
    pub ann: TestUser,
    pub posts: Vec<i64>,
}

pub fn fixture() -> Fixture {
    let app = TestApp::new();
    let james = app.create_user("james@gmail.com");
    let ann = app.create_user("ann@gmail.com");

    let posts = vec![
        app.create_post(&james, "First title", "First Content"),
        app.create_post(&james, "Second title", "Second Content"),
        app.create_post(&james, "Third title", "Third Content"),
        app.create_post(&ann, "Four title", "Four Content"),
    ];

    Fixture {
        app,
        james,
        ann,
        posts,
    }
}
