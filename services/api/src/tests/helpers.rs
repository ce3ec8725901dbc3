//! Shared fixtures for driving the router in-process.

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use counsel_core::{CounsellorStore, DatabaseService, InMemoryStore, NewCounsellor, Slot};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

use crate::config::Config;
use crate::web::{router, AppState};

pub const ADMIN_EMAIL: &str = "grace@example.com";

pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub state: Arc<AppState>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `session=<id>` pair from `Set-Cookie`, ready to send back.
    pub fn session_cookie(&self) -> String {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .expect("Response should set a session cookie")
            .to_string()
    }
}

pub fn spawn_app() -> TestApp {
    let vars: HashMap<&str, &str> = HashMap::from([("ADMIN_EMAILS", ADMIN_EMAIL)]);
    let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("Test config should load");
    let store = Arc::new(InMemoryStore::new());
    let db: Arc<dyn DatabaseService> = store.clone();
    let state = Arc::new(AppState::new(db, Arc::new(config)));
    TestApp {
        app: router(Arc::clone(&state)),
        store,
        state,
    }
}

impl TestApp {
    /// Serves the router on an ephemeral local port.
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener should have an address");
        let app = self.app.clone();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });
        addr
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Request should build");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router should not fail");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Body should be readable");
        TestResponse {
            status,
            headers,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn send_json(&self, method: Method, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.request(method, uri, Some(cookie), Some(body)).await
    }

    /// Registers an account and returns its session cookie.
    pub async fn signup(&self, email: &str, name: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/auth/signup",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "name": name,
                    "password": "correct horse",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "signup failed: {:?}", response.body);
        response.session_cookie()
    }

    pub async fn seed_counsellor(&self) -> Uuid {
        self.store
            .create_counsellor(NewCounsellor {
                name: "Dr. Reyes".to_string(),
                specialization: "Anxiety".to_string(),
                bio: String::new(),
                availability: vec![
                    Slot::new("Monday", "09:00", "10:00"),
                    Slot::new("Thursday", "15:00", "16:00"),
                ],
            })
            .await
            .expect("Failed to seed counsellor")
            .id
    }
}

pub fn monday_nine() -> Value {
    serde_json::json!({"day": "Monday", "from": "09:00", "to": "10:00"})
}
