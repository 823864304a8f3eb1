//! Shared harness for router tests: a migrated temp database, a router built
//! from a fixed config, and helpers to issue session tokens and requests.

#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use db::{DBService, test_utils::create_test_pool};
use serde_json::Value;
use server::{AppState, auth::SessionVerifier, config::PlannerConfig, routes};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "router-test-secret";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub org: Uuid,
    pub user: Uuid,
    verifier: SessionVerifier,
    _temp_dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub request_id: Option<String>,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_rate_limit(1000).await
    }

    pub async fn with_rate_limit(capacity: u32) -> Self {
        let (pool, temp_dir) = create_test_pool().await;
        let vars = HashMap::from([
            ("PLANNER_JWT_SECRET".to_string(), SECRET.to_string()),
            ("PLANNER_RATE_LIMIT_CAPACITY".to_string(), capacity.to_string()),
            // Slow enough that no test sees a refill.
            ("PLANNER_RATE_LIMIT_REFILL_PER_SEC".to_string(), "0.001".to_string()),
        ]);
        let config = PlannerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let state = AppState::new(DBService::from_pool(pool.clone()), config);

        Self {
            router: routes::router(state),
            pool,
            org: Uuid::new_v4(),
            user: Uuid::new_v4(),
            verifier: SessionVerifier::new(SECRET.to_string().into()),
            _temp_dir: temp_dir,
        }
    }

    pub fn token(&self) -> String {
        self.token_for(self.org)
    }

    pub fn token_for(&self, org: Uuid) -> String {
        self.verifier
            .issue(self.user, org, Duration::hours(1))
            .unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            body,
            request_id,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let token = self.token();
        self.request(Method::GET, uri, Some(&token), None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        let token = self.token();
        self.request(Method::POST, uri, Some(&token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        let token = self.token();
        self.request(Method::PUT, uri, Some(&token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        let token = self.token();
        self.request(Method::DELETE, uri, Some(&token), None).await
    }

    /// POST and return the created record's id, asserting success.
    pub async fn create(&self, uri: &str, body: Value) -> String {
        let response = self.post(uri, body).await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "create {uri} failed: {}",
            response.body
        );
        response.data()["id"].as_str().unwrap().to_string()
    }
}
