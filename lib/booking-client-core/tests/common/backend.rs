#![allow(dead_code, missing_docs, clippy::expect_used)]

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::info;

use booking_client_core::{ApiClient, Recorder};

/// Stand-in for the booking backend, speaking both response contracts.
fn backend_router() -> Router {
    Router::new()
        .route("/api/envelope/ok", get(envelope_ok))
        .route("/api/envelope/created", post(envelope_created))
        .route("/api/envelope/expired", get(envelope_expired))
        .route("/api/envelope/missing", get(envelope_missing))
        .route("/api/envelope/silent", get(envelope_silent))
        .route("/api/legacy/ok", get(legacy_ok))
        .route("/api/legacy/unauthorized", get(legacy_unauthorized))
        .route("/api/legacy/boom", get(legacy_boom))
        .route("/api/legacy/bad-gateway", get(legacy_bad_gateway))
        .route("/api/echo/headers", get(echo_headers))
        .route("/api/echo/query", get(echo_query))
        .route("/api/echo/body", post(echo_body).put(echo_body))
        .route("/api/slow", get(slow))
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({"code": 200, "message": "ok", "data": data}))
}

async fn envelope_ok() -> Json<Value> {
    envelope(json!({"id": 1, "title": "Morning yoga", "capacity": 12}))
}

async fn envelope_created(Json(body): Json<Value>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({"code": 201, "message": "created", "data": {"id": 42, "request": body}})),
    )
}

async fn envelope_expired() -> Json<Value> {
    Json(json!({"code": 401, "message": "token expired", "data": null}))
}

async fn envelope_missing() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"code": 404, "message": "activity not found", "error": "no row"})),
    )
}

async fn envelope_silent() -> Json<Value> {
    Json(json!({"code": 500, "data": {"id": 1}}))
}

async fn legacy_ok() -> Json<Value> {
    Json(json!({"foo": 1}))
}

async fn legacy_unauthorized() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Not authenticated"})),
    )
}

async fn legacy_boom() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "boom"})),
    )
}

async fn legacy_bad_gateway() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "")
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    envelope(json!({
        "authorization": header("authorization"),
        "content_type": header("content-type"),
    }))
}

async fn echo_query(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    envelope(json!(query))
}

async fn echo_body(Json(body): Json<Value>) -> Json<Value> {
    envelope(body)
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    envelope(Value::Null)
}

#[derive(Debug)]
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: ApiClient,
    pub recorder: Recorder,
    handle: JoinHandle<()>,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .context("binding test listener")?;
        let addr = listener.local_addr().context("reading local address")?;
        info!(%addr, "launching backend");

        let handle = tokio::spawn(async move {
            axum::serve(listener, backend_router())
                .await
                .expect("backend serving");
        });

        let recorder = Recorder::new();
        let client = Self::client_for(addr, &recorder)
            .build()
            .context("building client")?;

        Ok(Self {
            addr,
            client,
            recorder,
            handle,
        })
    }

    pub fn client_for(addr: SocketAddr, recorder: &Recorder) -> booking_client_core::ApiClientBuilder {
        ApiClient::builder()
            .with_base_url(format!("http://{addr}/api"))
            .with_store(Arc::new(recorder.clone()))
            .with_navigator(Arc::new(recorder.clone()))
            .with_notices(Arc::new(recorder.clone()))
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
