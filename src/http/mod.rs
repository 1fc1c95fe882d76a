//! HTTP transports
//!
//! One axum router carries every HTTP surface:
//! - `/jsonrpc` (POST, GET) - JSON-RPC 2.0, single or batch
//! - `/sse`, `/events` - capabilities event then heartbeats; POST acts like `/jsonrpc`
//! - `/lsp` - JSON-RPC in Content-Length frames
//! - `/initialize`, `/tools` - discovery shortcuts
//! - `/health`, `/config`, `/search`, `/read`, `/list`, `/write`, `/metadata` - legacy REST
//!
//! Handlers do blocking filesystem I/O, so registry calls run on the
//! blocking thread pool.

pub mod rest;
pub mod rpc;
pub mod sse;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::mcp::jsonrpc::{Request, Response, RpcError};
use crate::mcp::Registry;

/// State shared by all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    /// Call one method on the blocking pool
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let registry = Arc::clone(&self.registry);
        let method = method.to_string();

        tokio::task::spawn_blocking(move || registry.call(&method, &params))
            .await
            .unwrap_or_else(|e| Err(RpcError::internal(format!("Handler failed: {}", e))))
    }

    /// Handle one request envelope on the blocking pool
    pub async fn handle(&self, request: Request) -> Option<Response> {
        let registry = Arc::clone(&self.registry);
        let id = request.id.clone().unwrap_or(Value::Null);
        let notification = request.is_notification();

        match tokio::task::spawn_blocking(move || registry.handle(&request)).await {
            Ok(response) => response,
            Err(_) if notification => None,
            Err(e) => Some(Response::error(
                id,
                RpcError::internal(format!("Handler failed: {}", e)),
            )),
        }
    }
}

/// Build the router
pub fn router(registry: Arc<Registry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        // JSON-RPC
        .route("/jsonrpc", post(rpc::post_jsonrpc).get(rpc::get_jsonrpc))
        .route("/lsp", post(rpc::post_lsp).get(rpc::get_lsp))
        .route("/initialize", get(rpc::get_initialize).post(rpc::post_initialize))
        .route("/tools", get(rpc::get_tools))
        // Server-sent events
        .route("/sse", get(sse::events).post(rpc::post_jsonrpc))
        .route("/events", get(sse::events).post(rpc::post_jsonrpc))
        // Legacy REST
        .route("/health", get(rest::health))
        .route("/config", get(rest::get_config).post(rest::post_config))
        .route("/search", get(rest::search))
        .route("/read", get(rest::read))
        .route("/list", get(rest::list))
        .route("/write", post(rest::write))
        .route("/metadata", get(rest::metadata))
        .with_state(AppState { registry })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C
pub async fn serve(registry: Arc<Registry>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    serve_on(listener, registry).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, registry: Arc<Registry>) -> Result<()> {
    info!("smf HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("smf HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the task is dropped
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::{ServerConfig, SharedConfig};
    use crate::mcp::{Registry, ServerState};

    pub fn app() -> (TempDir, Router) {
        let dir = TempDir::new().expect("tempdir");
        let config = SharedConfig::new(ServerConfig {
            vault_path: Some(dir.path().to_path_buf()),
            config_file: Some(dir.path().join(".smf-config.json")),
            ..ServerConfig::default()
        });
        let registry = Arc::new(Registry::new(ServerState::new(config)));
        (dir, super::router(registry))
    }

    pub fn unconfigured_app() -> Router {
        let registry = Arc::new(Registry::new(ServerState::new(SharedConfig::default())));
        super::router(registry)
    }

    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, body.to_vec())
    }

    pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).expect("request");
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}
