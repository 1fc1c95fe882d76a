//! Legacy REST endpoints
//!
//! Successful calls return the bare method result. Failures return
//! `{"error": <message>, "code": <json-rpc code>}` with an HTTP status
//! derived from the code.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::AppState;
use crate::config::ConfigError;
use crate::mcp::jsonrpc::{
    RpcError, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, NOT_FOUND, PARSE_ERROR,
};

/// An `RpcError` rendered for REST clients
#[derive(Debug)]
pub struct RestError(pub RpcError);

impl RestError {
    pub fn status(&self) -> StatusCode {
        status_for(self.0.code)
    }
}

impl From<RpcError> for RestError {
    fn from(e: RpcError) -> Self {
        Self(e)
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> HttpResponse {
        let status = self.status();
        let body = json!({ "error": self.0.message, "code": self.0.code });
        (status, Json(body)).into_response()
    }
}

/// HTTP status for a JSON-RPC error code
pub fn status_for(code: i64) -> StatusCode {
    match code {
        PARSE_ERROR | INVALID_REQUEST | INVALID_PARAMS => StatusCode::BAD_REQUEST,
        METHOD_NOT_FOUND | NOT_FOUND => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

type RestResult = Result<Json<Value>, RestError>;

/// GET /health
pub async fn health(State(state): State<AppState>) -> RestResult {
    Ok(Json(state.call("status", json!({})).await?))
}

/// GET /config
///
/// Filesystem paths are not exposed.
pub async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "vault_configured": state.registry.state().is_configured(),
        "api_version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
struct ConfigUpdate {
    vault_path: String,
}

/// POST /config `{"vault_path": "..."}`
pub async fn post_config(State(state): State<AppState>, body: Bytes) -> RestResult {
    let update: ConfigUpdate = serde_json::from_slice(&body)
        .map_err(|e| RpcError::invalid_params(format!("Expected {{\"vault_path\": ...}}: {}", e)))?;

    let config = state.registry.state().config.clone();
    let path = std::path::PathBuf::from(update.vault_path.trim());

    let result = tokio::task::spawn_blocking(move || config.set_vault_path(&path))
        .await
        .map_err(|e| RpcError::internal(format!("Config update failed: {}", e)))?;

    match result {
        Ok(()) => Ok(Json(json!({ "status": "success" }))),
        Err(e @ ConfigError::NotADirectory(_)) => {
            Err(RpcError::invalid_params(e.to_string()).into())
        }
        Err(e) => Err(RpcError::server(e.to_string()).into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default, alias = "q")]
    query: Option<String>,
}

/// GET /search?query=...
pub async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> RestResult {
    let params = match q.query {
        Some(query) => json!({ "query": query }),
        None => json!({}),
    };
    Ok(Json(state.call("search", params).await?))
}

/// GET /read?path=a.md&path=b.md
///
/// Each path maps to its content, or to an `{error, code}` object.
pub async fn read(State(state): State<AppState>, RawQuery(query): RawQuery) -> RestResult {
    let paths: Vec<String> = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == "path")
        .map(|(_, value)| value.into_owned())
        .collect();

    if paths.is_empty() {
        return Err(RpcError::invalid_params("At least one path parameter is required").into());
    }

    let mut results = Map::new();
    for path in paths {
        let entry = match state.call("get", json!({ "path": path })).await {
            Ok(note) => note.get("content").cloned().unwrap_or(Value::Null),
            Err(e) => json!({ "error": e.message, "code": e.code }),
        };
        results.insert(path, entry);
    }

    Ok(Json(Value::Object(results)))
}

/// GET /list?path=...
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> RestResult {
    let path = q.get("path").cloned().unwrap_or_default();
    Ok(Json(state.call("list", json!({ "path": path })).await?))
}

/// POST /write `{"path": "...", "content": "..."}`
pub async fn write(State(state): State<AppState>, body: Bytes) -> RestResult {
    let params: Value = serde_json::from_slice(&body).map_err(RpcError::parse_error)?;
    Ok(Json(state.call("write", params).await?))
}

/// GET /metadata
pub async fn metadata(State(state): State<AppState>) -> RestResult {
    Ok(Json(state.call("metadata", json!({})).await?))
}
