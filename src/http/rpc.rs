//! JSON-RPC over HTTP: `/jsonrpc`, `/lsp`, `/initialize`, `/tools`

use std::io::Cursor;

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::AppState;
use crate::mcp::jsonrpc::{Request, Response, RpcError};
use crate::mcp::stdio::{encode_frame, read_frame, Frame};

const LSP_CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf-8";

/// Body of a JSON-RPC reply
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Single(Response),
    Batch(Vec<Response>),
}

/// Process a decoded JSON-RPC payload (single request or batch)
///
/// Returns `None` when nothing needs answering (only notifications).
pub async fn process(state: &AppState, payload: Value) -> Option<Reply> {
    match payload {
        Value::Array(items) => {
            if items.is_empty() {
                return Some(Reply::Single(Response::error(
                    Value::Null,
                    RpcError::invalid_request("Empty batch"),
                )));
            }

            let mut responses = Vec::with_capacity(items.len());
            for item in items {
                if let Some(response) = process_one(state, item).await {
                    responses.push(response);
                }
            }
            (!responses.is_empty()).then_some(Reply::Batch(responses))
        }
        single => process_one(state, single).await.map(Reply::Single),
    }
}

async fn process_one(state: &AppState, value: Value) -> Option<Response> {
    match Request::from_value(value) {
        Ok(request) => {
            debug!(method = %request.method, "jsonrpc request");
            state.handle(request).await
        }
        Err(invalid) => Some(invalid),
    }
}

/// POST /jsonrpc (also POST /sse and POST /events)
pub async fn post_jsonrpc(State(state): State<AppState>, body: Bytes) -> HttpResponse {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return Json(Response::error(Value::Null, RpcError::parse_error(e))).into_response()
        }
    };

    match process(&state, payload).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /jsonrpc?method=...&id=...&params=...
///
/// `params` is a JSON string. Without it, every other query pair becomes a
/// string-valued params object.
pub async fn get_jsonrpc(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<Response> {
    let mut method = None;
    let mut id = Value::Null;
    let mut raw_params = None;
    let mut loose = Map::new();

    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "method" => method = Some(value.into_owned()),
            "id" => id = serde_json::from_str(&value).unwrap_or(Value::String(value.into_owned())),
            "params" => raw_params = Some(value.into_owned()),
            "jsonrpc" => {}
            other => {
                loose.insert(other.to_string(), Value::String(value.into_owned()));
            }
        }
    }

    let Some(method) = method else {
        return Json(Response::error(
            id,
            RpcError::invalid_request("Missing method query parameter"),
        ));
    };

    let params = match raw_params {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(params) => params,
            Err(e) => return Json(Response::error(id, RpcError::parse_error(e))),
        },
        None => Value::Object(loose),
    };

    Json(Response::from_result(id, state.call(&method, params).await))
}

/// POST /lsp
///
/// Accepts raw JSON or a Content-Length frame and answers with a frame.
/// Bodies that cannot be decoded are answered as an `initialize`.
pub async fn post_lsp(State(state): State<AppState>, body: Bytes) -> HttpResponse {
    let reply = match decode_lsp_body(&body) {
        Ok(payload) => process(&state, payload).await,
        Err(reason) => {
            warn!("Undecodable /lsp body ({}), answering with initialize", reason);
            Some(Reply::Single(synthetic_initialize(&state).await))
        }
    };

    match reply {
        Some(reply) => lsp_response(&reply),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /lsp
pub async fn get_lsp(State(state): State<AppState>) -> HttpResponse {
    lsp_response(&Reply::Single(synthetic_initialize(&state).await))
}

/// GET /initialize
pub async fn get_initialize(State(state): State<AppState>) -> Json<Response> {
    Json(Response::from_result(
        Value::Null,
        state.call("initialize", json!({})).await,
    ))
}

/// POST /initialize with an optional `{id, params}` body
pub async fn post_initialize(State(state): State<AppState>, body: Bytes) -> Json<Response> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    let params = body.get("params").cloned().unwrap_or_else(|| json!({}));

    Json(Response::from_result(id, state.call("initialize", params).await))
}

/// GET /tools
pub async fn get_tools(State(state): State<AppState>) -> HttpResponse {
    match state.call("tools/list", json!({})).await {
        Ok(tools) => Json(tools).into_response(),
        Err(e) => super::rest::RestError(e).into_response(),
    }
}

async fn synthetic_initialize(state: &AppState) -> Response {
    Response::from_result(Value::Null, state.call("initialize", json!({})).await)
}

fn lsp_response(reply: &Reply) -> HttpResponse {
    match encode_frame(reply) {
        Ok(frame) => ([(header::CONTENT_TYPE, LSP_CONTENT_TYPE)], frame).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Raw JSON (possibly spanning lines) or a single Content-Length frame
fn decode_lsp_body(body: &[u8]) -> Result<Value, String> {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .ok_or_else(|| "empty body".to_string())?;

    if matches!(body[start], b'{' | b'[') {
        return serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {}", e));
    }

    match read_frame(&mut Cursor::new(body)) {
        Ok(Some(Frame::Message(payload))) => Ok(payload),
        Ok(Some(Frame::Malformed(reason))) => Err(reason),
        Ok(None) => Err("truncated frame".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::*;
    use crate::mcp::jsonrpc::{
        INVALID_REQUEST, METHOD_NOT_FOUND, NOT_CONFIGURED, NOT_FOUND, PARSE_ERROR,
    };
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[tokio::test]
    async fn test_write_read_search_over_jsonrpc() {
        let (_dir, app) = app();

        let (status, write) = post_json(
            &app,
            "/jsonrpc",
            &json!({"jsonrpc": "2.0", "id": 1, "method": "write",
                    "params": {"path": "AI/Memory/Contexts/Test/Note.md", "content": "# Hello"}})
            .to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(write["result"]["status"], "success");

        let (_, read) = post_json(
            &app,
            "/jsonrpc",
            &json!({"jsonrpc": "2.0", "id": 2, "method": "resources/read",
                    "params": {"path": "AI/Memory/Contexts/Test/Note.md"}})
            .to_string(),
        )
        .await;
        assert_eq!(read["result"]["content"], "# Hello");

        let (_, search) = post_json(
            &app,
            "/jsonrpc",
            r#"{"jsonrpc":"2.0","id":3,"method":"search","params":{"query":"HELLO"}}"#,
        )
        .await;
        assert_eq!(search["result"], json!(["AI/Memory/Contexts/Test/Note.md"]));
        assert_eq!(search["id"], 3);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let (_dir, app) = app();
        let (status, body) = post_json(&app, "/jsonrpc", "{not json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], PARSE_ERROR);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let (_dir, app) = app();

        let (_, body) = post_json(&app, "/jsonrpc", "[]").await;
        assert_eq!(body["error"]["code"], INVALID_REQUEST);

        let (_, body) = post_json(&app, "/jsonrpc", r#"{"jsonrpc":"2.0","id":9}"#).await;
        assert_eq!(body["error"]["code"], INVALID_REQUEST);
        assert_eq!(body["id"], 9);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (_dir, app) = app();
        let (_, body) =
            post_json(&app, "/jsonrpc", r#"{"jsonrpc":"2.0","id":1,"method":"frobnicate"}"#).await;
        assert_eq!(body["error"]["code"], METHOD_NOT_FOUND);
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_batch_array_skips_notifications() {
        let (_dir, app) = app();
        let (status, body) = post_json(
            &app,
            "/jsonrpc",
            r#"[{"jsonrpc":"2.0","id":1,"method":"ping"},
                {"jsonrpc":"2.0","method":"notifications/initialized"},
                {"jsonrpc":"2.0","id":2,"method":"get","params":{"path":"nope.md"}}]"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], 1);
        assert_eq!(items[1]["error"]["code"], NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notification_only_is_no_content() {
        let (_dir, app) = app();
        let request = HttpRequest::post("/jsonrpc")
            .body(Body::from(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_get_jsonrpc() {
        let (_dir, app) = app();
        post_json(
            &app,
            "/jsonrpc",
            &json!({"jsonrpc": "2.0", "id": 1, "method": "write",
                    "params": {"path": "AI/Memory/a.md", "content": "alpha"}})
            .to_string(),
        )
        .await;

        let (_, body) = get_json(&app, "/jsonrpc?method=search&id=7&query=ALPHA").await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"], json!(["AI/Memory/a.md"]));

        let (_, body) = get_json(
            &app,
            "/jsonrpc?method=get&id=x&params=%7B%22path%22%3A%22AI%2FMemory%2Fa.md%22%7D",
        )
        .await;
        assert_eq!(body["id"], "x");
        assert_eq!(body["result"]["content"], "alpha");

        let (_, body) = get_json(&app, "/jsonrpc?id=1").await;
        assert_eq!(body["error"]["code"], INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_sse_post_behaves_like_jsonrpc() {
        let (_dir, app) = app();
        for uri in ["/sse", "/events"] {
            let (_, body) =
                post_json(&app, uri, r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#).await;
            assert_eq!(body, json!({"jsonrpc": "2.0", "id": 4, "result": {}}));
        }
    }

    #[tokio::test]
    async fn test_not_configured() {
        let app = unconfigured_app();
        let (_, body) = post_json(
            &app,
            "/jsonrpc",
            r#"{"jsonrpc":"2.0","id":1,"method":"search","params":{"query":"x"}}"#,
        )
        .await;
        assert_eq!(body["error"]["code"], NOT_CONFIGURED);
    }

    fn unframe(body: &[u8]) -> Value {
        match read_frame(&mut Cursor::new(body)).unwrap() {
            Some(Frame::Message(v)) => v,
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lsp_framed_and_raw() {
        let (_dir, app) = app();

        let framed = encode_frame(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).unwrap();
        let response = tower::ServiceExt::oneshot(
            app.clone(),
            HttpRequest::post("/lsp").body(Body::from(framed)).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(response.headers()["content-type"], LSP_CONTENT_TYPE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(unframe(&body)["result"], json!({}));

        let (_, body) = send(
            &app,
            HttpRequest::post("/lsp")
                .body(Body::from(r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(unframe(&body)["id"], 2);
    }

    #[tokio::test]
    async fn test_lsp_garbage_gets_initialize() {
        let (_dir, app) = app();
        let (_, body) = send(
            &app,
            HttpRequest::post("/lsp").body(Body::from("garbage")).unwrap(),
        )
        .await;
        let reply = unframe(&body);
        assert_eq!(reply["id"], Value::Null);
        assert!(reply["result"]["serverInfo"].is_object());

        let (_, body) = send(&app, HttpRequest::get("/lsp").body(Body::empty()).unwrap()).await;
        assert!(unframe(&body)["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_initialize_and_tools_endpoints() {
        let (_dir, app) = app();

        let (_, body) = get_json(&app, "/initialize").await;
        assert_eq!(body["jsonrpc"], "2.0");
        assert!(body["result"]["capabilities"].is_object());

        let (_, body) = post_json(
            &app,
            "/initialize",
            r#"{"id": 5, "params": {"protocolVersion": "2024-11-05"}}"#,
        )
        .await;
        assert_eq!(body["id"], 5);
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");

        let (_, body) = get_json(&app, "/tools").await;
        assert_eq!(body["tools"].as_array().unwrap().len(), 6);
    }
}
