//! JSON-RPC over HTTP client
//!
//! Used by the CLI to talk to a running `smf serve`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use super::types::*;
use crate::config::ClientConfig;
use crate::core::vault::Note;
use crate::mcp::jsonrpc::{Request, Response, RpcError};

/// Client-side failures
///
/// Transport problems are kept apart from [`ClientError::Rpc`], which
/// carries an error the server answered with.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid server URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Cannot connect to server at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Server returned HTTP {status}")]
    Http { status: u16 },

    #[error("Malformed response from server: {0}")]
    Decode(String),

    #[error("Server error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<RpcError> for ClientError {
    fn from(e: RpcError) -> Self {
        ClientError::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// HTTP JSON-RPC client
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for a server base URL (e.g. `http://localhost:5678`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let url_err = |source| ClientError::Url {
            url: base_url.to_string(),
            source,
        };
        let base = Url::parse(base_url).map_err(url_err)?;
        let endpoint = base.join("/jsonrpc").map_err(url_err)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create a client from the client config file
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            &config.server.url,
            Duration::from_secs(config.server.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one request and return its full response envelope
    pub async fn request(&self, method: &str, params: Value) -> Result<Response> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(id, method, params);

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| self.transport_error(e))?;

        // Error envelopes may come with a non-2xx status; prefer the envelope
        match serde_json::from_slice::<Response>(&body) {
            Ok(response) => Ok(response),
            Err(_) if !status.is_success() => Err(ClientError::Http {
                status: status.as_u16(),
            }),
            Err(e) => Err(ClientError::Decode(e.to_string())),
        }
    }

    /// Call a method and return its result
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        Ok(self.request(method, params).await?.into_result()?)
    }

    async fn call_typed<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    // ============== Methods ==============

    pub async fn status(&self) -> Result<StatusInfo> {
        self.call_typed("status", json!({})).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        self.call_typed("search", json!({ "query": query })).await
    }

    pub async fn read(&self, path: &str) -> Result<Note> {
        self.call_typed("get", json!({ "path": path })).await
    }

    pub async fn write(&self, path: &str, content: &str) -> Result<WriteAck> {
        self.call_typed("write", json!({ "path": path, "content": content }))
            .await
    }

    pub async fn list(&self, path: &str) -> Result<Listing> {
        self.call_typed("list", json!({ "path": path })).await
    }

    pub async fn tools(&self) -> Result<ToolList> {
        self.call_typed("tools/list", json!({})).await
    }

    fn transport_error(&self, e: reqwest::Error) -> ClientError {
        let url = self.endpoint.to_string();
        if e.is_timeout() {
            ClientError::Timeout { url }
        } else if e.is_connect() {
            ClientError::Connect { url, source: e }
        } else if let Some(status) = e.status() {
            ClientError::Http {
                status: status.as_u16(),
            }
        } else {
            ClientError::Transport(e)
        }
    }
}
