//! JSON-RPC 2.0 types shared by every transport

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::vault::VaultError;

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

// Server-defined error codes
pub const SERVER_ERROR: i64 = -32000;
pub const NOT_CONFIGURED: i64 = -32001;
pub const NOT_FOUND: i64 = -32002;
pub const VAULT_IO_ERROR: i64 = -32003;

fn jsonrpc_version() -> String {
    "2.0".to_string()
}

/// JSON-RPC 2.0 Request
///
/// An absent or `null` id marks a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl Request {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(Value::Null))
    }

    /// Validate a decoded JSON value as a request envelope
    ///
    /// On failure the InvalidRequest response is returned, carrying the
    /// envelope's id when one could be recovered.
    pub fn from_value(value: Value) -> Result<Self, Response> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);

        let Some(obj) = value.as_object() else {
            return Err(Response::error(
                id,
                RpcError::invalid_request("Request must be an object"),
            ));
        };

        match obj.get("jsonrpc") {
            None => {}
            Some(Value::String(v)) if v == "2.0" => {}
            Some(other) => {
                return Err(Response::error(
                    id,
                    RpcError::invalid_request(format!("Unsupported jsonrpc version: {}", other)),
                ))
            }
        }

        let method = match obj.get("method") {
            Some(Value::String(m)) => m.clone(),
            _ => {
                return Err(Response::error(
                    id,
                    RpcError::invalid_request("Missing or non-string method"),
                ))
            }
        };

        Ok(Self {
            jsonrpc: jsonrpc_version(),
            id: obj.get("id").cloned(),
            method,
            params: obj.get("params").cloned().unwrap_or(Value::Null),
        })
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn from_result(id: Value, result: Result<Value, RpcError>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(id, e),
        }
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match (self.result, self.error) {
            (_, Some(e)) => Err(e),
            (Some(v), None) => Ok(v),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message} ({code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {}", detail))
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, detail)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
            .with_data(json!({ "method": method }))
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, detail)
    }

    pub fn server(detail: impl Into<String>) -> Self {
        Self::new(SERVER_ERROR, detail)
    }

    pub fn not_configured() -> Self {
        Self::new(
            NOT_CONFIGURED,
            "Vault path not configured (set SMF_VAULT_PATH or POST /config)",
        )
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(NOT_FOUND, format!("Not found: {}", what))
    }
}

impl From<VaultError> for RpcError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::NotFound(path) => RpcError::not_found(path),
            VaultError::InvalidPath(_)
            | VaultError::NotANote(_)
            | VaultError::InvalidPattern(_) => RpcError::invalid_params(e.to_string()),
            VaultError::Io { .. } => RpcError::new(VAULT_IO_ERROR, e.to_string()),
            VaultError::NotADirectory(_) => {
                RpcError::not_configured().with_data(json!({ "detail": e.to_string() }))
            }
        }
    }
}
